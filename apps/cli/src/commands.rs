//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use docanswer_core::{Pipeline, ProgressReporter};
use docanswer_shared::{FinalAnswer, init_config, load_config, load_config_from, validate_api_key};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DocAnswer — documentation-grounded answers for support questions.
#[derive(Parser)]
#[command(
    name = "docanswer",
    version,
    about = "Answer technical questions from the official documentation site, with citations.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Answer a question from the documentation.
    Ask {
        /// The question, as the user wrote it.
        question: String,

        /// Use a specific config file instead of ~/.docanswer/docanswer.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip the model-assisted reordering stage.
        #[arg(long)]
        no_rerank: bool,

        /// Emit the answer as JSON ({"text": …, "citations": […]}).
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docanswer=info",
        1 => "docanswer=debug",
        _ => "docanswer=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ask {
            question,
            config,
            no_rerank,
            json,
        } => cmd_ask(&question, config.as_deref(), no_rerank, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// ask
// ---------------------------------------------------------------------------

async fn cmd_ask(
    question: &str,
    config_path: Option<&std::path::Path>,
    no_rerank: bool,
    json: bool,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if no_rerank {
        config.llm.rerank = false;
    }

    validate_api_key(&config)?;

    let llm = docanswer_llm::create_client(&config.llm)?;
    info!(provider = llm.provider_name(), model = %config.llm.model, "pipeline configured");

    let pipeline = Pipeline::new(config, llm)?;

    let progress = SpinnerProgress::new(!json);
    let answer = pipeline.process_question(question, &progress).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", answer.text);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let rendered =
        toml::to_string_pretty(&config).map_err(|e| eyre!("cannot render configuration: {e}"))?;
    println!("{rendered}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress spinner
// ---------------------------------------------------------------------------

/// Spinner-based progress for interactive runs; silent in JSON mode.
struct SpinnerProgress {
    bar: Option<ProgressBar>,
}

impl SpinnerProgress {
    fn new(interactive: bool) -> Self {
        if !interactive {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .expect("valid progress template"),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar: Some(bar) }
    }
}

impl ProgressReporter for SpinnerProgress {
    fn phase(&self, name: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(name.to_string());
        }
    }

    fn candidate_processed(&self, locator: &str, current: usize, total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("Lendo artigo {current}/{total}: {locator}"));
        }
    }

    fn done(&self, _answer: &FinalAnswer) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
