//! DocAnswer CLI — grounded answers from one documentation site.
//!
//! Takes a support question, retrieves and ranks help-center articles, and
//! prints an answer synthesized strictly from their content, with citations.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
