//! Text cleaning pipeline applied to extracted content.
//!
//! Each pass is a function `&str -> String` applied in sequence, regardless
//! of whether the text came from the article API or a scraped page.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleaning pipeline and bound the result to `max_chars`.
pub(crate) fn run_pipeline(text: &str, max_chars: usize) -> String {
    let mut result = text.replace('\0', " ");

    result = cut_attachment_section(&result);
    result = strip_html_tags(&result);
    result = strip_escape_sequences(&result);
    result = strip_urls(&result);
    result = strip_emails(&result);
    result = collapse_whitespace(&result);

    truncate_chars(&result, max_chars)
}

// ---------------------------------------------------------------------------
// Pass 1: Drop the attachment section
// ---------------------------------------------------------------------------

/// Everything from a literal "Anexo(s):" marker onward is attachment
/// metadata, not article content.
fn cut_attachment_section(text: &str) -> String {
    static ATTACH_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)Anexo\(s\):.*").expect("valid regex"));

    ATTACH_RE.replace(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Strip leftover HTML tags
// ---------------------------------------------------------------------------

fn strip_html_tags(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    TAG_RE.replace_all(text, " ").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Strip backslash escape sequences
// ---------------------------------------------------------------------------

fn strip_escape_sequences(text: &str) -> String {
    static ESCAPE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\\\w+").expect("valid regex"));

    ESCAPE_RE.replace_all(text, " ").to_string()
}

// ---------------------------------------------------------------------------
// Pass 4: Strip bare URLs
// ---------------------------------------------------------------------------

fn strip_urls(text: &str) -> String {
    static URL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\bhttps?://\S+").expect("valid regex"));

    URL_RE.replace_all(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Strip e-mail addresses
// ---------------------------------------------------------------------------

fn strip_emails(text: &str) -> String {
    static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,7}\b").expect("valid regex")
    });

    EMAIL_RE.replace_all(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 6: Collapse whitespace
// ---------------------------------------------------------------------------

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Pass 7: Bound length
// ---------------------------------------------------------------------------

/// Truncate to at most `max_chars` characters, on a character boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}
