//! Resilient content fetching for an adversarial documentation site.
//!
//! This crate provides:
//! - [`Fetcher`] — ordered fetch strategies (article API, browser-profile
//!   GET) with uniform retry/backoff, identity rotation on blocking
//!   signals, and a per-locator result cache
//! - the browser identity pool the GET strategy rotates through

mod fetcher;
mod headers;

pub use fetcher::Fetcher;
