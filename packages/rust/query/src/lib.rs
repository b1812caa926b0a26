//! Query pre-processing: normalization and media-reference detection.
//!
//! This crate turns a raw support question into a [`NormalizedQuery`]
//! (see [`normalize`]) and flags questions that only point at screenshots,
//! videos, or attachments (see [`references_media`]); those never reach
//! retrieval.

mod media;
mod normalize;

pub use media::references_media;
pub use normalize::{is_technical_term, normalize};
