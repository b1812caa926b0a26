//! Pipeline driver: raw question in, grounded answer with citations out.
//!
//! This crate wires the leaf crates together:
//! normalize → retrieve → fetch/extract/score per candidate → rank →
//! synthesize. See [`pipeline::Pipeline::process_question`].

pub mod pipeline;

pub use pipeline::{
    COULD_NOT_PROCESS_MESSAGE, MEDIA_REFERENCE_MESSAGE, Pipeline, ProgressReporter,
    SilentProgress,
};
