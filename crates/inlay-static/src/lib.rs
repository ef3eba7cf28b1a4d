//! Static output pipeline for the inlay site.
//!
//! A build pass mounts named renderers over an output tree; each renderer
//! gets a writer scoped to its own subdirectory and all of them run
//! concurrently.

pub mod assets;
pub mod pipeline;

pub use assets::copy_assets;
pub use pipeline::{BoxError, Pipeline, PipelineError};
