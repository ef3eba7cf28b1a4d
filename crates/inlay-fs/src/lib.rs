//! Cached file access for the inlay site pipeline.
//!
//! Every component that touches the source tree reads through
//! [`ResourceCache`]; generated output goes through [`Writer`].

pub mod cache;
pub mod writer;

pub use cache::{CachedFile, Category, FsError, ResourceCache};
pub use writer::Writer;
