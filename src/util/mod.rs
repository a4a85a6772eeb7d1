//! Utility types shared across the extractor.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`path`] - Container path and output file name helpers

mod error;
pub mod path;

pub use error::*;
