//! The matrix document and the generator that fills its version lists
//!
//! - [`document`]: read-modify-write access to the matrix JSON
//! - [`generator`]: populating version lists from fetchers (dynamic mode) or
//!   from the cache (cache mode)

pub mod document;
pub mod generator;

pub use document::MatrixDocument;
pub use generator::{
    CacheRequest, DynamicRequest, GenerateOptions, GenerationReport, apply_cache, apply_dynamic,
    write_matrix,
};

use std::path::PathBuf;

use thiserror::Error;

use crate::version::error::{CacheError, FetchError, RefreshError};
use crate::version::types::Ecosystem;

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("Failed to read matrix file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Matrix file {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Matrix file {path:?} is malformed: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    #[error("Failed to write matrix file {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl MatrixError {
    /// The ecosystem a fetch or refresh failure belongs to
    pub fn ecosystem(&self) -> Option<Ecosystem> {
        match self {
            MatrixError::Fetch(e) => Some(e.ecosystem),
            MatrixError::Refresh(e) => Some(e.ecosystem()),
            _ => None,
        }
    }
}
