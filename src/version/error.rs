use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::version::strategy::VersionStrategy;
use crate::version::types::Ecosystem;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unavailable: {message}")]
    Unavailable { message: String },

    #[error("Rate limited{}; set GITHUB_TOKEN to raise the limit", reset_at.map(|t| format!(" until {}", t.to_rfc3339())).unwrap_or_default())]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("Request to {url} failed with status {status}: {body}")]
    Request {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {}", error)
        } else {
            error.to_string()
        };
        SourceError::Unavailable { message }
    }
}

/// A tag source failure attributed to the ecosystem being fetched
#[derive(Debug, Error)]
#[error("Failed to fetch {ecosystem} versions: {source}")]
pub struct FetchError {
    pub ecosystem: Ecosystem,
    #[source]
    pub source: SourceError,
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.source, SourceError::RateLimited { .. })
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read cache file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cache file {path:?} is not a valid cache document: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write cache file {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Failure of one ecosystem's cache refresh; the persisted entry is left as it was
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to persist {ecosystem} cache entry: {source}")]
    Persist {
        ecosystem: Ecosystem,
        #[source]
        source: CacheError,
    },
}

impl RefreshError {
    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            RefreshError::Fetch(e) => e.ecosystem,
            RefreshError::Persist { ecosystem, .. } => *ecosystem,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RefreshError::Fetch(e) if e.is_rate_limited())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("No version satisfied the {strategy} strategy")]
    NoMatch { strategy: VersionStrategy },
}
