//! Common types for the version layer

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::version::semver::VersionKey;

/// Language or runtime whose releases are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ecosystem {
    /// CPython (python/cpython)
    Python,
    /// Node.js (nodejs/node)
    Nodejs,
    /// Ruby (ruby/ruby)
    Ruby,
    /// Go (golang/go)
    Go,
    /// Rust (rust-lang/rust)
    Rust,
}

impl Ecosystem {
    /// Every supported ecosystem, in the order they are processed by default
    pub const ALL: [Ecosystem; 5] = [
        Ecosystem::Python,
        Ecosystem::Nodejs,
        Ecosystem::Ruby,
        Ecosystem::Go,
        Ecosystem::Rust,
    ];

    /// Returns the identifier used in matrix and cache documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Python => "python",
            Ecosystem::Nodejs => "nodejs",
            Ecosystem::Ruby => "ruby",
            Ecosystem::Go => "go",
            Ecosystem::Rust => "rust",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported ecosystem: {0}")]
pub struct UnknownEcosystem(pub String);

impl FromStr for Ecosystem {
    type Err = UnknownEcosystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" => Ok(Ecosystem::Python),
            "nodejs" | "node" => Ok(Ecosystem::Nodejs),
            "ruby" => Ok(Ecosystem::Ruby),
            "go" | "golang" => Ok(Ecosystem::Go),
            "rust" => Ok(Ecosystem::Rust),
            _ => Err(UnknownEcosystem(s.to_string())),
        }
    }
}

/// Whether a release is production-ready per its ecosystem's convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    Prerelease,
}

/// Direction versions are listed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Newest first
    #[default]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid sort order: {0} (expected asc or desc)")]
pub struct InvalidSortOrder(pub String);

impl FromStr for SortOrder {
    type Err = InvalidSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(InvalidSortOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("asc"),
            SortOrder::Descending => f.write_str("desc"),
        }
    }
}

/// A raw tag record as returned by a tag source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTag {
    pub name: String,
    #[serde(default)]
    pub commit: Option<TagCommit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagCommit {
    pub sha: String,
}

impl RawTag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commit: None,
        }
    }
}

/// One page of a paginated tag query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPage {
    pub tags: Vec<RawTag>,
    /// Page to request next, `None` once the source is exhausted
    pub next_page: Option<u32>,
}

/// A single resolved version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    tag: String,
    version: String,
    key: VersionKey,
    stability: Stability,
}

impl VersionInfo {
    pub fn new(tag: &str, version: &str, key: VersionKey, stability: Stability) -> Self {
        Self {
            tag: tag.to_string(),
            version: version.to_string(),
            key,
            stability,
        }
    }

    /// The tag as named upstream (e.g. "go1.22.1")
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The version as written into matrix and cache documents (e.g. "1.22.1")
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn key(&self) -> &VersionKey {
        &self.key
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }

    pub fn is_stable(&self) -> bool {
        self.stability == Stability::Stable
    }
}
