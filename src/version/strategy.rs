//! Stable / latest / both filtering of resolved versions

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::version::error::StrategyError;
use crate::version::semver::order_versions;
use crate::version::types::{SortOrder, VersionInfo};

/// Which versions of an ecosystem end up in the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionStrategy {
    /// Every stable release
    Stable,
    /// Only the newest release, stable or not
    Latest,
    /// The newest release plus every stable release
    Both,
}

impl VersionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStrategy::Stable => "stable",
            VersionStrategy::Latest => "latest",
            VersionStrategy::Both => "both",
        }
    }
}

impl fmt::Display for VersionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid version strategy: {0} (expected stable, latest or both)")]
pub struct InvalidStrategy(pub String);

impl FromStr for VersionStrategy {
    type Err = InvalidStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(VersionStrategy::Stable),
            "latest" => Ok(VersionStrategy::Latest),
            "both" => Ok(VersionStrategy::Both),
            _ => Err(InvalidStrategy(s.to_string())),
        }
    }
}

/// Filter versions by strategy. The result is ordered newest first.
///
/// An empty input yields an empty output. A non-empty input that the strategy
/// filters down to nothing (e.g. only pre-releases under `Stable`) is a
/// `StrategyError::NoMatch`.
pub fn apply_strategy(
    versions: &[VersionInfo],
    strategy: VersionStrategy,
) -> Result<Vec<VersionInfo>, StrategyError> {
    if versions.is_empty() {
        return Ok(Vec::new());
    }

    let newest = versions.iter().max_by(|a, b| a.key().cmp(b.key()));

    let selected: Vec<VersionInfo> = match strategy {
        VersionStrategy::Stable => versions.iter().filter(|v| v.is_stable()).cloned().collect(),
        VersionStrategy::Latest => newest.into_iter().cloned().collect(),
        VersionStrategy::Both => {
            let mut seen = HashSet::new();
            versions
                .iter()
                .filter(|v| v.is_stable() || newest.is_some_and(|n| n.key() == v.key()))
                .filter(|v| seen.insert(v.key().clone()))
                .cloned()
                .collect()
        }
    };

    if selected.is_empty() {
        return Err(StrategyError::NoMatch { strategy });
    }
    Ok(order_versions(selected, SortOrder::Descending, 0))
}
