//! Generic version fetcher
//!
//! One fetcher serves every ecosystem: the per-ecosystem differences (which
//! repository to query, how tags map to versions, what counts as stable) live
//! in [`EcosystemRules`].

use std::sync::Arc;

use tracing::debug;

use crate::config::{DEFAULT_CACHE_COUNT, TAG_SCAN_LIMIT};
use crate::version::ecosystem::EcosystemRules;
use crate::version::ecosystems::rules_for;
use crate::version::error::FetchError;
use crate::version::semver::order_versions;
use crate::version::source::TagSource;
use crate::version::strategy::VersionStrategy;
use crate::version::types::{Ecosystem, RawTag, SortOrder, VersionInfo};

/// What a caller wants back from a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// Maximum number of versions returned; 0 returns everything found
    pub count: usize,
    pub order: SortOrder,
    /// With `Stable`, pre-releases are dropped before truncation so the caller
    /// receives up to `count` stable versions
    pub strategy_hint: Option<VersionStrategy>,
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self {
            count: DEFAULT_CACHE_COUNT,
            order: SortOrder::Descending,
            strategy_hint: None,
        }
    }
}

pub struct VersionFetcher {
    source: Arc<dyn TagSource>,
    scan_limit: usize,
}

impl VersionFetcher {
    pub fn new(source: Arc<dyn TagSource>) -> Self {
        Self {
            source,
            scan_limit: TAG_SCAN_LIMIT,
        }
    }

    /// Overrides how many raw tags are read per ecosystem
    pub fn with_scan_limit(mut self, scan_limit: usize) -> Self {
        self.scan_limit = scan_limit;
        self
    }

    /// Fetches, classifies and orders the versions of one ecosystem.
    ///
    /// An upstream without a single parseable tag yields an empty list.
    pub async fn fetch(
        &self,
        ecosystem: Ecosystem,
        request: &FetchRequest,
    ) -> Result<Vec<VersionInfo>, FetchError> {
        let rules = rules_for(ecosystem);
        let tags = self
            .source
            .fetch_tags(rules.repository(), Some(self.scan_limit))
            .await
            .map_err(|source| FetchError { ecosystem, source })?;

        let versions = resolve_tags(rules, &tags, request);
        debug!(
            "Resolved {} {} versions from {} tags",
            versions.len(),
            ecosystem,
            tags.len()
        );
        Ok(versions)
    }
}

/// Turn raw upstream tags into an ordered, deduplicated version list
pub fn resolve_tags(
    rules: &dyn EcosystemRules,
    tags: &[RawTag],
    request: &FetchRequest,
) -> Vec<VersionInfo> {
    let stable_only = request.strategy_hint == Some(VersionStrategy::Stable);

    let versions: Vec<VersionInfo> = tags
        .iter()
        .filter_map(|tag| {
            let parsed = rules.parse_tag(&tag.name);
            if parsed.is_none() {
                debug!("Skipping unparseable {} tag: {}", rules.ecosystem(), tag.name);
            }
            parsed
        })
        .filter(|version| !stable_only || version.is_stable())
        .collect();

    order_versions(versions, request.order, request.count)
}
