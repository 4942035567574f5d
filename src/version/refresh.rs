//! Refreshing the cache for several ecosystems in one run

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::version::cache::{CacheStorage, CacheStore, EntryState, RefreshOutcome, RefreshPolicy};
use crate::version::error::RefreshError;
use crate::version::fetcher::VersionFetcher;
use crate::version::types::Ecosystem;

/// What to do when one ecosystem fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failure
    #[default]
    Abort,
    /// Record the failure and carry on with the remaining ecosystems
    Continue,
}

#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub updated: Vec<Ecosystem>,
    pub unchanged: Vec<Ecosystem>,
    pub failed: Vec<RefreshError>,
    /// Not attempted because the upstream rate limit was already hit
    pub skipped: Vec<Ecosystem>,
    /// Versions discovered by this run, per updated ecosystem
    pub new_versions: IndexMap<Ecosystem, Vec<String>>,
}

impl RefreshSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn failed_ecosystems(&self) -> Vec<Ecosystem> {
        self.failed.iter().map(RefreshError::ecosystem).collect()
    }

    fn log(&self) {
        info!(
            "Cache refresh: {} updated, {} unchanged, {} failed, {} skipped",
            self.updated.len(),
            self.unchanged.len(),
            self.failed.len(),
            self.skipped.len()
        );
        for (ecosystem, versions) in &self.new_versions {
            if !versions.is_empty() {
                info!("New {} versions: {}", ecosystem, versions.join(", "));
            }
        }
    }
}

/// Refresh each ecosystem in turn.
///
/// Each ecosystem is fetched, merged and persisted before the next one starts.
/// Persistence failures always abort. Fetch failures abort under
/// [`ErrorPolicy::Abort`]; under [`ErrorPolicy::Continue`] they are collected
/// in the summary. After a rate limit, ecosystems that would need the network
/// are skipped.
pub async fn refresh_ecosystems<S: CacheStorage>(
    store: &mut CacheStore<S>,
    fetcher: &VersionFetcher,
    ecosystems: &[Ecosystem],
    policy: &RefreshPolicy,
    error_policy: ErrorPolicy,
    now: DateTime<Utc>,
) -> Result<RefreshSummary, RefreshError> {
    let mut summary = RefreshSummary::default();
    let mut rate_limited = false;

    for &ecosystem in ecosystems {
        if rate_limited && store.state(ecosystem, policy, now.date_naive()) != EntryState::Fresh {
            warn!("Skipping {}: upstream rate limit reached earlier in this run", ecosystem);
            summary.skipped.push(ecosystem);
            continue;
        }

        match store.refresh(fetcher, ecosystem, policy, now).await {
            Ok(RefreshOutcome::Hit) => summary.unchanged.push(ecosystem),
            Ok(RefreshOutcome::Refreshed { added, total }) => {
                info!("{}: {} versions cached, {} new", ecosystem, total, added.len());
                summary.updated.push(ecosystem);
                summary.new_versions.insert(ecosystem, added);
            }
            Err(e @ RefreshError::Persist { .. }) => return Err(e),
            Err(e) if error_policy == ErrorPolicy::Abort => return Err(e),
            Err(e) => {
                error!("{}", e);
                rate_limited |= e.is_rate_limited();
                summary.failed.push(e);
            }
        }
    }

    summary.log();
    Ok(summary)
}
