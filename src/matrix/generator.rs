//! Matrix template generator
//!
//! Two alternative sources fill the version lists of a [`MatrixDocument`]:
//! - dynamic mode fetches each ecosystem upstream and filters it by strategy
//! - cache mode refreshes the version cache (unless template-only) and copies
//!   the greatest `output_count` cached versions into the document
//!
//! Ecosystems that fail, produce nothing, or match no version under their
//! strategy keep the list they already had.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use super::{MatrixDocument, MatrixError};
use crate::json_file;
use crate::version::cache::{CacheStorage, CacheStore, RefreshPolicy};
use crate::version::error::StrategyError;
use crate::version::fetcher::{FetchRequest, VersionFetcher};
use crate::version::refresh::{ErrorPolicy, refresh_ecosystems};
use crate::version::strategy::{VersionStrategy, apply_strategy};
use crate::version::types::{Ecosystem, SortOrder};

/// Options shared by both generator modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// When false, every ecosystem in the document that was not requested is cleared
    pub keep_existing: bool,
    pub error_policy: ErrorPolicy,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            keep_existing: true,
            error_policy: ErrorPolicy::Abort,
        }
    }
}

/// Dynamic mode input: the strategy of every requested ecosystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicRequest {
    pub strategies: IndexMap<Ecosystem, VersionStrategy>,
    /// Versions kept per ecosystem after the strategy filter runs; 0 keeps all
    pub count: usize,
    pub order: SortOrder,
}

/// Cache mode input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    pub ecosystems: Vec<Ecosystem>,
    pub policy: RefreshPolicy,
    /// Versions copied into the document per ecosystem; 0 copies everything cached
    pub output_count: usize,
    /// Read the cache as persisted without refreshing anything
    pub template_only: bool,
}

/// What a generator pass did to each ecosystem
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub updated: IndexMap<Ecosystem, Vec<String>>,
    /// Nothing to write (empty upstream or empty cache entry); the list was kept
    pub empty: Vec<Ecosystem>,
    /// The strategy filtered every fetched version out; the list was kept
    pub no_match: Vec<(Ecosystem, VersionStrategy)>,
    /// Document keys emptied because keep-existing was off
    pub cleared: Vec<String>,
    /// Not refreshed because the upstream rate limit was hit earlier in the run
    pub skipped: Vec<Ecosystem>,
    pub failed: Vec<MatrixError>,
}

impl GenerationReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    fn log(&self) {
        for (ecosystem, versions) in &self.updated {
            info!("{}: {}", ecosystem, versions.join(", "));
        }
        for ecosystem in &self.empty {
            warn!("{}: no versions available, keeping existing list", ecosystem);
        }
        for (ecosystem, strategy) in &self.no_match {
            warn!("{}: no {} versions found, keeping existing list", ecosystem, strategy);
        }
        if !self.cleared.is_empty() {
            info!("Cleared: {}", self.cleared.join(", "));
        }
    }
}

/// Fill the document from upstream, one ecosystem at a time
pub async fn apply_dynamic(
    document: &mut MatrixDocument,
    fetcher: &VersionFetcher,
    request: &DynamicRequest,
    options: &GenerateOptions,
) -> Result<GenerationReport, MatrixError> {
    let mut report = GenerationReport::default();

    for (&ecosystem, &strategy) in &request.strategies {
        info!("Processing {} with strategy: {}", ecosystem, strategy);

        // fetch everything so a strategy that matches nothing is told apart
        // from an upstream with nothing to offer
        let fetch_request = FetchRequest {
            count: 0,
            order: SortOrder::Descending,
            strategy_hint: None,
        };
        let fetched = match fetcher.fetch(ecosystem, &fetch_request).await {
            Ok(fetched) => fetched,
            Err(e) if options.error_policy == ErrorPolicy::Abort => return Err(e.into()),
            Err(e) => {
                error!("{}", e);
                report.failed.push(e.into());
                continue;
            }
        };

        match apply_strategy(&fetched, strategy) {
            Ok(versions) if versions.is_empty() => report.empty.push(ecosystem),
            Ok(mut versions) => {
                if request.count > 0 {
                    versions.truncate(request.count);
                }
                if request.order == SortOrder::Ascending {
                    versions.reverse();
                }
                let versions: Vec<String> = versions.iter().map(|v| v.version().to_string()).collect();
                document.set_versions(ecosystem.as_str(), versions.clone());
                report.updated.insert(ecosystem, versions);
            }
            Err(StrategyError::NoMatch { strategy }) => report.no_match.push((ecosystem, strategy)),
        }
    }

    if !options.keep_existing {
        let requested: Vec<Ecosystem> = request.strategies.keys().copied().collect();
        report.cleared = document.clear_unrequested(&requested);
    }

    report.log();
    Ok(report)
}

/// Fill the document from the version cache, refreshing it first unless
/// `template_only` is set
pub async fn apply_cache<S: CacheStorage>(
    document: &mut MatrixDocument,
    store: &mut CacheStore<S>,
    fetcher: &VersionFetcher,
    request: &CacheRequest,
    options: &GenerateOptions,
    now: DateTime<Utc>,
) -> Result<GenerationReport, MatrixError> {
    let mut report = GenerationReport::default();
    let mut failed_ecosystems = Vec::new();

    if request.template_only {
        debug!("Template-only: reading the cache as persisted");
    } else {
        let summary = refresh_ecosystems(
            store,
            fetcher,
            &request.ecosystems,
            &request.policy,
            options.error_policy,
            now,
        )
        .await?;
        failed_ecosystems = summary.failed_ecosystems();
        report.skipped = summary.skipped;
        report.failed = summary.failed.into_iter().map(MatrixError::from).collect();
    }

    for &ecosystem in &request.ecosystems {
        if failed_ecosystems.contains(&ecosystem) {
            continue;
        }

        let versions = store.read_versions(ecosystem, request.policy.order, request.output_count);
        if versions.is_empty() {
            if options.keep_existing {
                report.empty.push(ecosystem);
            } else {
                document.set_versions(ecosystem.as_str(), Vec::new());
                report.cleared.push(ecosystem.as_str().to_string());
            }
            continue;
        }

        document.set_versions(ecosystem.as_str(), versions.clone());
        report.updated.insert(ecosystem, versions);
    }

    if !options.keep_existing {
        report.cleared.extend(document.clear_unrequested(&request.ecosystems));
    }

    report.log();
    Ok(report)
}

/// Persist the document, or only log it on a dry run.
///
/// An existing file is first copied to `<file>.bak`; a failed backup is
/// logged and does not stop the write.
pub fn write_matrix(document: &MatrixDocument, path: &Path, dry_run: bool) -> Result<(), MatrixError> {
    if dry_run {
        match json_file::to_pretty_string(document) {
            Ok(rendered) => info!("Dry run - would have written {:?}:\n{}", path, rendered),
            Err(e) => warn!("Dry run - could not render document: {}", e),
        }
        return Ok(());
    }

    if path.exists() {
        let backup = backup_path(path);
        match fs::copy(path, &backup) {
            Ok(_) => info!("Created backup at {:?}", backup),
            Err(e) => warn!("Could not create backup {:?}: {}", backup, e),
        }
    }

    document.save(path)?;
    info!("Matrix written to {:?}", path);
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}
