//! One invocation: resolved mode in, matrix document and outputs out

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::info;

use crate::config::DEFAULT_CACHE_COUNT;
use crate::matrix::{
    CacheRequest, DynamicRequest, GenerateOptions, GenerationReport, MatrixDocument, MatrixError, apply_cache,
    apply_dynamic, write_matrix,
};
use crate::output::{self, OutputError};
use crate::version::cache::{CacheStorage, CacheStore, JsonFileStorage, MemoryStorage, RefreshPolicy};
use crate::version::error::{CacheError, RefreshError};
use crate::version::fetcher::VersionFetcher;
use crate::version::refresh::{ErrorPolicy, RefreshSummary, refresh_ecosystems};
use crate::version::strategy::VersionStrategy;
use crate::version::types::{Ecosystem, SortOrder};

/// Dynamic update parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicParams {
    pub strategies: IndexMap<Ecosystem, VersionStrategy>,
    pub count: usize,
    pub order: SortOrder,
}

/// Cache mode parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheParams {
    pub ecosystems: Vec<Ecosystem>,
    pub policy: RefreshPolicy,
    pub output_count: usize,
    pub template_only: bool,
    /// Refresh and persist the cache without touching the matrix document
    pub cache_only: bool,
    pub cache_file: PathBuf,
    /// Document the version lists are merged into before writing `json_file`
    pub template_file: PathBuf,
}

/// How the version lists are populated, decided once from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Emit the matrix document as it is
    Static,
    DynamicUpdate(DynamicParams),
    CacheRefresh(CacheParams),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub json_file: PathBuf,
    pub mode: Mode,
    pub keep_existing: bool,
    pub dry_run: bool,
    pub error_policy: ErrorPolicy,
    /// Emit the final document as step outputs
    pub emit: bool,
    /// Runner output file; `None` prints the outputs instead
    pub output_file: Option<PathBuf>,
}

impl Invocation {
    /// An invocation that emits `json_file` unchanged
    pub fn new(json_file: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            json_file: json_file.into(),
            mode,
            keep_existing: true,
            dry_run: false,
            error_policy: ErrorPolicy::Abort,
            emit: true,
            output_file: None,
        }
    }
}

impl Default for DynamicParams {
    fn default() -> Self {
        Self {
            strategies: IndexMap::new(),
            count: DEFAULT_CACHE_COUNT,
            order: SortOrder::Descending,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Matrix file {0:?} does not exist")]
    MissingMatrix(PathBuf),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Failed to update: {}", .0.join(", "))]
    EcosystemsFailed(Vec<String>),
}

/// What an invocation produced
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// The final matrix document; `None` for cache-only runs
    pub document: Option<MatrixDocument>,
    pub report: Option<GenerationReport>,
    pub refresh: Option<RefreshSummary>,
    pub outputs: Vec<(String, String)>,
}

/// Runs an invocation against the current time
pub async fn run(invocation: &Invocation, fetcher: &VersionFetcher) -> Result<RunOutcome, AppError> {
    run_at(invocation, fetcher, Utc::now()).await
}

/// Runs an invocation.
///
/// Ecosystem failures collected under [`ErrorPolicy::Continue`] still produce
/// a written document and outputs, then turn into
/// [`AppError::EcosystemsFailed`].
pub async fn run_at(
    invocation: &Invocation,
    fetcher: &VersionFetcher,
    now: DateTime<Utc>,
) -> Result<RunOutcome, AppError> {
    let options = GenerateOptions {
        keep_existing: invocation.keep_existing,
        error_policy: invocation.error_policy,
    };

    let mut outcome = match &invocation.mode {
        Mode::Static => {
            let document = MatrixDocument::load(&invocation.json_file)?
                .ok_or_else(|| AppError::MissingMatrix(invocation.json_file.clone()))?;
            RunOutcome {
                document: Some(document),
                ..RunOutcome::default()
            }
        }
        Mode::DynamicUpdate(params) => {
            let mut document = MatrixDocument::load_or_skeleton(&invocation.json_file)?;
            let request = DynamicRequest {
                strategies: params.strategies.clone(),
                count: params.count,
                order: params.order,
            };
            let report = apply_dynamic(&mut document, fetcher, &request, &options).await?;
            write_matrix(&document, &invocation.json_file, invocation.dry_run)?;
            RunOutcome {
                document: Some(document),
                report: Some(report),
                ..RunOutcome::default()
            }
        }
        Mode::CacheRefresh(params) => {
            let storage = JsonFileStorage::new(&params.cache_file);
            if invocation.dry_run {
                // resolve against a copy so the cache file stays untouched
                let storage = MemoryStorage::with_document(storage.load()?);
                run_cache(invocation, params, CacheStore::open(storage)?, fetcher, &options, now).await?
            } else {
                run_cache(invocation, params, CacheStore::open(storage)?, fetcher, &options, now).await?
            }
        }
    };

    if invocation.emit {
        if let Some(document) = &outcome.document {
            outcome.outputs = output::flatten(&document.to_value())?;
            output::emit(&outcome.outputs, invocation.output_file.as_deref())?;
        }
    }

    let failed = failed_ecosystems(&outcome);
    if !failed.is_empty() {
        return Err(AppError::EcosystemsFailed(failed));
    }
    Ok(outcome)
}

async fn run_cache<S: CacheStorage>(
    invocation: &Invocation,
    params: &CacheParams,
    mut store: CacheStore<S>,
    fetcher: &VersionFetcher,
    options: &GenerateOptions,
    now: DateTime<Utc>,
) -> Result<RunOutcome, AppError> {
    if params.cache_only {
        let summary = refresh_ecosystems(
            &mut store,
            fetcher,
            &params.ecosystems,
            &params.policy,
            options.error_policy,
            now,
        )
        .await?;
        info!("Cache-only run: matrix document left untouched");
        return Ok(RunOutcome {
            refresh: Some(summary),
            ..RunOutcome::default()
        });
    }

    let mut document = MatrixDocument::load_or_skeleton(&params.template_file)?;
    let request = CacheRequest {
        ecosystems: params.ecosystems.clone(),
        policy: params.policy,
        output_count: params.output_count,
        template_only: params.template_only,
    };
    let report = apply_cache(&mut document, &mut store, fetcher, &request, options, now).await?;
    write_matrix(&document, &invocation.json_file, invocation.dry_run)?;

    Ok(RunOutcome {
        document: Some(document),
        report: Some(report),
        ..RunOutcome::default()
    })
}

fn failed_ecosystems(outcome: &RunOutcome) -> Vec<String> {
    let mut failed: Vec<String> = Vec::new();
    if let Some(report) = &outcome.report {
        failed.extend(
            report
                .failed
                .iter()
                .map(|e| e.ecosystem().map_or_else(|| e.to_string(), |eco| eco.to_string())),
        );
    }
    if let Some(summary) = &outcome.refresh {
        failed.extend(summary.failed_ecosystems().iter().map(|e| e.to_string()));
    }
    failed
}
