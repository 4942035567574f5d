//! Command line surface, one flag per composite action input

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

use crate::app::{CacheParams, DynamicParams, Invocation, Mode};
use crate::config::{DEFAULT_CACHE_COUNT, DEFAULT_CACHE_FILE, DEFAULT_MATRIX_FILE, DEFAULT_MAX_AGE_DAYS};
use crate::version::cache::RefreshPolicy;
use crate::version::refresh::ErrorPolicy;
use crate::version::strategy::VersionStrategy;
use crate::version::types::{Ecosystem, SortOrder, UnknownEcosystem};

#[derive(Debug, Parser)]
#[command(name = "json2vars")]
#[command(version, about = "Emit a CI matrix as step outputs, refreshing language versions from upstream")]
pub struct Args {
    /// Matrix document to read and emit
    #[arg(long, default_value = DEFAULT_MATRIX_FILE)]
    pub json_file: PathBuf,

    /// Fetch versions upstream and filter them by strategy
    #[arg(long)]
    pub dynamic_update: bool,

    /// Strategy applied to every ecosystem
    #[arg(long, value_name = "STRATEGY")]
    pub all: Option<VersionStrategy>,

    #[arg(long, value_name = "STRATEGY")]
    pub python: Option<VersionStrategy>,

    #[arg(long, value_name = "STRATEGY")]
    pub nodejs: Option<VersionStrategy>,

    #[arg(long, value_name = "STRATEGY")]
    pub ruby: Option<VersionStrategy>,

    #[arg(long, value_name = "STRATEGY")]
    pub go: Option<VersionStrategy>,

    #[arg(long, value_name = "STRATEGY")]
    pub rust: Option<VersionStrategy>,

    /// Fill version lists from the version cache
    #[arg(long)]
    pub use_cache: bool,

    /// Comma separated ecosystems, or `all`
    #[arg(long, default_value = "all")]
    pub cache_languages: String,

    #[arg(long)]
    pub force_cache_update: bool,

    /// Days a cache entry stays fresh
    #[arg(long, value_name = "DAYS", default_value_t = DEFAULT_MAX_AGE_DAYS)]
    pub cache_max_age: u32,

    /// Versions fetched per ecosystem; 0 fetches every tag found
    #[arg(long, default_value_t = DEFAULT_CACHE_COUNT)]
    pub cache_count: usize,

    /// Versions written to the matrix per ecosystem [default: cache count]
    #[arg(long)]
    pub output_count: Option<usize>,

    /// Cap on versions kept by an incremental update; 0 is unbounded
    #[arg(long, default_value_t = 0)]
    pub max_retained: usize,

    /// Merge fetched versions into the cache instead of replacing them
    #[arg(long)]
    pub incremental_cache: bool,

    /// Build the matrix from the cache as persisted, without fetching
    #[arg(long)]
    pub template_only: bool,

    /// Refresh the cache without touching the matrix
    #[arg(long)]
    pub cache_only: bool,

    #[arg(long, value_name = "asc|desc", default_value = "desc")]
    pub sort_order: SortOrder,

    /// Keep version lists of ecosystems that were not requested
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub keep_existing: bool,

    #[arg(long, default_value = DEFAULT_CACHE_FILE)]
    pub cache_file: PathBuf,

    /// Matrix the cached versions are merged into [default: json file]
    #[arg(long)]
    pub template_file: Option<PathBuf>,

    /// Resolve everything but write no files
    #[arg(long)]
    pub dry_run: bool,

    /// Keep going when an ecosystem fails; the run still exits non-zero
    #[arg(long)]
    pub continue_on_error: bool,

    /// Do not emit step outputs
    #[arg(long)]
    pub no_emit: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write JSON logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("--dynamic-update needs a strategy: pass --all or a per-language flag")]
    NoStrategy,

    #[error("--template-only and --cache-only cannot be combined")]
    TemplateAndCacheOnly,

    #[error(transparent)]
    UnknownEcosystem(#[from] UnknownEcosystem),
}

impl Args {
    /// Per-ecosystem strategies; a per-language flag overrides `--all`
    pub fn strategies(&self) -> IndexMap<Ecosystem, VersionStrategy> {
        Ecosystem::ALL
            .iter()
            .filter_map(|&ecosystem| {
                let specific = match ecosystem {
                    Ecosystem::Python => self.python,
                    Ecosystem::Nodejs => self.nodejs,
                    Ecosystem::Ruby => self.ruby,
                    Ecosystem::Go => self.go,
                    Ecosystem::Rust => self.rust,
                };
                specific.or(self.all).map(|strategy| (ecosystem, strategy))
            })
            .collect()
    }

    /// Resolves the flags into a single mode.
    ///
    /// `output_file` is where step outputs are appended, usually the runner's
    /// `GITHUB_OUTPUT`.
    pub fn into_invocation(self, output_file: Option<PathBuf>) -> Result<Invocation, UsageError> {
        let mode = self.mode()?;
        Ok(Invocation {
            json_file: self.json_file,
            mode,
            keep_existing: self.keep_existing,
            dry_run: self.dry_run,
            error_policy: if self.continue_on_error {
                ErrorPolicy::Continue
            } else {
                ErrorPolicy::Abort
            },
            emit: !self.no_emit,
            output_file,
        })
    }

    fn mode(&self) -> Result<Mode, UsageError> {
        let strategies = self.strategies();

        if self.dynamic_update {
            if strategies.is_empty() {
                return Err(UsageError::NoStrategy);
            }
            if self.use_cache {
                warn!("Both --dynamic-update and --use-cache given, using dynamic update");
            }
            return Ok(Mode::DynamicUpdate(DynamicParams {
                strategies,
                count: self.cache_count,
                order: self.sort_order,
            }));
        }

        if !strategies.is_empty() {
            warn!("Strategy flags have no effect without --dynamic-update");
        }

        if !self.use_cache {
            return Ok(Mode::Static);
        }

        if self.template_only && self.cache_only {
            return Err(UsageError::TemplateAndCacheOnly);
        }

        Ok(Mode::CacheRefresh(CacheParams {
            ecosystems: parse_languages(&self.cache_languages)?,
            policy: RefreshPolicy {
                max_age_days: self.cache_max_age,
                force: self.force_cache_update,
                cache_count: self.cache_count,
                incremental: self.incremental_cache,
                max_retained: self.max_retained,
                order: self.sort_order,
            },
            output_count: self.output_count.filter(|n| *n > 0).unwrap_or(self.cache_count),
            template_only: self.template_only,
            cache_only: self.cache_only,
            cache_file: self.cache_file.clone(),
            template_file: self.template_file.clone().unwrap_or_else(|| self.json_file.clone()),
        }))
    }
}

/// Parses `--cache-languages`; `all` (or nothing) selects every ecosystem
pub fn parse_languages(raw: &str) -> Result<Vec<Ecosystem>, UnknownEcosystem> {
    let names: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if names.is_empty() || names.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        return Ok(Ecosystem::ALL.to_vec());
    }

    let mut ecosystems = Vec::new();
    for name in names {
        let ecosystem = name.parse()?;
        if !ecosystems.contains(&ecosystem) {
            ecosystems.push(ecosystem);
        }
    }
    Ok(ecosystems)
}
