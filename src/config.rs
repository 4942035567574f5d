use std::path::PathBuf;

// =============================================================================
// Network-related constants
// =============================================================================

/// Default base URL for the GitHub REST API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// User agent sent with every upstream request
pub const USER_AGENT: &str = "json2vars";

/// Timeout for a single upstream request in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Tags requested per page from the tag source
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on pages walked for one repository
pub const DEFAULT_MAX_PAGES: u32 = 5;

/// Raw tags scanned per ecosystem before parsing; tag namespaces are noisy
/// so the fetcher reads well past the number of versions it returns
pub const TAG_SCAN_LIMIT: usize = 500;

// =============================================================================
// Cache and matrix defaults
// =============================================================================

/// Versions fetched (and retained in the cache) per ecosystem
pub const DEFAULT_CACHE_COUNT: usize = 10;

/// Days a cache entry stays fresh
pub const DEFAULT_MAX_AGE_DAYS: u32 = 1;

/// Default location of the matrix document
pub const DEFAULT_MATRIX_FILE: &str = ".github/json2vars-setter/matrix.json";

/// Default location of the version cache
pub const DEFAULT_CACHE_FILE: &str = ".github/workflows/cache/version_cache.json";

/// Operating systems written into a freshly created matrix document
pub const DEFAULT_OS: [&str; 3] = ["ubuntu-latest", "windows-latest", "macos-latest"];

/// Deployment branch written into a freshly created matrix document
pub const DEFAULT_GHPAGES_BRANCH: &str = "ghpages";

// =============================================================================
// Environment
// =============================================================================

/// Bearer token for the tag source
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// API base URL override (GitHub Enterprise, test servers)
pub const GITHUB_API_URL_ENV: &str = "GITHUB_API_URL";

/// File the pipeline runner reads step outputs from
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Returns the tag source credential, if one is configured.
pub fn github_token() -> Option<String> {
    non_empty(std::env::var(GITHUB_TOKEN_ENV).ok())
}

/// Returns the API base URL to query.
pub fn github_api_url() -> String {
    github_api_url_with_env(std::env::var(GITHUB_API_URL_ENV).ok())
}

/// Returns the runner output file, if the process runs inside a pipeline.
pub fn github_output_path() -> Option<PathBuf> {
    non_empty(std::env::var(GITHUB_OUTPUT_ENV).ok()).map(PathBuf::from)
}

fn github_api_url_with_env(api_url: Option<String>) -> String {
    non_empty(api_url)
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
