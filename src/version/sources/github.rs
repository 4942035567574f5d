//! GitHub tags API source

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::config::{self, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, FETCH_TIMEOUT_MS, USER_AGENT};
use crate::version::error::SourceError;
use crate::version::source::TagSource;
use crate::version::types::{RawTag, TagPage};

/// Tag source backed by the GitHub REST API (`GET /repos/{owner}/{repo}/tags`)
pub struct GitHubTagSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    per_page: u32,
    max_pages: u32,
}

impl GitHubTagSource {
    /// Creates a source for the given API base URL
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, SourceError> {
        Self::new_with_timeout(base_url, token, Duration::from_millis(FETCH_TIMEOUT_MS))
    }

    /// Creates a source whose requests give up after `timeout`
    pub fn new_with_timeout(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            per_page: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        })
    }

    /// Creates a source from `GITHUB_API_URL` and `GITHUB_TOKEN`
    pub fn from_env() -> Result<Self, SourceError> {
        Self::new(&config::github_api_url(), config::github_token())
    }

    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Fetches a single page of tags
    pub async fn fetch_page(&self, repository: &str, page: u32) -> Result<TagPage, SourceError> {
        let url = format!(
            "{}/repos/{}/tags?per_page={}&page={}",
            self.base_url, repository, self.per_page, page
        );
        debug!("Fetching tags: {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if is_rate_limited(status, &headers, &body) {
            let reset_at = rate_limit_reset(&headers);
            warn!("GitHub API rate limit hit while fetching {}", repository);
            return Err(SourceError::RateLimited { reset_at });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(SourceError::Request {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let tags: Vec<RawTag> = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse GitHub tags response: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        let next_page = if tags.len() < self.per_page as usize {
            None
        } else {
            Some(page + 1)
        };

        Ok(TagPage { tags, next_page })
    }
}

#[async_trait::async_trait]
impl TagSource for GitHubTagSource {
    async fn fetch_tags(
        &self,
        repository: &str,
        max_items: Option<usize>,
    ) -> Result<Vec<RawTag>, SourceError> {
        let mut tags = Vec::new();
        let mut page = Some(1);

        while let Some(current) = page {
            if current > self.max_pages {
                debug!("Stopping at page limit {} for {}", self.max_pages, repository);
                break;
            }

            let result = self.fetch_page(repository, current).await?;
            tags.extend(result.tags);

            if let Some(max) = max_items.filter(|max| tags.len() >= *max) {
                tags.truncate(max);
                break;
            }

            page = result.next_page;
        }

        debug!("Fetched {} tags for {}", tags.len(), repository);
        Ok(tags)
    }
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    if status != StatusCode::FORBIDDEN {
        return false;
    }
    let exhausted = header_str(headers, "x-ratelimit-remaining").is_some_and(|v| v.trim() == "0");
    exhausted || body.to_ascii_lowercase().contains("rate limit")
}

/// Reset time from `x-ratelimit-reset` (epoch seconds), falling back to `retry-after` (seconds)
fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    if let Some(epoch) = header_str(headers, "x-ratelimit-reset").and_then(|v| v.trim().parse::<i64>().ok()) {
        return DateTime::from_timestamp(epoch, 0);
    }
    // untrusted values: out-of-range delays read as unknown
    header_str(headers, "retry-after")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(TimeDelta::try_seconds)
        .and_then(|delay| Utc::now().checked_add_signed(delay))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
