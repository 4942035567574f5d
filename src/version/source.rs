//! Tag source trait for fetching raw release tags

#[cfg(test)]
use mockall::automock;

use crate::version::error::SourceError;
use crate::version::types::RawTag;

/// Trait for listing the tags of an upstream repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagSource: Send + Sync {
    /// Fetches raw tags for a repository
    ///
    /// # Arguments
    /// * `repository` - The repository as "owner/repo" (e.g., "golang/go")
    /// * `max_items` - Stop after this many tags; `None` walks every page the source allows
    ///
    /// # Returns
    /// * `Ok(Vec<RawTag>)` - Tags in upstream order (newest first for GitHub)
    /// * `Err(SourceError)` - If the query fails
    async fn fetch_tags(
        &self,
        repository: &str,
        max_items: Option<usize>,
    ) -> Result<Vec<RawTag>, SourceError>;
}
