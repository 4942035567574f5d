//! Tag source test double

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use json2vars::version::ecosystems::rules_for;
use json2vars::version::error::SourceError;
use json2vars::version::source::TagSource;
use json2vars::version::types::{Ecosystem, RawTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Unavailable,
    RateLimited,
}

/// Tag source serving scripted tags per ecosystem and counting every call
#[derive(Default)]
pub struct ScriptedTagSource {
    tags: Mutex<HashMap<&'static str, Vec<String>>>,
    failures: Mutex<HashMap<&'static str, Failure>>,
    calls: AtomicUsize,
    called: Mutex<HashSet<String>>,
}

impl ScriptedTagSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(self, ecosystem: Ecosystem, tags: &[&str]) -> Self {
        self.set_tags(ecosystem, tags);
        self
    }

    /// Replaces the tags served for an ecosystem and clears any failure
    pub fn set_tags(&self, ecosystem: Ecosystem, tags: &[&str]) {
        let repository = rules_for(ecosystem).repository();
        self.failures.lock().unwrap().remove(repository);
        self.tags
            .lock()
            .unwrap()
            .insert(repository, tags.iter().map(|t| t.to_string()).collect());
    }

    /// Makes every fetch of the ecosystem fail as unreachable
    pub fn fail(&self, ecosystem: Ecosystem) {
        self.failures
            .lock()
            .unwrap()
            .insert(rules_for(ecosystem).repository(), Failure::Unavailable);
    }

    /// Makes every fetch of the ecosystem hit the rate limit
    pub fn rate_limit(&self, ecosystem: Ecosystem) {
        self.failures
            .lock()
            .unwrap()
            .insert(rules_for(ecosystem).repository(), Failure::RateLimited);
    }

    /// Number of fetches made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn was_called_for(&self, ecosystem: Ecosystem) -> bool {
        self.called
            .lock()
            .unwrap()
            .contains(rules_for(ecosystem).repository())
    }
}

#[async_trait]
impl TagSource for ScriptedTagSource {
    async fn fetch_tags(
        &self,
        repository: &str,
        max_items: Option<usize>,
    ) -> Result<Vec<RawTag>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.lock().unwrap().insert(repository.to_string());

        match self.failures.lock().unwrap().get(repository) {
            Some(Failure::Unavailable) => {
                return Err(SourceError::Unavailable {
                    message: format!("{} unreachable", repository),
                });
            }
            Some(Failure::RateLimited) => return Err(SourceError::RateLimited { reset_at: None }),
            None => {}
        }

        let tags = self.tags.lock().unwrap();
        let names = tags.get(repository).cloned().unwrap_or_default();
        let limit = max_items.unwrap_or(names.len());
        Ok(names.iter().take(limit).map(|name| RawTag::new(name)).collect())
    }
}
