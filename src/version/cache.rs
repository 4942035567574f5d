//! Persisted version cache
//!
//! The cache is a single JSON document mapping an ecosystem identifier to the
//! versions last fetched for it:
//!
//! ```json
//! {
//!     "go": {
//!         "versions": ["1.22.1", "1.22.0"],
//!         "last_updated": "2024-06-01T08:00:00Z",
//!         "fetched_count": 10
//!     }
//! }
//! ```
//!
//! [`CacheStore`] owns the document for one invocation. Every refresh is
//! applied to a copy, written through a [`CacheStorage`], and only committed
//! in memory once the write has succeeded.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::{DEFAULT_CACHE_COUNT, DEFAULT_MAX_AGE_DAYS};
use crate::json_file::{self, JsonFileError};
use crate::version::ecosystem::EcosystemRules;
use crate::version::ecosystems::rules_for;
use crate::version::error::{CacheError, RefreshError};
use crate::version::fetcher::{FetchRequest, VersionFetcher};
use crate::version::semver::{VersionKey, order_versions};
use crate::version::types::{Ecosystem, SortOrder, VersionInfo};

/// Cached versions of one ecosystem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub versions: Vec<String>,

    #[serde(
        default,
        with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,

    /// Cache count requested by the refresh that wrote this entry (0 = unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_count: Option<usize>,
}

/// Timestamps are written as RFC 3339 UTC. Naive ISO-8601 timestamps are
/// read as UTC; anything unparseable reads as absent so the entry refreshes.
mod lenient_timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(timestamp) => {
                serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Some(timestamp.with_timezone(&Utc));
        }
        match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(naive) => Some(naive.and_utc()),
            Err(_) => {
                tracing::warn!("Ignoring unparseable cache timestamp: {}", raw);
                None
            }
        }
    }
}

/// Ecosystem identifier → cache entry, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheDocument {
    entries: IndexMap<String, CacheEntry>,
}

impl CacheDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ecosystem: Ecosystem) -> Option<&CacheEntry> {
        self.entries.get(ecosystem.as_str())
    }

    /// Inserts or replaces an entry; a replaced entry keeps its position
    pub fn insert(&mut self, ecosystem: Ecosystem, entry: CacheEntry) {
        self.entries.insert(ecosystem.as_str().to_string(), entry);
    }

    /// Identifiers in document order, including ones this build does not know
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where a cache document is persisted
#[cfg_attr(test, automock)]
pub trait CacheStorage: Send + Sync {
    /// Loads the document; a document that was never written loads as empty
    fn load(&self) -> Result<CacheDocument, CacheError>;

    /// Replaces the persisted document
    fn save(&self, document: &CacheDocument) -> Result<(), CacheError>;
}

/// Cache persisted as a JSON file, written atomically
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStorage for JsonFileStorage {
    fn load(&self) -> Result<CacheDocument, CacheError> {
        let path = self.path.clone();
        match json_file::read_json::<CacheDocument>(&self.path) {
            Ok(Some(document)) => {
                debug!("Loaded {} cache entries from {:?}", document.len(), path);
                Ok(document)
            }
            Ok(None) => {
                info!("No cache file at {:?}, starting empty", path);
                Ok(CacheDocument::new())
            }
            Err(JsonFileError::Io(source)) => Err(CacheError::Read { path, source }),
            Err(JsonFileError::Json(source)) => Err(CacheError::Parse { path, source }),
        }
    }

    fn save(&self, document: &CacheDocument) -> Result<(), CacheError> {
        let path = self.path.clone();
        json_file::write_json_atomic(&self.path, document).map_err(|e| match e {
            JsonFileError::Io(source) => CacheError::Write { path, source },
            JsonFileError::Json(e) => CacheError::Write {
                path,
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            },
        })?;
        debug!("Cache saved to {:?}", self.path);
        Ok(())
    }
}

/// In-memory storage, for tests and dry runs
#[derive(Default)]
pub struct MemoryStorage {
    document: Mutex<Option<CacheDocument>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: CacheDocument) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    /// Makes every subsequent save fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// The document as last saved (or seeded)
    pub fn stored(&self) -> Result<Option<CacheDocument>, CacheError> {
        let guard = self.document.lock().map_err(|_| CacheError::LockPoisoned)?;
        Ok(guard.clone())
    }
}

impl CacheStorage for MemoryStorage {
    fn load(&self) -> Result<CacheDocument, CacheError> {
        let guard = self.document.lock().map_err(|_| CacheError::LockPoisoned)?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn save(&self, document: &CacheDocument) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Write {
                path: PathBuf::from("<memory>"),
                source: io::Error::other("writes disabled"),
            });
        }
        let mut guard = self.document.lock().map_err(|_| CacheError::LockPoisoned)?;
        *guard = Some(document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<S: CacheStorage + ?Sized> CacheStorage for &S {
    fn load(&self) -> Result<CacheDocument, CacheError> {
        (**self).load()
    }

    fn save(&self, document: &CacheDocument) -> Result<(), CacheError> {
        (**self).save(document)
    }
}

/// How refreshes decide freshness and merge fetched versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Days an entry stays fresh; 0 always refreshes
    pub max_age_days: u32,
    /// Refresh regardless of age
    pub force: bool,
    /// Versions fetched per refresh; 0 fetches everything found
    pub cache_count: usize,
    /// Union fetched versions with the cached ones instead of replacing them
    pub incremental: bool,
    /// Cap on versions kept by an incremental merge; 0 is unbounded
    pub max_retained: usize,
    pub order: SortOrder,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            force: false,
            cache_count: DEFAULT_CACHE_COUNT,
            incremental: false,
            max_retained: 0,
            order: SortOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Fresh,
    Stale,
}

/// Classify an entry against the refresh policy on the given day
pub fn entry_state(entry: Option<&CacheEntry>, policy: &RefreshPolicy, today: NaiveDate) -> EntryState {
    let Some(entry) = entry else {
        return EntryState::Absent;
    };

    if policy.force || policy.max_age_days == 0 {
        return EntryState::Stale;
    }

    let Some(last_updated) = entry.last_updated else {
        return EntryState::Stale;
    };

    let fetched = entry.fetched_count.unwrap_or(entry.versions.len());
    let count_grew = fetched != 0 && (policy.cache_count == 0 || policy.cache_count > fetched);
    if count_grew {
        debug!("Requested count {} exceeds cached {}", policy.cache_count, fetched);
        return EntryState::Stale;
    }

    let age_days = (today - last_updated.date_naive()).num_days();
    if age_days >= i64::from(policy.max_age_days) {
        EntryState::Stale
    } else {
        EntryState::Fresh
    }
}

/// Merge freshly fetched versions into an entry.
///
/// Returns the new entry and the versions it holds that the previous entry did
/// not. Incremental merges keep every previously cached version unless the
/// `max_retained` cap pushes it out; the lowest versions go first.
pub fn merge_entry(
    rules: &dyn EcosystemRules,
    previous: Option<&CacheEntry>,
    fetched: &[VersionInfo],
    policy: &RefreshPolicy,
    now: DateTime<Utc>,
) -> (CacheEntry, Vec<String>) {
    let previous_versions = parse_stored_versions(rules, previous);
    let previous_keys: HashSet<&VersionKey> = previous_versions.iter().map(|v| v.key()).collect();

    let merged = if policy.incremental {
        let combined: Vec<VersionInfo> = fetched
            .iter()
            .cloned()
            .chain(previous_versions.iter().cloned())
            .collect();
        order_versions(combined, policy.order, policy.max_retained)
    } else {
        order_versions(fetched.to_vec(), policy.order, 0)
    };

    let added = merged
        .iter()
        .filter(|v| !previous_keys.contains(v.key()))
        .map(|v| v.version().to_string())
        .collect();

    let entry = CacheEntry {
        versions: merged.iter().map(|v| v.version().to_string()).collect(),
        last_updated: Some(now),
        fetched_count: Some(policy.cache_count),
    };
    (entry, added)
}

fn parse_stored_versions(rules: &dyn EcosystemRules, entry: Option<&CacheEntry>) -> Vec<VersionInfo> {
    entry
        .map(|entry| {
            entry
                .versions
                .iter()
                .filter_map(|version| {
                    let parsed = rules.parse_stored(version);
                    if parsed.is_none() {
                        warn!("Dropping unparseable cached {} version: {}", rules.ecosystem(), version);
                    }
                    parsed
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Result of refreshing one ecosystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The entry was fresh; nothing was fetched
    Hit,
    Refreshed {
        /// Versions not present before this refresh
        added: Vec<String>,
        total: usize,
    },
}

/// The cache document of one invocation and the storage behind it
pub struct CacheStore<S: CacheStorage> {
    storage: S,
    document: CacheDocument,
}

impl<S: CacheStorage> CacheStore<S> {
    /// Loads the document from storage
    pub fn open(storage: S) -> Result<Self, CacheError> {
        let document = storage.load()?;
        Ok(Self { storage, document })
    }

    pub fn document(&self) -> &CacheDocument {
        &self.document
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn entry(&self, ecosystem: Ecosystem) -> Option<&CacheEntry> {
        self.document.get(ecosystem)
    }

    pub fn state(&self, ecosystem: Ecosystem, policy: &RefreshPolicy, today: NaiveDate) -> EntryState {
        entry_state(self.entry(ecosystem), policy, today)
    }

    /// Reads cached versions without refreshing.
    ///
    /// An absent entry reads as an empty list. `limit` keeps the greatest
    /// versions; 0 keeps all of them.
    pub fn read_versions(&self, ecosystem: Ecosystem, order: SortOrder, limit: usize) -> Vec<String> {
        let versions = parse_stored_versions(rules_for(ecosystem), self.entry(ecosystem));
        order_versions(versions, order, limit)
            .iter()
            .map(|v| v.version().to_string())
            .collect()
    }

    /// Refreshes one ecosystem if its entry is absent or stale.
    ///
    /// On any failure the in-memory and persisted documents are left exactly
    /// as they were.
    pub async fn refresh(
        &mut self,
        fetcher: &VersionFetcher,
        ecosystem: Ecosystem,
        policy: &RefreshPolicy,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome, RefreshError> {
        let state = self.state(ecosystem, policy, now.date_naive());
        if state == EntryState::Fresh {
            debug!("{} cache entry is fresh", ecosystem);
            return Ok(RefreshOutcome::Hit);
        }
        info!("Refreshing {} cache entry ({:?})", ecosystem, state);

        let request = FetchRequest {
            count: policy.cache_count,
            order: policy.order,
            strategy_hint: None,
        };
        let fetched = fetcher.fetch(ecosystem, &request).await?;

        let (entry, added) = merge_entry(rules_for(ecosystem), self.entry(ecosystem), &fetched, policy, now);
        let total = entry.versions.len();

        let mut next = self.document.clone();
        next.insert(ecosystem, entry);
        self.storage
            .save(&next)
            .map_err(|source| RefreshError::Persist { ecosystem, source })?;
        self.document = next;

        Ok(RefreshOutcome::Refreshed { added, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;
    use rstest::rstest;
    use tempfile::TempDir;

    use crate::version::error::SourceError;
    use crate::version::source::MockTagSource;
    use crate::version::types::RawTag;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn entry(versions: &[&str], last_updated: Option<DateTime<Utc>>, fetched_count: Option<usize>) -> CacheEntry {
        CacheEntry {
            versions: versions.iter().map(|v| v.to_string()).collect(),
            last_updated,
            fetched_count,
        }
    }

    fn fetcher_with_tags(tags: &'static [&'static str], times: usize) -> VersionFetcher {
        let mut source = MockTagSource::new();
        source
            .expect_fetch_tags()
            .times(times)
            .returning(move |_, _| Ok(tags.iter().map(|t| RawTag::new(t)).collect()));
        VersionFetcher::new(Arc::new(source))
    }

    fn go_versions(names: &[&str]) -> Vec<VersionInfo> {
        names
            .iter()
            .map(|name| rules_for(Ecosystem::Go).parse_stored(name).unwrap())
            .collect()
    }

    #[rstest]
    // same day, max age 1
    #[case(at(2024, 6, 1, 8), at(2024, 6, 1, 23), 1, false, EntryState::Fresh)]
    // calendar day rolled over, even though less than 24h passed
    #[case(at(2024, 6, 1, 23), at(2024, 6, 2, 1), 1, false, EntryState::Stale)]
    #[case(at(2024, 6, 1, 8), at(2024, 6, 3, 8), 3, false, EntryState::Fresh)]
    #[case(at(2024, 6, 1, 8), at(2024, 6, 4, 8), 3, false, EntryState::Stale)]
    #[case(at(2024, 6, 1, 8), at(2024, 6, 1, 8), 0, false, EntryState::Stale)]
    #[case(at(2024, 6, 1, 8), at(2024, 6, 1, 8), 1, true, EntryState::Stale)]
    fn entry_state_uses_calendar_days(
        #[case] last_updated: DateTime<Utc>,
        #[case] now: DateTime<Utc>,
        #[case] max_age_days: u32,
        #[case] force: bool,
        #[case] expected: EntryState,
    ) {
        let cached = entry(&["1.22.0"], Some(last_updated), Some(10));
        let policy = RefreshPolicy {
            max_age_days,
            force,
            ..RefreshPolicy::default()
        };

        assert_eq!(entry_state(Some(&cached), &policy, now.date_naive()), expected);
    }

    #[test]
    fn entry_state_reports_absent_and_missing_timestamp() {
        let policy = RefreshPolicy::default();
        let today = at(2024, 6, 1, 0).date_naive();

        assert_eq!(entry_state(None, &policy, today), EntryState::Absent);
        assert_eq!(
            entry_state(Some(&entry(&["1.22.0"], None, Some(10))), &policy, today),
            EntryState::Stale
        );
    }

    #[rstest]
    #[case(Some(5), 10, EntryState::Stale)]
    #[case(Some(10), 5, EntryState::Fresh)]
    #[case(Some(10), 10, EntryState::Fresh)]
    #[case(Some(10), 0, EntryState::Stale)]
    #[case(Some(0), 50, EntryState::Fresh)]
    // legacy entries without a recorded count compare against their length
    #[case(None, 10, EntryState::Stale)]
    #[case(None, 2, EntryState::Fresh)]
    fn entry_state_refreshes_when_requested_count_grows(
        #[case] fetched_count: Option<usize>,
        #[case] cache_count: usize,
        #[case] expected: EntryState,
    ) {
        let now = at(2024, 6, 1, 8);
        let cached = entry(&["1.22.0", "1.21.0"], Some(now), fetched_count);
        let policy = RefreshPolicy {
            cache_count,
            ..RefreshPolicy::default()
        };

        assert_eq!(entry_state(Some(&cached), &policy, now.date_naive()), expected);
    }

    #[test]
    fn merge_entry_replace_supersedes_previous_list() {
        let previous = entry(&["1.21.0", "1.20.0"], Some(at(2024, 1, 1, 0)), Some(2));
        let policy = RefreshPolicy::default();
        let now = at(2024, 6, 1, 8);

        let (merged, added) = merge_entry(
            rules_for(Ecosystem::Go),
            Some(&previous),
            &go_versions(&["1.22.0", "1.21.0"]),
            &policy,
            now,
        );

        assert_eq!(merged.versions, vec!["1.22.0", "1.21.0"]);
        assert_eq!(merged.last_updated, Some(now));
        assert_eq!(merged.fetched_count, Some(10));
        assert_eq!(added, vec!["1.22.0"]);
    }

    #[test]
    fn merge_entry_incremental_keeps_old_versions() {
        let previous = entry(&["1.21.0", "1.20.0"], Some(at(2024, 1, 1, 0)), Some(2));
        let policy = RefreshPolicy {
            incremental: true,
            ..RefreshPolicy::default()
        };

        let (merged, added) = merge_entry(
            rules_for(Ecosystem::Go),
            Some(&previous),
            &go_versions(&["1.22.0", "1.21.0"]),
            &policy,
            at(2024, 6, 1, 8),
        );

        assert_eq!(merged.versions, vec!["1.22.0", "1.21.0", "1.20.0"]);
        assert_eq!(added, vec!["1.22.0"]);
    }

    #[test]
    fn merge_entry_incremental_cap_drops_lowest_versions() {
        let previous = entry(&["1.21.0", "1.20.0", "1.19.0"], None, None);
        let policy = RefreshPolicy {
            incremental: true,
            max_retained: 3,
            order: SortOrder::Ascending,
            ..RefreshPolicy::default()
        };

        let (merged, _) = merge_entry(
            rules_for(Ecosystem::Go),
            Some(&previous),
            &go_versions(&["1.22.0"]),
            &policy,
            at(2024, 6, 1, 8),
        );

        assert_eq!(merged.versions, vec!["1.20.0", "1.21.0", "1.22.0"]);
    }

    #[test]
    fn cache_document_round_trips_with_order() {
        let mut document = CacheDocument::new();
        document.insert(Ecosystem::Rust, entry(&["1.80.0"], Some(at(2024, 6, 1, 8)), Some(10)));
        document.insert(Ecosystem::Go, entry(&["1.22.0", "1.21.0"], Some(at(2024, 6, 1, 9)), Some(10)));
        document.insert(Ecosystem::Python, entry(&[], None, None));

        let json = json_file::to_pretty_string(&document).unwrap();
        let parsed: CacheDocument = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, document);
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["rust", "go", "python"]);
    }

    #[test]
    fn cache_document_reads_naive_timestamps_as_utc() {
        let parsed: CacheDocument = serde_json::from_str(
            r#"{"ruby": {"versions": ["3.4.0"], "last_updated": "2024-06-01T08:30:00.123456"}}"#,
        )
        .unwrap();

        let ruby = parsed.get(Ecosystem::Ruby).unwrap();
        assert_eq!(
            ruby.last_updated,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap() + chrono::Duration::microseconds(123_456))
        );
        assert_eq!(ruby.fetched_count, None);
    }

    #[test]
    fn cache_document_treats_garbage_timestamp_as_missing() {
        let parsed: CacheDocument =
            serde_json::from_str(r#"{"go": {"versions": ["1.22.0"], "last_updated": "yesterday"}}"#).unwrap();

        assert_eq!(parsed.get(Ecosystem::Go).unwrap().last_updated, None);
    }

    #[test]
    fn cache_document_preserves_unknown_ecosystems() {
        let json = r#"{"java": {"versions": ["21"]}, "go": {"versions": ["1.22.0"]}}"#;

        let parsed: CacheDocument = serde_json::from_str(json).unwrap();
        let written: serde_json::Value = serde_json::to_value(&parsed).unwrap();

        assert_eq!(
            written,
            serde_json::json!({"java": {"versions": ["21"]}, "go": {"versions": ["1.22.0"]}})
        );
    }

    #[test]
    fn json_file_storage_loads_missing_file_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("cache/version_cache.json"));

        let document = storage.load().unwrap();

        assert!(document.is_empty());
    }

    #[test]
    fn json_file_storage_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("version_cache.json");
        std::fs::write(&path, "{\"go\": [").unwrap();

        let result = JsonFileStorage::new(&path).load();

        assert!(matches!(result, Err(CacheError::Parse { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"go\": [");
    }

    #[test]
    fn json_file_storage_saves_and_loads() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested/version_cache.json"));
        let mut document = CacheDocument::new();
        document.insert(Ecosystem::Nodejs, entry(&["22.1.0"], Some(at(2024, 6, 1, 8)), Some(1)));

        storage.save(&document).unwrap();

        assert_eq!(storage.load().unwrap(), document);
        let raw = std::fs::read_to_string(storage.path()).unwrap();
        assert!(raw.contains("\"last_updated\": \"2024-06-01T08:00:00Z\""));
    }

    #[tokio::test]
    async fn refresh_fetches_absent_entry_and_persists() {
        let fetcher = fetcher_with_tags(&["go1.22.1", "go1.22.0", "go1.23rc1"], 1);
        let mut store = CacheStore::open(MemoryStorage::new()).unwrap();
        let policy = RefreshPolicy::default();

        let outcome = store
            .refresh(&fetcher, Ecosystem::Go, &policy, at(2024, 6, 1, 8))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RefreshOutcome::Refreshed {
                added: vec!["1.23rc1".to_string(), "1.22.1".to_string(), "1.22.0".to_string()],
                total: 3,
            }
        );
        assert_eq!(store.storage().write_count(), 1);
        assert_eq!(store.storage().stored().unwrap().as_ref(), Some(store.document()));
    }

    #[tokio::test]
    async fn refresh_skips_fresh_entry() {
        let fetcher = fetcher_with_tags(&[], 0);
        let now = at(2024, 6, 1, 8);
        let mut document = CacheDocument::new();
        document.insert(Ecosystem::Go, entry(&["1.22.0"], Some(now), Some(10)));
        let mut store = CacheStore::open(MemoryStorage::with_document(document)).unwrap();

        let outcome = store
            .refresh(&fetcher, Ecosystem::Go, &RefreshPolicy::default(), now)
            .await
            .unwrap();

        assert_eq!(outcome, RefreshOutcome::Hit);
        assert_eq!(store.storage().write_count(), 0);
    }

    #[tokio::test]
    async fn refresh_leaves_document_untouched_on_fetch_error() {
        let mut source = MockTagSource::new();
        source.expect_fetch_tags().returning(|_, _| {
            Err(SourceError::Unavailable {
                message: "connection reset".to_string(),
            })
        });
        let fetcher = VersionFetcher::new(Arc::new(source));
        let mut document = CacheDocument::new();
        document.insert(Ecosystem::Go, entry(&["1.22.0", "1.21.0"], Some(at(2024, 1, 1, 0)), Some(2)));
        let mut store = CacheStore::open(MemoryStorage::with_document(document.clone())).unwrap();
        let policy = RefreshPolicy {
            force: true,
            ..RefreshPolicy::default()
        };

        let error = store
            .refresh(&fetcher, Ecosystem::Go, &policy, at(2024, 6, 1, 8))
            .await
            .unwrap_err();

        assert!(matches!(error, RefreshError::Fetch(_)));
        assert_eq!(error.ecosystem(), Ecosystem::Go);
        assert_eq!(store.document(), &document);
        assert_eq!(store.storage().write_count(), 0);
    }

    #[tokio::test]
    async fn refresh_does_not_commit_when_save_fails() {
        let fetcher = fetcher_with_tags(&["v3_4_0", "v3_3_6"], 1);
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let mut store = CacheStore::open(storage).unwrap();

        let error = store
            .refresh(&fetcher, Ecosystem::Ruby, &RefreshPolicy::default(), at(2024, 6, 1, 8))
            .await
            .unwrap_err();

        assert!(matches!(error, RefreshError::Persist { ecosystem: Ecosystem::Ruby, .. }));
        assert!(store.entry(Ecosystem::Ruby).is_none());
    }

    #[test]
    fn read_versions_limits_to_greatest_in_requested_order() {
        let mut document = CacheDocument::new();
        document.insert(
            Ecosystem::Nodejs,
            entry(&["22.1.0", "22.0.0", "20.11.1", "18.20.0"], None, None),
        );
        let store = CacheStore::open(MemoryStorage::with_document(document)).unwrap();

        assert_eq!(
            store.read_versions(Ecosystem::Nodejs, SortOrder::Ascending, 2),
            vec!["22.0.0", "22.1.0"]
        );
        assert_eq!(
            store.read_versions(Ecosystem::Nodejs, SortOrder::Descending, 0),
            vec!["22.1.0", "22.0.0", "20.11.1", "18.20.0"]
        );
        assert!(store.read_versions(Ecosystem::Python, SortOrder::Descending, 2).is_empty());
    }

    #[test]
    fn mock_storage_errors_surface_from_open() {
        let mut storage = MockCacheStorage::new();
        storage.expect_load().returning(|| Err(CacheError::LockPoisoned));

        let result = CacheStore::open(storage);

        assert!(matches!(result, Err(CacheError::LockPoisoned)));
    }
}
