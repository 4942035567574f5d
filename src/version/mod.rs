//! Version resolution layer
//!
//! This module fetches release tags from upstream sources, turns them into
//! classified and ordered versions per ecosystem, and keeps a persisted cache
//! of the results.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  TagSource  │────▶│   Fetcher   │────▶│  Strategy   │
//! │  (GitHub)   │     │  (generic)  │     │  (filter)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//! ┌─────────────┐     ┌─────────────┐
//! │ Ecosystems  │     │    Cache    │
//! │(python,go..)│     │ (JSON file) │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`source`]: tag source trait for fetching raw tags
//! - [`sources`]: concrete tag sources (GitHub)
//! - [`ecosystem`]: per-ecosystem tag rules trait
//! - [`ecosystems`]: rules for python, nodejs, ruby, go and rust
//! - [`fetcher`]: generic fetcher turning raw tags into ordered versions
//! - [`strategy`]: stable / latest / both filtering
//! - [`cache`]: persisted version cache with freshness and merge logic
//! - [`refresh`]: refreshing several ecosystems in one run
//! - [`semver`]: normalized version keys and list ordering
//! - [`error`]: error types for sources, fetchers and the cache
//! - [`types`]: common types like `Ecosystem` and `VersionInfo`

pub mod cache;
pub mod ecosystem;
pub mod ecosystems;
pub mod error;
pub mod fetcher;
pub mod refresh;
pub mod semver;
pub mod source;
pub mod sources;
pub mod strategy;
pub mod types;
