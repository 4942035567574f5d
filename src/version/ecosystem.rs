//! Tag rules abstraction for different ecosystems

use crate::version::semver::{VersionKey, parse_version};
use crate::version::types::{Ecosystem, Stability, VersionInfo};

/// Trait for ecosystem-specific tag handling
///
/// Each ecosystem names its release tags differently:
/// - Python: v3.12.0, v3.13.0rc1
/// - Go: go1.22.1, go1.23rc1
/// - Ruby: v3_4_0, v3_4_0_preview1
///
/// An implementation supplies the repository to query, how a tag maps to a
/// version string, and (optionally) how versions are parsed and classified.
/// The fetcher does everything else.
pub trait EcosystemRules: Send + Sync {
    /// Returns the ecosystem these rules handle
    fn ecosystem(&self) -> Ecosystem;

    /// Repository the release tags live in, as "owner/repo"
    fn repository(&self) -> &'static str;

    /// Map a raw tag name to the version string written into documents.
    ///
    /// Returns `None` for tags outside the release namespace (branch markers,
    /// historical naming schemes, ...).
    fn version_from_tag(&self, tag: &str) -> Option<String>;

    /// Parse a version string into its normalized key
    fn parse_version(&self, version: &str) -> Option<VersionKey> {
        parse_version(version)
    }

    /// Whether a parsed version counts as a stable release
    fn is_stable(&self, key: &VersionKey) -> bool {
        !key.is_prerelease()
    }

    /// Parse a raw upstream tag
    fn parse_tag(&self, tag: &str) -> Option<VersionInfo> {
        let version = self.version_from_tag(tag)?;
        self.classify(tag, &version)
    }

    /// Parse a version string read back from a cache or matrix document
    fn parse_stored(&self, version: &str) -> Option<VersionInfo> {
        self.classify(version, version)
    }

    fn classify(&self, tag: &str, version: &str) -> Option<VersionInfo> {
        let key = self.parse_version(version)?;
        let stability = if self.is_stable(&key) {
            Stability::Stable
        } else {
            Stability::Prerelease
        };
        Some(VersionInfo::new(tag, version, key, stability))
    }
}
