//! CPython tag rules
//!
//! CPython tags releases as "vX.Y.Z" with pre-releases suffixed directly:
//! v3.13.0a1, v3.13.0b2, v3.13.0rc1. Only the 3.x line and later is tracked.

use crate::version::ecosystem::EcosystemRules;
use crate::version::semver::{VersionKey, parse_version};
use crate::version::types::Ecosystem;

/// Oldest major version still tracked
const MIN_MAJOR: u64 = 3;

pub struct PythonRules;

impl EcosystemRules for PythonRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn repository(&self) -> &'static str {
        "python/cpython"
    }

    fn version_from_tag(&self, tag: &str) -> Option<String> {
        tag.strip_prefix('v').map(str::to_string)
    }

    fn parse_version(&self, version: &str) -> Option<VersionKey> {
        parse_version(version).filter(|key| key.major().is_some_and(|major| major >= MIN_MAJOR))
    }
}
