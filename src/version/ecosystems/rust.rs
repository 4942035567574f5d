//! Rust tag rules
//!
//! Rust tags releases with the bare version ("1.80.0"). Matrix documents may
//! also carry the channel token "stable", which tracks whatever the upstream
//! stable channel points at; it is always stable and ranks above every
//! numbered release.

use crate::version::ecosystem::EcosystemRules;
use crate::version::semver::{VersionKey, parse_version};
use crate::version::types::Ecosystem;

/// Channel token that always tracks the upstream stable release
pub const STABLE_CHANNEL: &str = "stable";

pub struct RustRules;

impl EcosystemRules for RustRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn repository(&self) -> &'static str {
        "rust-lang/rust"
    }

    fn version_from_tag(&self, tag: &str) -> Option<String> {
        if tag.starts_with(|c: char| c.is_ascii_digit()) || tag == STABLE_CHANNEL {
            Some(tag.to_string())
        } else {
            None
        }
    }

    fn parse_version(&self, version: &str) -> Option<VersionKey> {
        if version == STABLE_CHANNEL {
            return Some(VersionKey::Channel(STABLE_CHANNEL.to_string()));
        }
        parse_version(version)
    }
}
