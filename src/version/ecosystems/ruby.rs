//! Ruby tag rules
//!
//! Ruby separates version components with underscores: v3_4_0,
//! v3_4_0_preview1, v3_3_0_rc1. Versions are written back dotted, with the
//! pre-release suffix joined by a dash (3.4.0-preview1).

use crate::version::ecosystem::EcosystemRules;
use crate::version::types::Ecosystem;

pub struct RubyRules;

impl EcosystemRules for RubyRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Ruby
    }

    fn repository(&self) -> &'static str {
        "ruby/ruby"
    }

    fn version_from_tag(&self, tag: &str) -> Option<String> {
        let body = tag.strip_prefix('v')?;
        let mut parts = body.split('_');
        let mut numbers = Vec::new();
        let mut suffix = None;

        for part in parts.by_ref() {
            if !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()) {
                numbers.push(part);
            } else {
                suffix = Some(part);
                break;
            }
        }

        // Anything after the suffix (v2_6_0_preview1_extra) is not a release tag
        if numbers.is_empty() || parts.next().is_some() {
            return None;
        }

        let mut version = numbers.join(".");
        if let Some(suffix) = suffix {
            version.push('-');
            version.push_str(suffix);
        }
        Some(version)
    }
}
