//! Go tag rules
//!
//! Go tags releases as "goX.Y.Z". Releases before 1.21 dropped the trailing
//! ".0" (go1.20), and pre-releases hang off the minor version (go1.23rc1).
//! The repository also carries weekly.* and release.* tags from the pre-1.0
//! era, which are ignored.

use crate::version::ecosystem::EcosystemRules;
use crate::version::types::Ecosystem;

pub struct GoRules;

impl EcosystemRules for GoRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn repository(&self) -> &'static str {
        "golang/go"
    }

    fn version_from_tag(&self, tag: &str) -> Option<String> {
        tag.strip_prefix("go")
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            .map(str::to_string)
    }
}
