//! Node.js tag rules

use crate::version::ecosystem::EcosystemRules;
use crate::version::types::Ecosystem;

pub struct NodejsRules;

impl EcosystemRules for NodejsRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Nodejs
    }

    fn repository(&self) -> &'static str {
        "nodejs/node"
    }

    fn version_from_tag(&self, tag: &str) -> Option<String> {
        tag.strip_prefix('v').map(str::to_string)
    }
}
