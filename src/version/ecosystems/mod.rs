//! Ecosystem-specific tag rules

pub mod go;
pub mod nodejs;
pub mod python;
pub mod ruby;
pub mod rust;

pub use go::GoRules;
pub use nodejs::NodejsRules;
pub use python::PythonRules;
pub use ruby::RubyRules;
pub use rust::RustRules;

use crate::version::ecosystem::EcosystemRules;
use crate::version::types::Ecosystem;

/// Returns the tag rules for an ecosystem
pub fn rules_for(ecosystem: Ecosystem) -> &'static dyn EcosystemRules {
    match ecosystem {
        Ecosystem::Python => &PythonRules,
        Ecosystem::Nodejs => &NodejsRules,
        Ecosystem::Ruby => &RubyRules,
        Ecosystem::Go => &GoRules,
        Ecosystem::Rust => &RustRules,
    }
}
