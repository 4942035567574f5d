//! Propagate a CI test matrix into pipeline outputs.
//!
//! The crate reads a JSON matrix document (operating systems, per-language
//! version lists, a deployment branch), optionally refreshes the version lists
//! from upstream release tags, and emits every value as a named output for the
//! pipeline runner.
//!
//! - [`version`]: tag sources, per-ecosystem fetchers, strategy filtering and the version cache
//! - [`matrix`]: the matrix document and the generator that fills it
//! - [`output`]: flattening a document into runner outputs
//! - [`app`]: one invocation, from resolved mode to emitted outputs
//! - [`cli`]: the action-style command line surface

pub mod app;
pub mod cli;
pub mod config;
pub mod json_file;
pub mod logging;
pub mod matrix;
pub mod output;
pub mod version;
