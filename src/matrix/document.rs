//! Matrix document
//!
//! ```json
//! {
//!     "os": ["ubuntu-latest", "windows-latest", "macos-latest"],
//!     "versions": { "python": ["3.12.4", "3.11.9"], "go": ["1.22.1"] },
//!     "ghpages_branch": "ghpages"
//! }
//! ```
//!
//! Only `versions` is ever modified. Every other key, known or not, is kept
//! verbatim and in its original position.

use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use super::MatrixError;
use crate::config::{DEFAULT_GHPAGES_BRANCH, DEFAULT_OS};
use crate::json_file::{self, JsonFileError};
use crate::version::types::Ecosystem;

const OS_KEY: &str = "os";
const VERSIONS_KEY: &str = "versions";
const GHPAGES_BRANCH_KEY: &str = "ghpages_branch";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MatrixDocument {
    root: Map<String, Value>,
}

impl MatrixDocument {
    /// The document used when no matrix file exists yet
    pub fn skeleton() -> Self {
        let mut root = Map::new();
        root.insert(
            OS_KEY.to_string(),
            Value::Array(DEFAULT_OS.iter().map(|os| Value::String(os.to_string())).collect()),
        );
        root.insert(VERSIONS_KEY.to_string(), Value::Object(Map::new()));
        root.insert(
            GHPAGES_BRANCH_KEY.to_string(),
            Value::String(DEFAULT_GHPAGES_BRANCH.to_string()),
        );
        Self { root }
    }

    /// Wraps a parsed JSON value; the top level and `versions` (when present)
    /// must be objects
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(root) = value else {
            return Err("top level must be a JSON object".to_string());
        };
        match root.get(VERSIONS_KEY) {
            None | Some(Value::Object(_)) => Ok(Self { root }),
            Some(_) => Err(format!("\"{}\" must be a JSON object", VERSIONS_KEY)),
        }
    }

    /// Reads a matrix file; `Ok(None)` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>, MatrixError> {
        let value = match json_file::read_json::<Value>(path) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(JsonFileError::Io(source)) => {
                return Err(MatrixError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
            Err(JsonFileError::Json(source)) => {
                return Err(MatrixError::Parse {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::from_value(value)
            .map(Some)
            .map_err(|reason| MatrixError::InvalidDocument {
                path: path.to_path_buf(),
                reason,
            })
    }

    /// Reads a matrix file, falling back to [`MatrixDocument::skeleton`]
    pub fn load_or_skeleton(path: &Path) -> Result<Self, MatrixError> {
        Ok(Self::load(path)?.unwrap_or_else(Self::skeleton))
    }

    /// Writes the document atomically
    pub fn save(&self, path: &Path) -> Result<(), MatrixError> {
        json_file::write_json_atomic(path, self).map_err(|e| MatrixError::Write {
            path: path.to_path_buf(),
            source: match e {
                JsonFileError::Io(source) => source,
                JsonFileError::Json(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            },
        })
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Version list of an ecosystem, `None` when the document has none
    pub fn versions(&self, ecosystem: &str) -> Option<Vec<String>> {
        let list = self.root.get(VERSIONS_KEY)?.get(ecosystem)?.as_array()?;
        Some(
            list.iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }

    /// Replaces an ecosystem's version list, keeping its position
    pub fn set_versions(&mut self, ecosystem: &str, versions: Vec<String>) {
        let list = Value::Array(versions.into_iter().map(Value::String).collect());
        match self.root.get_mut(VERSIONS_KEY) {
            Some(Value::Object(map)) => {
                map.insert(ecosystem.to_string(), list);
            }
            _ => {
                let mut map = Map::new();
                map.insert(ecosystem.to_string(), list);
                self.root.insert(VERSIONS_KEY.to_string(), Value::Object(map));
            }
        }
    }

    /// Empties every version list whose ecosystem is not in `requested`.
    ///
    /// Returns the cleared keys.
    pub fn clear_unrequested(&mut self, requested: &[Ecosystem]) -> Vec<String> {
        let mut cleared = Vec::new();
        if let Some(Value::Object(map)) = self.root.get_mut(VERSIONS_KEY) {
            for (key, value) in map.iter_mut() {
                if !requested.iter().any(|e| e.as_str() == key) {
                    *value = Value::Array(Vec::new());
                    cleared.push(key.clone());
                }
            }
        }
        cleared
    }
}
