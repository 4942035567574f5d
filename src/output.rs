//! Step outputs for the pipeline runner
//!
//! A JSON document is flattened into `NAME=value` pairs:
//! - object keys are upper-cased and joined with `_` (`versions.python` → `VERSIONS_PYTHON`)
//! - an array is emitted whole as compact JSON under its own name, then each
//!   element under `NAME_<index>`
//! - strings are emitted unquoted, other scalars as JSON
//!
//! The pairs are appended to the file named by `GITHUB_OUTPUT`, or printed to
//! stdout when running outside a pipeline.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::Formatter;
use thiserror::Error;
use tracing::{debug, info, warn};

const HEREDOC_DELIMITER: &str = "JSON2VARS_EOF";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write outputs to {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to print outputs: {0}")]
    Stdout(#[source] io::Error),

    #[error("Failed to render output value: {0}")]
    Render(#[from] serde_json::Error),
}

/// Compact JSON with `", "` and `": "` separators, the layout workflow
/// expressions such as `fromJSON` have always been fed
struct SpacedCompactFormatter;

impl Formatter for SpacedCompactFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn to_spaced_json(value: &Value) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedCompactFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Flatten a JSON value into output pairs, in document order
pub fn flatten(value: &Value) -> Result<Vec<(String, String)>, OutputError> {
    let mut pairs = Vec::new();
    flatten_into(value, "", &mut pairs)?;
    Ok(pairs)
}

fn flatten_into(value: &Value, name: &str, pairs: &mut Vec<(String, String)>) -> Result<(), OutputError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, &join_name(name, &key.to_uppercase()), pairs)?;
            }
        }
        Value::Array(items) => {
            pairs.push((name.to_string(), to_spaced_json(value)?));
            for (index, item) in items.iter().enumerate() {
                flatten_into(item, &join_name(name, &index.to_string()), pairs)?;
            }
        }
        Value::String(s) => pairs.push((name.to_string(), s.clone())),
        other => pairs.push((name.to_string(), other.to_string())),
    }
    Ok(())
}

fn join_name(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}_{}", prefix, segment)
    }
}

/// Write pairs in the runner's output file syntax.
///
/// Single-line values are written as `NAME=value`; values containing a line
/// break use the `NAME<<DELIMITER` heredoc form.
pub fn write_pairs<W: Write>(writer: &mut W, pairs: &[(String, String)]) -> io::Result<()> {
    for (name, value) in pairs {
        if value.contains('\n') || value.contains('\r') {
            let delimiter = heredoc_delimiter(value);
            writeln!(writer, "{}<<{}", name, delimiter)?;
            writeln!(writer, "{}", value)?;
            writeln!(writer, "{}", delimiter)?;
        } else {
            writeln!(writer, "{}={}", name, value)?;
        }
    }
    Ok(())
}

fn heredoc_delimiter(value: &str) -> String {
    let mut delimiter = HEREDOC_DELIMITER.to_string();
    let mut suffix = 0;
    while value.lines().any(|line| line == delimiter) {
        suffix += 1;
        delimiter = format!("{}_{}", HEREDOC_DELIMITER, suffix);
    }
    delimiter
}

/// Append pairs to the runner output file, or print them when there is none
pub fn emit(pairs: &[(String, String)], output_file: Option<&Path>) -> Result<(), OutputError> {
    match output_file {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| OutputError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            write_pairs(&mut file, pairs).map_err(|source| OutputError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Wrote {} outputs to {:?}", pairs.len(), path);
        }
        None => {
            warn!("GITHUB_OUTPUT is not set, printing outputs to stdout");
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_pairs(&mut lock, pairs).map_err(OutputError::Stdout)?;
        }
    }
    for (name, value) in pairs {
        debug!("{}={}", name, value);
    }
    Ok(())
}
