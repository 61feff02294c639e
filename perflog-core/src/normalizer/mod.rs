//! Log normalizers
//!
//! A normalizer turns one raw input (a file or a run directory, depending on
//! the family) into canonical records. Inputs are all-or-nothing: any missing
//! or malformed required field rejects the whole input.

pub mod dlio;
pub mod fio;

use crate::family::{LogFamily, Normalized};
use perflog_common::{PerflogError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use dlio::{Dlio, DlioMetrics, DlioNormalizer};
pub use fio::{Fio, FioMetrics, FioNormalizer};

/// Name of the optional sidecar holding the mount options of a run
pub const MOUNT_OPTIONS_FILE: &str = "gcsfuse_mount_options";

/// Parses one family of raw logs
pub trait Normalizer {
    type Family: LogFamily;

    /// Find every input under a run directory
    fn discover(&self, run_dir: &Path) -> Vec<PathBuf>;

    /// Normalize a single input into zero or more records
    fn normalize(&self, input: &Path) -> Result<Vec<Normalized<Self::Family>>>;
}

/// Expand a glob pattern rooted at `dir`, returning matches in path order.
pub(crate) fn glob_under(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join(pattern);
    let mut matches = Vec::new();

    match glob::glob(&full.to_string_lossy()) {
        Ok(paths) => {
            for entry in paths {
                match entry {
                    Ok(path) => matches.push(path),
                    Err(e) => warn!("Cannot read {}: {}", e.path().display(), e.error()),
                }
            }
        }
        Err(e) => warn!("Invalid search pattern {}: {}", full.display(), e),
    }

    matches
}

/// Read the mount options sidecar next to a log, or an empty string.
pub fn read_mount_options(dir: &Path) -> String {
    let sidecar = dir.join(MOUNT_OPTIONS_FILE);
    match std::fs::read_to_string(&sidecar) {
        Ok(content) => content.trim().to_string(),
        Err(_) => {
            debug!("No mount options at {}", sidecar.display());
            String::new()
        }
    }
}

/// Read and parse a JSON document
pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| PerflogError::malformed(path, format!("invalid JSON: {}", e)))
}

/// Typed access to required fields of a JSON document, with errors that
/// name the document and the missing field.
pub(crate) struct Document<'a> {
    path: &'a Path,
    root: &'a Value,
}

impl<'a> Document<'a> {
    pub(crate) fn new(path: &'a Path, root: &'a Value) -> Self {
        Self { path, root }
    }

    /// Look up a field by JSON pointer (`/jobs/0/read/iops`)
    pub(crate) fn field(&self, pointer: &str) -> Result<&'a Value> {
        self.root
            .pointer(pointer)
            .ok_or_else(|| PerflogError::malformed(self.path, format!("missing field {}", pointer)))
    }

    pub(crate) fn text(&self, pointer: &str) -> Result<&'a str> {
        self.field(pointer)?
            .as_str()
            .ok_or_else(|| PerflogError::malformed(self.path, format!("field {} is not a string", pointer)))
    }

    /// A finite number, given either as a JSON number or a numeric string
    pub(crate) fn number(&self, pointer: &str) -> Result<f64> {
        let value = self.field(pointer)?;
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match number {
            Some(n) if n.is_finite() => Ok(n),
            _ => Err(PerflogError::malformed(
                self.path,
                format!("field {} is not a number: {}", pointer, value),
            )),
        }
    }

    /// A non-negative number truncated toward zero
    pub(crate) fn whole(&self, pointer: &str) -> Result<u64> {
        let number = self.number(pointer)?;
        if number < 0.0 {
            return Err(PerflogError::malformed(
                self.path,
                format!("field {} is negative: {}", pointer, number),
            ));
        }
        Ok(number.trunc() as u64)
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> PerflogError {
        PerflogError::malformed(self.path, reason)
    }
}
