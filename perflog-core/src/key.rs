//! Workload key construction.
//!
//! Raw logs identify their workload only through where they were written
//! (path segments) and what host wrote them (hostname). These functions are
//! the single place that knows which segment means what.

use crate::family::WorkloadKey;
use crate::record::MAX_EPOCH;
use crate::utils::{parse_size, GIB};
use perflog_common::{PerflogError, Result, Scenario};
use std::fmt;
use std::path::Path;

/// Identity of an FIO workload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FioKey {
    pub read_type: String,
    pub file_size: String,
    pub block_size: String,
    pub num_threads: u64,
    pub files_per_thread: u64,
}

impl fmt::Display for FioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.read_type, self.file_size, self.block_size, self.num_threads, self.files_per_thread
        )
    }
}

impl WorkloadKey for FioKey {
    fn total_size_gib(&self) -> u64 {
        let Some(file_size) = parse_size(&self.file_size) else {
            return 0;
        };
        let total = file_size as f64 * self.files_per_thread as f64 * self.num_threads as f64;
        (total / GIB) as u64
    }
}

/// Where an FIO epoch log sits in the downloaded tree.
///
/// Layout, counting directories upward from the file:
///
/// ```text
/// <file_size>/<ignored>/<scenario>/<read_type>/<stem ending in epoch>.json
///     [-4]       [-3]      [-2]        [-1]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FioLocation {
    pub file_size: String,
    pub scenario: Scenario,
    pub read_type: String,
    pub epoch: u32,
}

impl FioLocation {
    pub fn from_path(path: &Path) -> Result<Self> {
        let dirs: Vec<&str> = path
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect()
            })
            .unwrap_or_default();

        if dirs.len() < 4 {
            return Err(PerflogError::InvalidKey(format!(
                "{} is not nested <file_size>/<dir>/<scenario>/<read_type>/",
                path.display()
            )));
        }

        let segment = |from_end: usize| dirs[dirs.len() - from_end];
        let scenario = segment(2).parse::<Scenario>()?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PerflogError::InvalidKey(format!("{} has no file name", path.display())))?;

        Ok(Self {
            file_size: segment(4).to_string(),
            scenario,
            read_type: segment(1).to_string(),
            epoch: epoch_from_stem(stem)?,
        })
    }
}

/// Extract the epoch number from the trailing digits of a file stem,
/// e.g. `epoch3` -> 3. Epochs above [`MAX_EPOCH`] are rejected.
pub fn epoch_from_stem(stem: &str) -> Result<u32> {
    let digits_start = stem
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    let digits = &stem[digits_start..];

    match digits.parse::<u32>() {
        Ok(epoch) if epoch > MAX_EPOCH => Err(PerflogError::InvalidKey(format!(
            "file stem {:?} names epoch {}, above the limit of {}",
            stem, epoch, MAX_EPOCH
        ))),
        Ok(epoch) if epoch > 0 => Ok(epoch),
        _ => Err(PerflogError::InvalidKey(format!(
            "file stem {:?} does not end in a positive epoch number",
            stem
        ))),
    }
}

/// Identity of a DLIO workload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DlioKey {
    pub num_files_train: u64,
    pub mean_file_size: u64,
    pub batch_size: u64,
}

impl DlioKey {
    /// Build the key from a DLIO pod hostname of the form
    /// `<name>-<name>-<num_files_train>-<mean_file_size>-<batch_size>`;
    /// the last three dash-separated fields must be integers.
    pub fn from_hostname(hostname: &str) -> Result<Self> {
        let parts: Vec<&str> = hostname.split('-').collect();
        if parts.len() < 5 {
            return Err(PerflogError::InvalidKey(format!(
                "hostname {:?} has fewer than five dash-separated fields",
                hostname
            )));
        }

        let field = |from_end: usize, name: &str| -> Result<u64> {
            let raw = parts[parts.len() - from_end];
            raw.parse().map_err(|_| {
                PerflogError::InvalidKey(format!("hostname {:?}: {} {:?} is not an integer", hostname, name, raw))
            })
        };

        Ok(Self {
            num_files_train: field(3, "num_files_train")?,
            mean_file_size: field(2, "mean_file_size")?,
            batch_size: field(1, "batch_size")?,
        })
    }
}

impl fmt::Display for DlioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.num_files_train, self.mean_file_size, self.batch_size)
    }
}

impl WorkloadKey for DlioKey {
    fn total_size_gib(&self) -> u64 {
        (self.mean_file_size as f64 * self.num_files_train as f64 / GIB) as u64
    }
}

/// Scenario of a DLIO run directory: the directory's own name.
pub fn scenario_from_dir(dir: &Path) -> Result<Scenario> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PerflogError::InvalidKey(format!("{} has no directory name", dir.display())))?;
    name.parse()
}
