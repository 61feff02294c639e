//! Workload descriptors parsed from the test-run configuration file.
//!
//! The same configuration drives the benchmark deployment; perflog only
//! needs enough of it to know which buckets hold the logs of a run.

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// An FIO workload: one fio job file run per read type and scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FioWorkload {
    pub file_size: String,
    pub files_per_thread: u64,
    pub num_threads: u64,
    pub block_size: String,
    pub read_types: Vec<String>,
    pub bucket: String,
    pub mount_options: String,
}

/// A DLIO workload: one training run per batch size and scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DlioWorkload {
    pub num_files_train: u64,
    pub record_length: u64,
    pub batch_sizes: Vec<u64>,
    pub bucket: String,
    pub mount_options: String,
}

/// De-duplicated workloads of one configuration file, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadSet {
    pub fio: Vec<FioWorkload>,
    pub dlio: Vec<DlioWorkload>,
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(rename = "TestConfig")]
    test_config: TestConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestConfig {
    workload_config: WorkloadConfig,
}

#[derive(Deserialize)]
struct WorkloadConfig {
    #[serde(default)]
    workloads: Vec<RawWorkload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWorkload {
    #[serde(default)]
    bucket: String,
    #[serde(default)]
    gcsfuse_mount_options: String,
    fio_workload: Option<RawFio>,
    dlio_workload: Option<RawDlio>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFio {
    file_size: String,
    files_per_thread: u64,
    num_threads: u64,
    block_size: String,
    #[serde(default = "default_read_types")]
    read_types: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDlio {
    num_files_train: u64,
    record_length: u64,
    batch_sizes: Vec<u64>,
}

fn default_read_types() -> Vec<String> {
    vec!["read".to_string(), "randread".to_string()]
}

impl WorkloadSet {
    /// Parse a workload configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse workload configuration JSON, skipping invalid entries
    pub fn from_json(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(content)?;
        let mut set = WorkloadSet::default();

        for (index, raw) in file.test_config.workload_config.workloads.into_iter().enumerate() {
            if raw.bucket.is_empty() {
                warn!("workload #{} has no bucket, skipping it", index);
                continue;
            }

            match (raw.fio_workload, raw.dlio_workload) {
                (Some(fio), None) => {
                    let workload = FioWorkload {
                        file_size: fio.file_size,
                        files_per_thread: fio.files_per_thread,
                        num_threads: fio.num_threads,
                        block_size: fio.block_size,
                        read_types: fio.read_types,
                        bucket: raw.bucket,
                        mount_options: raw.gcsfuse_mount_options,
                    };
                    if !set.fio.contains(&workload) {
                        set.fio.push(workload);
                    }
                }
                (None, Some(dlio)) => {
                    let workload = DlioWorkload {
                        num_files_train: dlio.num_files_train,
                        record_length: dlio.record_length,
                        batch_sizes: dlio.batch_sizes,
                        bucket: raw.bucket,
                        mount_options: raw.gcsfuse_mount_options,
                    };
                    if !set.dlio.contains(&workload) {
                        set.dlio.push(workload);
                    }
                }
                (Some(_), Some(_)) => {
                    warn!("workload #{} defines both fioWorkload and dlioWorkload, skipping it", index);
                }
                (None, None) => {
                    warn!("workload #{} defines neither fioWorkload nor dlioWorkload, skipping it", index);
                }
            }
        }

        Ok(set)
    }

    /// Distinct buckets of the DLIO workloads
    pub fn dlio_buckets(&self) -> Vec<&str> {
        let mut buckets: Vec<&str> = Vec::new();
        for workload in &self.dlio {
            if !buckets.contains(&workload.bucket.as_str()) {
                buckets.push(&workload.bucket);
            }
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PerflogError;

    const CONFIG: &str = r#"{
      "TestConfig": {
        "workloadConfig": {
          "workloads": [
            {
              "bucket": "fio-64k",
              "gcsfuseMountOptions": "implicit-dirs",
              "fioWorkload": {
                "fileSize": "64K",
                "filesPerThread": 20000,
                "numThreads": 50,
                "blockSize": "64K"
              }
            },
            {
              "bucket": "fio-64k",
              "gcsfuseMountOptions": "implicit-dirs",
              "fioWorkload": {
                "fileSize": "64K",
                "filesPerThread": 20000,
                "numThreads": 50,
                "blockSize": "64K"
              }
            },
            {
              "bucket": "dlio-100k",
              "dlioWorkload": {
                "numFilesTrain": 500000,
                "recordLength": 102400,
                "batchSizes": [800, 128]
              }
            },
            {
              "bucket": "dlio-100k",
              "dlioWorkload": {
                "numFilesTrain": 1000,
                "recordLength": 102400,
                "batchSizes": [800]
              }
            },
            {
              "bucket": "ambiguous",
              "fioWorkload": {
                "fileSize": "1M", "filesPerThread": 1, "numThreads": 1, "blockSize": "1M"
              },
              "dlioWorkload": { "numFilesTrain": 1, "recordLength": 1, "batchSizes": [1] }
            },
            { "bucket": "", "dlioWorkload": { "numFilesTrain": 1, "recordLength": 1, "batchSizes": [1] } }
          ]
        }
      }
    }"#;

    #[test]
    fn test_workloads_are_split_and_deduplicated() {
        let set = WorkloadSet::from_json(CONFIG).unwrap();

        assert_eq!(set.fio.len(), 1);
        assert_eq!(set.fio[0].file_size, "64K");
        assert_eq!(set.fio[0].read_types, vec!["read", "randread"]);
        assert_eq!(set.fio[0].mount_options, "implicit-dirs");

        assert_eq!(set.dlio.len(), 2);
        assert_eq!(set.dlio[0].batch_sizes, vec![800, 128]);
        assert_eq!(set.dlio_buckets(), vec!["dlio-100k"]);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(matches!(
            WorkloadSet::from_json("{\"TestConfig\": {}}"),
            Err(PerflogError::Json(_))
        ));
    }
}
