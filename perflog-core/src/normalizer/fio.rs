//! FIO log normalizer
//!
//! One fio JSON report per (scenario, read type, epoch). Sizing comes from
//! the directory layout (see [`FioLocation`]), block size and concurrency
//! from the report's job options.

use super::{glob_under, read_json, read_mount_options, Document, Normalizer};
use crate::family::{LogFamily, Normalized, WorkloadKey};
use crate::key::{FioKey, FioLocation};
use crate::record::{EpochRecord, Metrics};
use crate::utils::{unix_millis_to_timestamp, MIB};
use perflog_common::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The FIO log family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fio;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FioMetrics {
    pub iops: u64,
    pub throughput_mb_per_sec: u64,
    pub block_size: String,
    pub files_per_thread: u64,
    pub num_threads: u64,
}

impl Metrics for FioMetrics {
    fn primary_metric(&self) -> f64 {
        self.throughput_mb_per_sec as f64
    }
}

impl LogFamily for Fio {
    type Key = FioKey;
    type Metrics = FioMetrics;

    const NAME: &'static str = "fio";

    const HEADER: &'static str = "File Size,Read Type,Total Size (GB),Scenario,Epoch,Duration (s),\
        Throughput (MB/s),IOPS,Throughput over Local SSD (%),\
        GCSFuse Lowest Memory (MB),GCSFuse Highest Memory (MB),\
        GCSFuse Lowest CPU (core),GCSFuse Highest CPU (core),\
        Pod,Start,End,GcsfuseMountOptions,BlockSize,FilesPerThread,NumThreads,InstanceID";

    fn key_columns(key: &FioKey) -> Vec<String> {
        vec![
            key.file_size.clone(),
            key.read_type.clone(),
            key.total_size_gib().to_string(),
        ]
    }

    fn metric_columns(metrics: &FioMetrics) -> Vec<String> {
        vec![
            metrics.throughput_mb_per_sec.to_string(),
            metrics.iops.to_string(),
        ]
    }

    fn trailing_columns(metrics: &FioMetrics) -> Vec<String> {
        vec![
            metrics.block_size.clone(),
            metrics.files_per_thread.to_string(),
            metrics.num_threads.to_string(),
        ]
    }
}

/// Normalizes the fio reports of one test run
pub struct FioNormalizer {
    instance_id: String,
}

impl FioNormalizer {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }
}

impl Normalizer for FioNormalizer {
    type Family = Fio;

    fn discover(&self, run_dir: &Path) -> Vec<PathBuf> {
        glob_under(run_dir, "**/*")
            .into_iter()
            .filter(|path| path.is_file())
            .filter(|path| {
                let is_json = path.extension().is_some_and(|ext| ext == "json");
                if !is_json {
                    debug!("Ignoring {} as it is not a json file", path.display());
                }
                is_json
            })
            .collect()
    }

    fn normalize(&self, input: &Path) -> Result<Vec<Normalized<Fio>>> {
        let location = FioLocation::from_path(input)?;
        let root = read_json(input)?;
        let doc = Document::new(input, &root);

        let has_jobs = doc
            .field("/jobs")?
            .as_array()
            .is_some_and(|jobs| !jobs.is_empty());
        if !has_jobs {
            return Err(doc.malformed("no jobs in report"));
        }

        let block_size = doc.text("/jobs/0/job options/bs")?.to_string();
        let files_per_thread = doc.whole("/global options/nrfiles")?;
        let num_threads = doc.whole("/global options/numjobs")?;

        let duration_secs = doc.whole("/jobs/0/read/runtime")? / 1000;
        let iops = doc.whole("/jobs/0/read/iops")?;
        let throughput_mb_per_sec = (doc.whole("/jobs/0/read/bw_bytes")? as f64 / MIB) as u64;

        let job_start = doc.number("/jobs/0/job_start")?;
        let start = unix_millis_to_timestamp(job_start as i64)
            .ok_or_else(|| doc.malformed(format!("job_start {} is out of range", job_start)))?;
        let finished = doc.number("/timestamp_ms")?;
        let end = unix_millis_to_timestamp(finished as i64)
            .ok_or_else(|| doc.malformed(format!("timestamp_ms {} is out of range", finished)))?;

        let pod_name = format!(
            "fio-tester-{}-{}-{}-{}-{}-{}-{}",
            self.instance_id,
            location.scenario,
            location.read_type,
            location.file_size.to_lowercase(),
            block_size.to_lowercase(),
            num_threads,
            files_per_thread,
        );

        let mount_options = input.parent().map(read_mount_options).unwrap_or_default();

        let key = FioKey {
            read_type: location.read_type,
            file_size: location.file_size,
            block_size: block_size.clone(),
            num_threads,
            files_per_thread,
        };

        let mut record = EpochRecord::new(location.scenario, location.epoch);
        record.pod_name = pod_name;
        record.duration_secs = duration_secs;
        record.metrics = FioMetrics {
            iops,
            throughput_mb_per_sec,
            block_size,
            files_per_thread,
            num_threads,
        };
        record.start = start;
        record.end = end;
        record.mount_options = mount_options;

        Ok(vec![Normalized { key, record }])
    }
}
