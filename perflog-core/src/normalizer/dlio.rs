//! DLIO log normalizer
//!
//! A DLIO run directory holds `summary.json`, whose metrics are arrays
//! indexed by epoch, and `per_epoch_stats.json`, keyed by the 1-based epoch
//! number. The directory name is the scenario; the pod hostname carries
//! the workload sizing.

use super::{glob_under, read_json, read_mount_options, Document, Normalizer};
use crate::family::{LogFamily, Normalized, WorkloadKey};
use crate::key::{scenario_from_dir, DlioKey};
use crate::record::{EpochRecord, Metrics, MAX_EPOCH};
use crate::utils::{format_float, iso_to_timestamp, round_to, MIB};
use perflog_common::Result;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "summary.json";
pub const PER_EPOCH_STATS_FILE: &str = "per_epoch_stats.json";

const THROUGHPUT_SAMPLES: &str = "/metric/train_throughput_samples_per_second";

/// The DLIO log family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dlio;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DlioMetrics {
    /// Accelerator utilization, rounded to two decimals
    pub train_au_percentage: f64,
    pub samples_per_sec: u64,
    pub throughput_mb_per_sec: u64,
}

impl Metrics for DlioMetrics {
    fn primary_metric(&self) -> f64 {
        self.throughput_mb_per_sec as f64
    }
}

impl LogFamily for Dlio {
    type Key = DlioKey;
    type Metrics = DlioMetrics;

    const NAME: &'static str = "dlio";

    const HEADER: &'static str = "File Size,File #,Total Size (GB),Batch Size,Scenario,Epoch,Duration (s),\
        GPU Utilization (%),Throughput (sample/s),Throughput (MB/s),Throughput over Local SSD (%),\
        GCSFuse Lowest Memory (MB),GCSFuse Highest Memory (MB),\
        GCSFuse Lowest CPU (core),GCSFuse Highest CPU (core),\
        Pod,Start,End,GcsfuseMountOptions,InstanceID";

    fn key_columns(key: &DlioKey) -> Vec<String> {
        vec![
            key.mean_file_size.to_string(),
            key.num_files_train.to_string(),
            key.total_size_gib().to_string(),
            key.batch_size.to_string(),
        ]
    }

    fn metric_columns(metrics: &DlioMetrics) -> Vec<String> {
        vec![
            format_float(metrics.train_au_percentage),
            metrics.samples_per_sec.to_string(),
            metrics.throughput_mb_per_sec.to_string(),
        ]
    }
}

/// Normalizes DLIO run directories
#[derive(Debug, Default)]
pub struct DlioNormalizer;

impl DlioNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for DlioNormalizer {
    type Family = Dlio;

    fn discover(&self, run_dir: &Path) -> Vec<PathBuf> {
        glob_under(run_dir, &format!("**/{}", SUMMARY_FILE))
            .into_iter()
            .filter_map(|summary| summary.parent().map(Path::to_path_buf))
            .collect()
    }

    fn normalize(&self, input: &Path) -> Result<Vec<Normalized<Dlio>>> {
        let scenario = scenario_from_dir(input)?;

        let summary_path = input.join(SUMMARY_FILE);
        let stats_path = input.join(PER_EPOCH_STATS_FILE);
        let summary_root = read_json(&summary_path)?;
        let stats_root = read_json(&stats_path)?;
        let summary = Document::new(&summary_path, &summary_root);
        let stats = Document::new(&stats_path, &stats_root);

        // every epoch needs a throughput sample, so the array bounds the count
        let epochs = summary.whole("/epochs")?;
        let recorded = summary
            .field(THROUGHPUT_SAMPLES)?
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| summary.malformed(format!("field {} is not an array", THROUGHPUT_SAMPLES)))?;
        if epochs > recorded as u64 {
            return Err(summary.malformed(format!("epochs {} exceeds the {} recorded throughput samples", epochs, recorded)));
        }
        let epochs = u32::try_from(epochs)
            .ok()
            .filter(|&epochs| epochs <= MAX_EPOCH)
            .ok_or_else(|| summary.malformed(format!("epochs {} is above the limit of {}", epochs, MAX_EPOCH)))?;
        let hostname = summary.text("/hostname")?;
        let key = DlioKey::from_hostname(hostname)?;
        let mount_options = read_mount_options(input);

        let mut normalized = Vec::with_capacity(epochs as usize);
        for index in 0..epochs {
            let epoch = index + 1;

            let train_au = summary.number(&format!("/metric/train_au_percentage/{}", index))?;
            let samples_per_sec = summary.whole(&format!("{}/{}", THROUGHPUT_SAMPLES, index))?;
            let throughput_mb_per_sec = (samples_per_sec as f64 * key.mean_file_size as f64 / MIB) as u64;

            let mut record = EpochRecord::new(scenario, epoch);
            record.pod_name = hostname.to_string();
            record.duration_secs = stats.whole(&format!("/{}/duration", epoch))?;
            record.metrics = DlioMetrics {
                train_au_percentage: round_to(train_au, 2),
                samples_per_sec,
                throughput_mb_per_sec,
            };
            record.start = iso_to_timestamp(stats.text(&format!("/{}/start", epoch))?);
            record.end = iso_to_timestamp(stats.text(&format!("/{}/end", epoch))?);
            record.mount_options = mount_options.clone();

            normalized.push(Normalized {
                key: key.clone(),
                record,
            });
        }

        Ok(normalized)
    }
}
