//! Downloading raw logs from the run buckets

use perflog_common::workload::FioWorkload;
use perflog_common::{PerflogError, Result};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Copies a remote log tree to a local directory
pub trait LogFetcher {
    fn fetch(&self, source: &str, destination: &Path) -> Result<()>;
}

/// Fetcher backed by `gcloud storage cp`
#[derive(Debug, Clone)]
pub struct GcloudFetcher {
    program: String,
}

impl Default for GcloudFetcher {
    fn default() -> Self {
        Self {
            program: "gcloud".to_string(),
        }
    }
}

impl GcloudFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogFetcher for GcloudFetcher {
    fn fetch(&self, source: &str, destination: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .args(["-q", "storage", "cp", "-r", "--no-user-output-enabled"])
            .arg(source)
            .arg(destination)
            .status()?;

        if !status.success() {
            return Err(PerflogError::External(format!(
                "{} storage cp {} exited with {}",
                self.program, source, status
            )));
        }
        Ok(())
    }
}

/// Download the fio outputs of every FIO workload into
/// `<logs_dir>/<instance_id>/<file_size>`. Returns how many downloads
/// succeeded; failures are logged and skipped.
pub fn fetch_fio_logs(fetcher: &dyn LogFetcher, workloads: &[FioWorkload], logs_dir: &Path, instance_id: &str) -> usize {
    let mut fetched = 0;

    for workload in workloads {
        let destination = logs_dir.join(instance_id).join(&workload.file_size);
        if let Err(e) = std::fs::create_dir_all(&destination) {
            warn!("Cannot create {}: {}", destination.display(), e);
            continue;
        }

        info!("📥 Downloading FIO outputs from {}...", workload.bucket);
        let source = format!("gs://{}/fio-output/{}/*", workload.bucket, instance_id);
        match fetcher.fetch(&source, &destination) {
            Ok(()) => fetched += 1,
            Err(e) => warn!("Failed to fetch FIO output from {}: {}", source, e),
        }
    }

    fetched
}

/// Download the DLIO logs of every bucket into `logs_dir`, which then holds
/// one `<instance_id>` tree per run.
pub fn fetch_dlio_logs(fetcher: &dyn LogFetcher, buckets: &[&str], logs_dir: &Path, instance_id: &str) -> usize {
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        warn!("Cannot create {}: {}", logs_dir.display(), e);
        return 0;
    }

    let mut fetched = 0;
    for bucket in buckets {
        info!("📥 Downloading DLIO logs from the bucket {}...", bucket);
        let source = format!("gs://{}/logs/{}", bucket, instance_id);
        match fetcher.fetch(&source, logs_dir) {
            Ok(()) => fetched += 1,
            Err(e) => warn!("Failed to fetch DLIO logs from {}: {}", source, e),
        }
    }

    fetched
}
