//! Storage sidecar resource usage
//!
//! Comparison-scenario records are annotated with the lowest and highest
//! memory and CPU usage of the gcsfuse sidecar container over the epoch's
//! time window. Lookups go through [`UsageSource`]; [`MashUsage`] queries
//! Cloud Monitoring through the `mash` CLI.

use crate::record::{EpochRecord, Metrics, ResourceUsage};
use crate::utils::{round_to, MIB};
use perflog_common::{PerflogError, Result};
use std::process::Command;
use tracing::{debug, warn};

/// Container whose usage is reported
pub const SIDECAR_CONTAINER: &str = "gke-gcsfuse-sidecar";

/// Decimal places kept for CPU cores
const CPU_DECIMALS: i32 = 5;

/// Min/max utilization lookups for one pod over a time window. Timestamps
/// are in the canonical `YYYY-MM-DD HH:MM:SS UTC` format.
pub trait UsageSource {
    /// Lowest and highest memory usage in MiB
    fn memory_window(&self, pod: &str, start: &str, end: &str, project: &str) -> Result<(u64, u64)>;

    /// Lowest and highest CPU usage in cores
    fn cpu_window(&self, pod: &str, start: &str, end: &str, project: &str) -> Result<(f64, f64)>;
}

/// Look up usage for a comparison-scenario record. Baseline records and
/// placeholders are left alone; a failed lookup is logged and its half of
/// the usage stays zero.
pub fn annotate<M: Metrics>(record: &mut EpochRecord<M>, source: &dyn UsageSource, project: &str) {
    if record.scenario.is_baseline() || record.is_placeholder() {
        return;
    }

    let mut usage = ResourceUsage::default();

    match source.memory_window(&record.pod_name, &record.start, &record.end, project) {
        Ok((lowest, highest)) => {
            usage.lowest_memory_mb = lowest;
            usage.highest_memory_mb = highest;
        }
        Err(e) => warn!("Memory lookup failed for {}: {}", record.pod_name, e),
    }

    match source.cpu_window(&record.pod_name, &record.start, &record.end, project) {
        Ok((lowest, highest)) => {
            usage.lowest_cpu_cores = lowest;
            usage.highest_cpu_cores = highest;
        }
        Err(e) => warn!("CPU lookup failed for {}: {}", record.pod_name, e),
    }

    record.usage = Some(usage);
}

/// Usage lookups through the `mash` monitoring CLI
#[derive(Debug, Clone)]
pub struct MashUsage {
    program: String,
    namespace: String,
}

impl Default for MashUsage {
    fn default() -> Self {
        Self {
            program: "mash".to_string(),
            namespace: "cloud_prod".to_string(),
        }
    }
}

impl MashUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `mash` binary can be run at all
    pub fn is_installed(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn query(&self, query: &str) -> Result<String> {
        debug!("Running {} query: {}", self.program, query);
        let output = Command::new(&self.program)
            .arg(format!("--namespace={}", self.namespace))
            .arg("--output=csv")
            .arg(query)
            .output()?;

        if !output.status.success() {
            return Err(PerflogError::External(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl UsageSource for MashUsage {
    fn memory_window(&self, pod: &str, start: &str, end: &str, project: &str) -> Result<(u64, u64)> {
        let csv = self.query(&memory_query(start, end, project))?;
        let (lowest, highest) = min_max(&sidecar_values(&csv, pod));
        Ok(((lowest / MIB) as u64, (highest / MIB) as u64))
    }

    fn cpu_window(&self, pod: &str, start: &str, end: &str, project: &str) -> Result<(f64, f64)> {
        let csv = self.query(&cpu_query(start, end, project))?;
        let (lowest, highest) = min_max(&sidecar_values(&csv, pod));
        Ok((round_to(lowest, CPU_DECIMALS), round_to(highest, CPU_DECIMALS)))
    }
}

fn memory_query(start: &str, end: &str, project: &str) -> String {
    format!(
        "Query(Fetch(Raw('cloud.kubernetes.K8sContainer', 'kubernetes.io/container/memory/used_bytes'), \
         {{'project': '{}', 'metric:memory_type': 'non-evictable'}}) \
         | Window(Align('10m')) | GroupBy(['pod_name', 'container_name'], Max()), \
         TimeInterval('{}', '{}'), '5s')",
        project, start, end
    )
}

fn cpu_query(start: &str, end: &str, project: &str) -> String {
    format!(
        "Query(Fetch(Raw('cloud.kubernetes.K8sContainer', 'kubernetes.io/container/cpu/core_usage_time'), \
         {{'project': '{}'}}) \
         | Window(Rate('10m')) | GroupBy(['pod_name', 'container_name'], Max()), \
         TimeInterval('{}', '{}'), '5s')",
        project, start, end
    )
}

/// Sample values of the sidecar container of `pod` from mash CSV output.
/// Columns 4 and 5 hold the pod and container name, samples start at 7.
pub(crate) fn sidecar_values(csv: &str, pod: &str) -> Vec<f64> {
    csv.lines()
        .map(|line| line.split(',').map(str::trim).collect::<Vec<_>>())
        .filter(|fields| fields.len() > 7 && fields[4] == pod && fields[5] == SIDECAR_CONTAINER)
        .flat_map(|fields| {
            fields[7..]
                .iter()
                .filter_map(|value| value.parse::<f64>().ok())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
