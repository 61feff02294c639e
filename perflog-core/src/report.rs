//! Report emission
//!
//! Writes correlated groups as comma-separated rows: groups in first-seen
//! order, scenarios in report order, one row per epoch slot.

use crate::family::LogFamily;
use crate::grouper::WorkloadGroups;
use crate::record::{EpochRecord, Relative, ResourceUsage};
use crate::utils::{format_float, quote};
use perflog_common::config::HeaderPolicy;
use perflog_common::Result;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Relative throughput printed for baseline rows
const BASELINE_RELATIVE: &str = "100.0";

/// Output table opened for appending
pub struct ReportOutput {
    writer: BufWriter<File>,
    write_header: bool,
}

impl ReportOutput {
    /// Open (or create) the output table in append mode. Whether a header is
    /// written depends on `policy` and on the file being empty.
    pub fn open(path: &Path, policy: HeaderPolicy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let write_header = match policy {
            HeaderPolicy::Always => true,
            HeaderPolicy::WhenEmpty => file.metadata()?.len() == 0,
        };
        debug!("Opened {} (header: {})", path.display(), write_header);

        Ok(Self {
            writer: BufWriter::new(file),
            write_header,
        })
    }

    /// Emit all groups and flush. Returns the number of data rows written.
    pub fn emit<F: LogFamily>(mut self, groups: &WorkloadGroups<F>, instance_id: &str) -> Result<usize> {
        let rows = write_rows(&mut self.writer, groups, instance_id, self.write_header)?;
        self.writer.flush()?;
        info!("Wrote {} {} rows", rows, F::NAME);
        Ok(rows)
    }
}

/// Write the header (if requested) and one row per epoch slot of every
/// sequence that holds at least one observed record.
pub fn write_rows<F: LogFamily, W: Write>(
    out: &mut W,
    groups: &WorkloadGroups<F>,
    instance_id: &str,
    write_header: bool,
) -> Result<usize> {
    if write_header {
        writeln!(out, "{}", F::HEADER)?;
    }

    let mut rows = 0;
    for group in groups.iter() {
        let key_columns = F::key_columns(group.key());

        for scenario in group.scenarios() {
            let sequence = group.sequence(scenario);
            if sequence.iter().all(EpochRecord::is_placeholder) {
                continue;
            }

            for record in sequence {
                writeln!(out, "{}", format_row::<F>(&key_columns, record, instance_id))?;
                rows += 1;
            }
        }
    }

    Ok(rows)
}

fn format_row<F: LogFamily>(key_columns: &[String], record: &EpochRecord<F::Metrics>, instance_id: &str) -> String {
    let mut columns = key_columns.to_vec();
    columns.push(record.scenario.to_string());
    columns.push(record.epoch.to_string());
    columns.push(record.duration_secs.to_string());
    columns.extend(F::metric_columns(&record.metrics));
    columns.push(relative_column(record));
    columns.extend(usage_columns(record.usage.unwrap_or_default()));
    columns.push(record.pod_name.clone());
    columns.push(record.start.clone());
    columns.push(record.end.clone());
    columns.push(quote(&record.mount_options));
    columns.extend(F::trailing_columns(&record.metrics));
    columns.push(instance_id.to_string());
    columns.join(",")
}

fn relative_column<M>(record: &EpochRecord<M>) -> String {
    if record.scenario.is_baseline() {
        return BASELINE_RELATIVE.to_string();
    }
    match record.relative_to_baseline {
        Relative::NotComputed => String::new(),
        Relative::Percent(percent) => format_float(percent),
        Relative::Unavailable => "NA".to_string(),
    }
}

fn usage_columns(usage: ResourceUsage) -> [String; 4] {
    [
        usage.lowest_memory_mb.to_string(),
        usage.highest_memory_mb.to_string(),
        format_float(usage.lowest_cpu_cores),
        format_float(usage.highest_cpu_cores),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlator::correlate;
    use crate::family::Normalized;
    use crate::key::FioKey;
    use crate::normalizer::{Fio, FioMetrics};
    use perflog_common::Scenario;
    use tempfile::tempdir;

    fn key() -> FioKey {
        FioKey {
            read_type: "read".to_string(),
            file_size: "1M".to_string(),
            block_size: "256K".to_string(),
            num_threads: 64,
            files_per_thread: 1024,
        }
    }

    fn ingest(groups: &mut WorkloadGroups<Fio>, scenario: Scenario, epoch: u32, mb: u64) {
        let mut record = EpochRecord::new(scenario, epoch);
        record.pod_name = format!("pod-{}", scenario);
        record.duration_secs = 60;
        record.start = "2024-08-21 20:49:38 UTC".to_string();
        record.end = "2024-08-21 20:50:38 UTC".to_string();
        record.mount_options = "implicit-dirs,max-conns=10".to_string();
        record.metrics = FioMetrics {
            iops: mb * 4,
            throughput_mb_per_sec: mb,
            block_size: "256K".to_string(),
            files_per_thread: 1024,
            num_threads: 64,
        };
        groups.ingest(Normalized { key: key(), record }).unwrap();
    }

    fn render(groups: &WorkloadGroups<Fio>, write_header: bool) -> Vec<String> {
        let mut out = Vec::new();
        write_rows(&mut out, groups, "run-7", write_header).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_row_layout() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::LocalSsd, 1, 500);
        ingest(&mut groups, Scenario::GcsfuseGeneric, 1, 400);
        correlate(&mut groups);

        let lines = render(&groups, true);
        assert_eq!(lines[0], Fio::HEADER);
        assert_eq!(
            lines[1],
            "1M,read,64,local-ssd,1,60,500,2000,100.0,0,0,0.0,0.0,pod-local-ssd,\
             2024-08-21 20:49:38 UTC,2024-08-21 20:50:38 UTC,\"implicit-dirs,max-conns=10\",256K,1024,64,run-7"
        );
        assert!(lines[2].starts_with("1M,read,64,gcsfuse-generic,1,60,400,1600,80.0,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_column_count_matches_header() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::GcsfuseFileCache, 2, 10);
        correlate(&mut groups);

        let lines = render(&groups, true);
        let header_columns = Fio::HEADER.split(',').count();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].split(',').count(), header_columns);
        // one extra field from the comma inside the quoted mount options
        assert_eq!(lines[2].split(',').count(), header_columns + 1);
    }

    #[test]
    fn test_placeholder_and_unavailable_rows() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::GcsfuseNoFileCache, 1, 100);
        ingest(&mut groups, Scenario::GcsfuseNoFileCache, 3, 100);
        correlate(&mut groups);

        let lines = render(&groups, false);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1M,read,64,gcsfuse-no-file-cache,2,0,0,0,NA,0,0,0.0,0.0,,,,\"\","));
        assert!(lines.iter().all(|l| l.contains(",NA,")));
    }

    #[test]
    fn test_rows_follow_report_order() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::GcsfuseFileCache, 1, 300);
        ingest(&mut groups, Scenario::GcsfuseGeneric, 1, 400);
        ingest(&mut groups, Scenario::LocalSsd, 1, 500);
        correlate(&mut groups);

        let scenarios: Vec<String> = render(&groups, false)
            .iter()
            .map(|line| line.split(',').nth(3).unwrap().to_string())
            .collect();
        assert_eq!(scenarios, vec!["local-ssd", "gcsfuse-generic", "gcsfuse-file-cache"]);
    }

    #[test]
    fn test_uncorrelated_rows_leave_relative_empty() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::GcsfuseGeneric, 1, 100);

        let lines = render(&groups, false);
        assert!(lines[0].starts_with("1M,read,64,gcsfuse-generic,1,60,100,400,,0,0,"));
    }

    #[test]
    fn test_usage_columns() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::GcsfuseGeneric, 1, 100);
        groups.iter_mut().for_each(|group| {
            if let Some((_, sequence)) = group.baseline_and(Scenario::GcsfuseGeneric) {
                sequence[0].usage = Some(ResourceUsage {
                    lowest_memory_mb: 120,
                    highest_memory_mb: 512,
                    lowest_cpu_cores: 0.25,
                    highest_cpu_cores: 3.0,
                });
            }
        });

        let lines = render(&groups, false);
        assert!(lines[0].contains(",120,512,0.25,3.0,pod-gcsfuse-generic,"));
    }

    #[test]
    fn test_header_policy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output.csv");
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::LocalSsd, 1, 500);

        for _ in 0..2 {
            let output = ReportOutput::open(&path, HeaderPolicy::WhenEmpty).unwrap();
            assert_eq!(output.emit(&groups, "run-7").unwrap(), 1);
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(Fio::HEADER).count(), 1);
        assert_eq!(content.lines().count(), 3);

        let output = ReportOutput::open(&path, HeaderPolicy::Always).unwrap();
        output.emit(&groups, "run-7").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(Fio::HEADER).count(), 2);
    }
}
