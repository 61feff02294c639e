//! Stage orchestration: discover, normalize, group, correlate, emit.
//!
//! Every stage receives the accumulator explicitly. Per-input failures are
//! logged and skipped so one bad log never aborts a report.

use crate::correlator::correlate;
use crate::family::LogFamily;
use crate::grouper::WorkloadGroups;
use crate::normalizer::Normalizer;
use crate::report::ReportOutput;
use crate::usage::{annotate, UsageSource};
use perflog_common::Result;
use std::path::Path;
use tracing::{debug, info, warn};

/// Where usage lookups go, if anywhere
#[derive(Clone, Copy)]
pub struct UsageLookup<'a> {
    pub source: &'a dyn UsageSource,
    pub project: &'a str,
}

/// Normalize every input found under `run_dir` and group the records.
pub fn collect<N: Normalizer>(
    normalizer: &N,
    run_dir: &Path,
    usage: Option<UsageLookup<'_>>,
) -> WorkloadGroups<N::Family> {
    let family = <N::Family as LogFamily>::NAME;
    let inputs = normalizer.discover(run_dir);
    info!("🔍 Found {} {} inputs under {}", inputs.len(), family, run_dir.display());

    let mut groups = WorkloadGroups::new();
    let mut skipped = 0;

    for input in inputs {
        debug!("Now parsing {}", input.display());
        let records = match normalizer.normalize(&input) {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping {}: {}", input.display(), e);
                skipped += 1;
                continue;
            }
        };

        for mut normalized in records {
            if let Some(lookup) = usage {
                annotate(&mut normalized.record, lookup.source, lookup.project);
            }
            debug!(
                "{} {} epoch {}: {} MB/s",
                normalized.key,
                normalized.record.scenario,
                normalized.record.epoch,
                normalized.record.primary_metric()
            );
            if let Err(e) = groups.ingest(normalized) {
                warn!("Dropping record from {}: {}", input.display(), e);
            }
        }
    }

    info!(
        "📊 Grouped {} {} records into {} workloads ({} inputs skipped)",
        groups.record_count(),
        family,
        groups.len(),
        skipped
    );
    groups
}

/// Correlate the groups against their baselines and append them to the
/// report. Returns the number of rows written.
pub fn write_report<F: LogFamily>(mut groups: WorkloadGroups<F>, output: ReportOutput, instance_id: &str) -> Result<usize> {
    correlate(&mut groups);
    output.emit(&groups, instance_id)
}
