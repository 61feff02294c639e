//! Baseline correlation
//!
//! Fills `relative_to_baseline` on every comparison-scenario record of a
//! group with its throughput as a percentage of the baseline record for the
//! same epoch. Sequences are only compared position by position when both
//! have the same length; otherwise the whole comparison sequence is marked
//! unavailable.

use crate::family::LogFamily;
use crate::grouper::{WorkloadGroup, WorkloadGroups};
use crate::record::{EpochRecord, Metrics, Relative};
use crate::utils::round_to;
use perflog_common::Scenario;
use tracing::warn;

/// Correlate every group
pub fn correlate<F: LogFamily>(groups: &mut WorkloadGroups<F>) {
    for group in groups.iter_mut() {
        correlate_group(group);
    }
}

/// Correlate each observed comparison scenario of one group against its
/// baseline. Baseline records are left untouched.
pub fn correlate_group<F: LogFamily>(group: &mut WorkloadGroup<F>) {
    let key = group.key().to_string();

    for scenario in Scenario::comparisons() {
        let Some((baseline, comparison)) = group.baseline_and(scenario) else {
            continue;
        };

        match baseline {
            Some(baseline) if baseline.len() == comparison.len() => {
                correlate_sequence(&key, scenario, baseline, comparison);
            }
            Some(baseline) => {
                warn!(
                    "{}: {} has {} epochs but {} has {}, throughput over {} unavailable",
                    key,
                    scenario,
                    comparison.len(),
                    Scenario::BASELINE,
                    baseline.len(),
                    Scenario::BASELINE
                );
                mark_unavailable(comparison);
            }
            None => {
                warn!("{}: no {} records to compare {} against", key, Scenario::BASELINE, scenario);
                mark_unavailable(comparison);
            }
        }
    }
}

fn correlate_sequence<M: Metrics>(
    key: &str,
    scenario: Scenario,
    baseline: &[EpochRecord<M>],
    comparison: &mut [EpochRecord<M>],
) {
    let mut warned_zero = false;

    for (base, record) in baseline.iter().zip(comparison.iter_mut()) {
        let base_metric = base.primary_metric();
        if base_metric == 0.0 {
            if !warned_zero {
                warn!(
                    "{}: {} throughput is zero for {} epoch {}, reporting 0 relative throughput",
                    key, Scenario::BASELINE, scenario, record.epoch
                );
                warned_zero = true;
            }
            record.relative_to_baseline = Relative::Percent(0.0);
            continue;
        }

        match relative_percent(record.primary_metric(), base_metric) {
            Some(percent) => record.relative_to_baseline = Relative::Percent(percent),
            None => warn!(
                "Cannot compute throughput over {} for {} epoch {} ({})",
                Scenario::BASELINE,
                scenario,
                record.epoch,
                record.pod_name
            ),
        }
    }
}

fn mark_unavailable<M: Metrics>(records: &mut [EpochRecord<M>]) {
    for record in records {
        record.relative_to_baseline = Relative::Unavailable;
    }
}

/// `value / baseline * 100` rounded to two decimals; `None` for a zero
/// baseline or a non-finite result.
pub fn relative_percent(value: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    let percent = round_to(value / baseline * 100.0, 2);
    percent.is_finite().then_some(percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::Normalized;
    use crate::key::DlioKey;
    use crate::normalizer::{Dlio, DlioMetrics};

    fn key() -> DlioKey {
        DlioKey {
            num_files_train: 5000,
            mean_file_size: 102400,
            batch_size: 200,
        }
    }

    fn ingest(groups: &mut WorkloadGroups<Dlio>, scenario: Scenario, epoch: u32, mb: u64) {
        let mut record = EpochRecord::new(scenario, epoch);
        record.metrics = DlioMetrics {
            throughput_mb_per_sec: mb,
            ..Default::default()
        };
        groups.ingest(Normalized { key: key(), record }).unwrap();
    }

    fn relatives(groups: &WorkloadGroups<Dlio>, scenario: Scenario) -> Vec<Relative> {
        groups
            .get(&key())
            .unwrap()
            .sequence(scenario)
            .iter()
            .map(|r| r.relative_to_baseline)
            .collect()
    }

    #[test]
    fn test_relative_percent() {
        assert_eq!(relative_percent(57.0, 100.0), Some(57.0));
        assert_eq!(relative_percent(400.0, 500.0), Some(80.0));
        assert_eq!(relative_percent(1.0, 3.0), Some(33.33));
        assert_eq!(relative_percent(1.0, 800.0), Some(0.12));
        assert_eq!(relative_percent(3.0, 800.0), Some(0.38));
        assert_eq!(relative_percent(10.0, 0.0), None);
    }

    #[test]
    fn test_equal_lengths_are_compared_per_epoch() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::LocalSsd, 1, 100);
        ingest(&mut groups, Scenario::LocalSsd, 2, 200);
        ingest(&mut groups, Scenario::GcsfuseGeneric, 1, 57);
        ingest(&mut groups, Scenario::GcsfuseGeneric, 2, 100);

        correlate(&mut groups);

        assert_eq!(
            relatives(&groups, Scenario::GcsfuseGeneric),
            vec![Relative::Percent(57.0), Relative::Percent(50.0)]
        );
        assert_eq!(
            relatives(&groups, Scenario::LocalSsd),
            vec![Relative::NotComputed, Relative::NotComputed]
        );
    }

    #[test]
    fn test_zero_baseline_reports_zero() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::LocalSsd, 1, 0);
        ingest(&mut groups, Scenario::LocalSsd, 2, 100);
        ingest(&mut groups, Scenario::GcsfuseFileCache, 1, 90);
        ingest(&mut groups, Scenario::GcsfuseFileCache, 2, 90);

        correlate(&mut groups);

        assert_eq!(
            relatives(&groups, Scenario::GcsfuseFileCache),
            vec![Relative::Percent(0.0), Relative::Percent(90.0)]
        );
    }

    #[test]
    fn test_length_mismatch_is_unavailable() {
        let mut groups = WorkloadGroups::new();
        for epoch in 1..=3 {
            ingest(&mut groups, Scenario::GcsfuseNoFileCache, epoch, 100);
        }
        for epoch in 1..=2 {
            ingest(&mut groups, Scenario::LocalSsd, epoch, 100);
        }

        correlate(&mut groups);

        assert_eq!(
            relatives(&groups, Scenario::GcsfuseNoFileCache),
            vec![Relative::Unavailable; 3]
        );
    }

    #[test]
    fn test_missing_baseline_is_unavailable() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::GcsfuseGeneric, 1, 100);

        correlate(&mut groups);

        assert_eq!(relatives(&groups, Scenario::GcsfuseGeneric), vec![Relative::Unavailable]);
    }

    #[test]
    fn test_placeholder_slots_align_with_baseline() {
        let mut groups = WorkloadGroups::new();
        ingest(&mut groups, Scenario::LocalSsd, 1, 100);
        ingest(&mut groups, Scenario::LocalSsd, 2, 100);
        ingest(&mut groups, Scenario::LocalSsd, 3, 100);
        ingest(&mut groups, Scenario::GcsfuseGeneric, 1, 50);
        ingest(&mut groups, Scenario::GcsfuseGeneric, 3, 75);

        correlate(&mut groups);

        assert_eq!(
            relatives(&groups, Scenario::GcsfuseGeneric),
            vec![Relative::Percent(50.0), Relative::Percent(0.0), Relative::Percent(75.0)]
        );
    }
}
