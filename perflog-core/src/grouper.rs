//! Workload grouping
//!
//! Records are grouped by workload key (groups kept in the order their key
//! was first seen) and, inside a group, by scenario into epoch-aligned
//! sequences: slot `i` always holds epoch `i + 1`, padded with placeholders
//! for epochs whose log never showed up.

use crate::family::{LogFamily, Normalized};
use crate::record::{EpochRecord, MAX_EPOCH};
use indexmap::IndexMap;
use perflog_common::{PerflogError, Result, Scenario};
use std::collections::BTreeMap;
use tracing::debug;

/// All records for one workload key
#[derive(Debug, Clone)]
pub struct WorkloadGroup<F: LogFamily> {
    key: F::Key,
    sequences: BTreeMap<Scenario, Vec<EpochRecord<F::Metrics>>>,
}

impl<F: LogFamily> WorkloadGroup<F> {
    pub fn new(key: F::Key) -> Self {
        Self {
            key,
            sequences: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &F::Key {
        &self.key
    }

    /// Place a record in its scenario sequence at `epoch - 1`, padding with
    /// placeholders first. A record for an occupied slot replaces it.
    /// Epochs outside `1..=MAX_EPOCH` are rejected and leave the group as is.
    pub fn place(&mut self, record: EpochRecord<F::Metrics>) -> Result<()> {
        check_epoch(&self.key, &record)?;

        let scenario = record.scenario;
        let slot = (record.epoch - 1) as usize;
        let sequence = self.sequences.entry(scenario).or_default();

        while sequence.len() <= slot {
            let epoch = sequence.len() as u32 + 1;
            sequence.push(EpochRecord::placeholder(scenario, epoch));
        }

        if !sequence[slot].is_placeholder() {
            debug!(
                "Replacing {} epoch {} of {} ({} -> {})",
                scenario, record.epoch, self.key, sequence[slot].pod_name, record.pod_name
            );
        }
        sequence[slot] = record;
        Ok(())
    }

    /// Sequence for a scenario, empty if none was observed
    pub fn sequence(&self, scenario: Scenario) -> &[EpochRecord<F::Metrics>] {
        self.sequences.get(&scenario).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Baseline sequence together with one comparison sequence, for in-place
    /// correlation. Returns `None` if the comparison scenario was not observed.
    pub fn baseline_and(
        &mut self,
        scenario: Scenario,
    ) -> Option<(Option<&[EpochRecord<F::Metrics>]>, &mut Vec<EpochRecord<F::Metrics>>)> {
        if scenario.is_baseline() {
            return None;
        }

        let mut baseline = None;
        let mut comparison = None;
        for (s, sequence) in self.sequences.iter_mut() {
            if s.is_baseline() {
                baseline = Some(sequence.as_slice());
            } else if *s == scenario {
                comparison = Some(sequence);
            }
        }
        comparison.map(|c| (baseline, c))
    }

    /// Observed scenarios in report order
    pub fn scenarios(&self) -> impl Iterator<Item = Scenario> + '_ {
        self.sequences.keys().copied()
    }
}

fn check_epoch<K: std::fmt::Display, M>(key: &K, record: &EpochRecord<M>) -> Result<()> {
    if record.epoch == 0 || record.epoch > MAX_EPOCH {
        return Err(PerflogError::InvalidKey(format!(
            "{} record for {} has epoch {}, expected 1 to {}",
            record.scenario, key, record.epoch, MAX_EPOCH
        )));
    }
    Ok(())
}

/// Accumulator of workload groups, in first-seen key order
#[derive(Debug, Clone)]
pub struct WorkloadGroups<F: LogFamily> {
    groups: IndexMap<F::Key, WorkloadGroup<F>>,
}

impl<F: LogFamily> Default for WorkloadGroups<F> {
    fn default() -> Self {
        Self {
            groups: IndexMap::new(),
        }
    }
}

impl<F: LogFamily> WorkloadGroups<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one normalized record to the group for its key
    pub fn ingest(&mut self, normalized: Normalized<F>) -> Result<()> {
        let Normalized { key, record } = normalized;
        check_epoch(&key, &record)?;
        self.groups
            .entry(key.clone())
            .or_insert_with(|| WorkloadGroup::new(key))
            .place(record)
    }

    pub fn get(&self, key: &F::Key) -> Option<&WorkloadGroup<F>> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkloadGroup<F>> {
        self.groups.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut WorkloadGroup<F>> {
        self.groups.values_mut()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records placed, placeholders excluded
    pub fn record_count(&self) -> usize {
        self.iter()
            .flat_map(|group| group.sequences.values())
            .flatten()
            .filter(|record| !record.is_placeholder())
            .count()
    }
}
