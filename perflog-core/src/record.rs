//! Canonical record: one measurement for one (workload, scenario, epoch).

use perflog_common::Scenario;
use std::fmt::Debug;

/// Highest epoch number a record may carry. Sequences are padded up to the
/// epoch, so this also bounds the length of every scenario sequence.
pub const MAX_EPOCH: u32 = 10_000;

/// Family-specific measurements carried by a record.
pub trait Metrics: Clone + Debug + Default + PartialEq {
    /// Throughput in MB/s, the value compared against the baseline.
    fn primary_metric(&self) -> f64;
}

/// Performance relative to the baseline scenario for the same epoch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Relative {
    #[default]
    NotComputed,
    /// Percentage of baseline throughput, rounded to two decimals
    Percent(f64),
    /// The baseline is missing or has a different number of epochs
    Unavailable,
}

/// Min/max utilization of the storage sidecar over the epoch's time window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceUsage {
    pub lowest_memory_mb: u64,
    pub highest_memory_mb: u64,
    pub lowest_cpu_cores: f64,
    pub highest_cpu_cores: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochRecord<M> {
    /// 1-indexed epoch; equals the slot index + 1 inside its sequence
    pub epoch: u32,
    pub scenario: Scenario,
    /// Identity of the run instance (pod name)
    pub pod_name: String,
    pub duration_secs: u64,
    pub metrics: M,
    pub relative_to_baseline: Relative,
    /// `None` when utilization lookup is disabled or was not attempted
    pub usage: Option<ResourceUsage>,
    pub start: String,
    pub end: String,
    pub mount_options: String,
    placeholder: bool,
}

impl<M: Metrics> EpochRecord<M> {
    pub fn new(scenario: Scenario, epoch: u32) -> Self {
        Self {
            epoch,
            scenario,
            pod_name: String::new(),
            duration_secs: 0,
            metrics: M::default(),
            relative_to_baseline: Relative::NotComputed,
            usage: None,
            start: String::new(),
            end: String::new(),
            mount_options: String::new(),
            placeholder: false,
        }
    }

    /// Empty record standing in for an epoch whose log was never observed.
    pub fn placeholder(scenario: Scenario, epoch: u32) -> Self {
        Self {
            placeholder: true,
            ..Self::new(scenario, epoch)
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn primary_metric(&self) -> f64 {
        self.metrics.primary_metric()
    }
}
