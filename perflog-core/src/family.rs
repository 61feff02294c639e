//! Log families: the seam between family-specific parsing and the
//! family-agnostic grouping, correlation and report stages.

use crate::record::{EpochRecord, Metrics};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Composite identity of a benchmarked workload configuration.
/// Records are only ever compared against records with an equal key.
pub trait WorkloadKey: Clone + Eq + Hash + Debug + Display {
    /// Total size of the workload's dataset in GiB, truncated.
    fn total_size_gib(&self) -> u64;
}

/// A family of raw log formats with its own key, metrics and report layout
pub trait LogFamily {
    type Key: WorkloadKey;
    type Metrics: Metrics;

    /// Short family name used in log messages
    const NAME: &'static str;

    /// Header row of the report, without trailing newline
    const HEADER: &'static str;

    /// Sizing columns leading each row, before the scenario column
    fn key_columns(key: &Self::Key) -> Vec<String>;

    /// Metric columns between the duration and relative-to-baseline columns
    fn metric_columns(metrics: &Self::Metrics) -> Vec<String>;

    /// Columns between the mount options and the instance id
    fn trailing_columns(_metrics: &Self::Metrics) -> Vec<String> {
        Vec::new()
    }
}

/// A normalized record together with the key of the workload it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<F: LogFamily> {
    pub key: F::Key,
    pub record: EpochRecord<F::Metrics>,
}
