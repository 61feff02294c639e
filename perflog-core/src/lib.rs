//! perflog core: turns raw FIO and DLIO benchmark logs into a flat report
//! comparing every storage scenario against the local SSD baseline.

pub mod correlator;
pub mod family;
pub mod fetch;
pub mod grouper;
pub mod key;
pub mod normalizer;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod usage;
pub mod utils;

pub use family::{LogFamily, Normalized, WorkloadKey};
pub use grouper::{WorkloadGroup, WorkloadGroups};
pub use normalizer::{Dlio, DlioNormalizer, Fio, FioNormalizer, Normalizer};
pub use record::{EpochRecord, Metrics, Relative, ResourceUsage, MAX_EPOCH};
pub use report::ReportOutput;
