use crate::error::PerflogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage scenario a benchmark run was executed against.
///
/// The declaration order is the report order; `LocalSsd` is the baseline
/// every other scenario is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    LocalSsd,
    GcsfuseGeneric,
    GcsfuseNoFileCache,
    GcsfuseFileCache,
}

impl Scenario {
    pub const BASELINE: Scenario = Scenario::LocalSsd;

    /// All scenarios in report order.
    pub const REPORT_ORDER: [Scenario; 4] = [
        Scenario::LocalSsd,
        Scenario::GcsfuseGeneric,
        Scenario::GcsfuseNoFileCache,
        Scenario::GcsfuseFileCache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::LocalSsd => "local-ssd",
            Scenario::GcsfuseGeneric => "gcsfuse-generic",
            Scenario::GcsfuseNoFileCache => "gcsfuse-no-file-cache",
            Scenario::GcsfuseFileCache => "gcsfuse-file-cache",
        }
    }

    pub fn is_baseline(&self) -> bool {
        *self == Self::BASELINE
    }

    /// Non-baseline scenarios in report order.
    pub fn comparisons() -> impl Iterator<Item = Scenario> {
        Self::REPORT_ORDER.into_iter().filter(|s| !s.is_baseline())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = PerflogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::REPORT_ORDER
            .into_iter()
            .find(|scenario| scenario.as_str() == s)
            .ok_or_else(|| PerflogError::UnknownScenario(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_round_trip_names() {
        for scenario in Scenario::REPORT_ORDER {
            assert_eq!(scenario.as_str().parse::<Scenario>().unwrap(), scenario);
        }
    }

    #[test]
    fn test_ordering_is_report_order() {
        let mut sorted = Scenario::REPORT_ORDER;
        sorted.sort();
        assert_eq!(sorted, Scenario::REPORT_ORDER);
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        assert!(matches!(
            "gcsfuse-parallel".parse::<Scenario>(),
            Err(PerflogError::UnknownScenario(name)) if name == "gcsfuse-parallel"
        ));
    }

    #[test]
    fn test_comparisons_skip_baseline_and_keep_order() {
        let comparisons: Vec<_> = Scenario::comparisons().collect();
        assert_eq!(
            comparisons,
            vec![
                Scenario::GcsfuseGeneric,
                Scenario::GcsfuseNoFileCache,
                Scenario::GcsfuseFileCache,
            ]
        );
    }
}
