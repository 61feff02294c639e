//! perflog: storage benchmark log reports
//!
//! Downloads the FIO or DLIO logs of a test run, normalizes them, compares
//! every gcsfuse scenario against the local SSD baseline and appends the
//! result to a CSV table.

pub use perflog_common;
pub use perflog_core;

use perflog_common::config::{ReportConfig, UsageMode};
use perflog_common::workload::WorkloadSet;
use perflog_common::Result;
use perflog_core::fetch::{fetch_dlio_logs, fetch_fio_logs, LogFetcher};
use perflog_core::normalizer::Normalizer;
use perflog_core::pipeline::{collect, write_report, UsageLookup};
use perflog_core::usage::{MashUsage, UsageSource};
use perflog_core::{DlioNormalizer, FioNormalizer, ReportOutput};
use std::path::Path;
use tracing::{info, warn};

/// Default download location of FIO logs
pub const DEFAULT_FIO_LOGS_DIR: &str = "../../bin/fio-logs";

/// Default download location of DLIO logs
pub const DEFAULT_DLIO_LOGS_DIR: &str = "../../bin/dlio-logs/logs";

/// Which log family a report is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Fio,
    Dlio,
}

impl Family {
    pub fn default_logs_dir(&self) -> &'static str {
        match self {
            Family::Fio => DEFAULT_FIO_LOGS_DIR,
            Family::Dlio => DEFAULT_DLIO_LOGS_DIR,
        }
    }
}

/// One report invocation
pub struct ReportRequest<'a> {
    pub family: Family,
    pub workloads: &'a WorkloadSet,
    pub instance_id: &'a str,
    pub project_number: &'a str,
    pub config: &'a ReportConfig,
}

/// Fetch (unless skipped), normalize, correlate and append one report.
/// Returns the number of rows written.
pub fn run_report(request: &ReportRequest<'_>, fetcher: &dyn LogFetcher) -> Result<usize> {
    let config = request.config;
    let logs_dir = config.logs_dir_or(request.family.default_logs_dir());
    std::fs::create_dir_all(&logs_dir)?;

    if config.skip_download {
        info!("Skipping download, parsing logs already under {}", logs_dir.display());
    } else {
        let fetched = match request.family {
            Family::Fio => fetch_fio_logs(fetcher, &request.workloads.fio, &logs_dir, request.instance_id),
            Family::Dlio => fetch_dlio_logs(fetcher, &request.workloads.dlio_buckets(), &logs_dir, request.instance_id),
        };
        info!("Fetched logs from {} buckets", fetched);
    }

    let mash = MashUsage::new();
    let usage = match config.usage {
        UsageMode::Disabled => None,
        UsageMode::Auto if mash.is_installed() => Some(UsageLookup {
            source: &mash as &dyn UsageSource,
            project: request.project_number,
        }),
        UsageMode::Auto => {
            warn!("mash is not installed, will skip parsing CPU and memory usage");
            None
        }
    };

    let run_dir = logs_dir.join(request.instance_id);
    match request.family {
        Family::Fio => report(&FioNormalizer::new(request.instance_id), &run_dir, usage, request),
        Family::Dlio => report(&DlioNormalizer::new(), &run_dir, usage, request),
    }
}

fn report<N: Normalizer>(
    normalizer: &N,
    run_dir: &Path,
    usage: Option<UsageLookup<'_>>,
    request: &ReportRequest<'_>,
) -> Result<usize> {
    let groups = collect(normalizer, run_dir, usage);
    let output = ReportOutput::open(&request.config.output, request.config.header)?;
    let rows = write_report(groups, output, request.instance_id)?;
    info!("✅ Report written to {}", request.config.output.display());
    Ok(rows)
}

/// Common imports for report tooling
pub mod prelude {
    pub use perflog_common::config::{load_config, ConfigSource, HeaderPolicy, ReportConfig, UsageMode};
    pub use perflog_common::workload::WorkloadSet;
    pub use perflog_common::{PerflogError, Result, Scenario};
    pub use perflog_core::fetch::{GcloudFetcher, LogFetcher};
    pub use perflog_core::{LogFamily, Normalizer, ReportOutput};

    pub use crate::{run_report, Family, ReportRequest};
}
