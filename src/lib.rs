pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use adapters::report_writer::{OutputFormat, ReportWriter};
pub use app::families::{build_family, FamilyKit, FamilyOptions, ProbeFamily};
pub use core::engine::{run_probes, ProbeEngine};
pub use core::scheduler::{BatchScheduler, SchedulerConfig};
pub use domain::model::{Outcome, ProbeResult, Report, Target};
pub use utils::error::{ProbeError, Result};
