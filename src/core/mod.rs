pub mod aggregator;
pub mod classifier;
pub mod engine;
pub mod scheduler;
pub mod target;

pub use crate::domain::model::{
    Bucket, Outcome, OutcomeKind, ProbeResult, ProbeSpec, RawResult, Report, ReportSummary,
    ResponseEnvelope, Target, TransportFailure, Verdict,
};
pub use crate::domain::ports::{ClassifierRule, ProbeCapability, SchedulerSettings, Storage};
pub use crate::utils::error::Result;
