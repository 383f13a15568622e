use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Normalized host identifier. Only built through `core::target::normalize`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub(crate) fn from_normalized(host: String) -> Self {
        Self(host)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of work: a record type, a path, or a port slice against a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub target: Target,
    pub discriminator: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub status_code: u16,
    /// Header names are stored lowercase.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ResponseEnvelope {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Unresolvable,
    Other(String),
}

/// Unclassified result of executing one `ProbeSpec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    Response(ResponseEnvelope),
    Failure(TransportFailure),
}

/// Family predicate result for a response that is neither a transport failure nor rate limited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Positive(String),
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum Outcome {
    Positive(String),
    Negative,
    RateLimited,
    TimedOut,
    TransportError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Positive,
    Negative,
    RateLimited,
    TimedOut,
    TransportError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Positives,
    Negatives,
    Errors,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Positive(_) => OutcomeKind::Positive,
            Outcome::Negative => OutcomeKind::Negative,
            Outcome::RateLimited => OutcomeKind::RateLimited,
            Outcome::TimedOut => OutcomeKind::TimedOut,
            Outcome::TransportError(_) => OutcomeKind::TransportError,
        }
    }

    pub fn bucket(&self) -> Bucket {
        match self {
            Outcome::Positive(_) => Bucket::Positives,
            Outcome::Negative => Bucket::Negatives,
            Outcome::RateLimited | Outcome::TimedOut | Outcome::TransportError(_) => {
                Bucket::Errors
            }
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Positive(detail) | Outcome::TransportError(detail) => Some(detail),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutcomeKind::Positive => "Positive",
            OutcomeKind::Negative => "Negative",
            OutcomeKind::RateLimited => "RateLimited",
            OutcomeKind::TimedOut => "TimedOut",
            OutcomeKind::TransportError => "TransportError",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bucket::Positives => "positives",
            Bucket::Negatives => "negatives",
            Bucket::Errors => "errors",
        };
        f.write_str(name)
    }
}

/// A spec paired with its classified outcome. `index` is the position in the input list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub index: usize,
    pub spec: ProbeSpec,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub target: Target,
    pub positives: Vec<ProbeResult>,
    pub negatives: Vec<ProbeResult>,
    pub errors: Vec<ProbeResult>,
    pub total_issued: usize,
    pub waves: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub positives: usize,
    pub negatives: usize,
    pub rate_limited: usize,
    pub timed_out: usize,
    pub transport_errors: usize,
}

impl Report {
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            positives: self.positives.len(),
            negatives: self.negatives.len(),
            ..Default::default()
        };
        for result in &self.errors {
            match result.outcome.kind() {
                OutcomeKind::RateLimited => summary.rate_limited += 1,
                OutcomeKind::TimedOut => summary.timed_out += 1,
                _ => summary.transport_errors += 1,
            }
        }
        summary
    }

    /// All results merged back into input order.
    pub fn ordered_results(&self) -> Vec<&ProbeResult> {
        let mut all: Vec<&ProbeResult> = self
            .positives
            .iter()
            .chain(&self.negatives)
            .chain(&self.errors)
            .collect();
        all.sort_by_key(|r| r.index);
        all
    }
}
