use crate::domain::model::{Outcome, RawResult, ResponseEnvelope, TransportFailure, Verdict};
use crate::domain::ports::ClassifierRule;
use crate::utils::error::Result;
use regex::Regex;

/// Maps one raw result to exactly one outcome. Never fails.
///
/// Priority: transport failure, then rate limiting, then the family predicate.
pub fn classify(raw: &RawResult, rule: &dyn ClassifierRule) -> Outcome {
    match raw {
        RawResult::Failure(TransportFailure::Timeout) => Outcome::TimedOut,
        RawResult::Failure(TransportFailure::Unresolvable) => {
            Outcome::TransportError("unresolvable".to_string())
        }
        RawResult::Failure(TransportFailure::Other(message)) => {
            Outcome::TransportError(message.clone())
        }
        RawResult::Response(response) => {
            if rule.is_rate_limited(response) {
                tracing::debug!(
                    rule = rule.name(),
                    status = response.status_code,
                    "Rate-limit marker matched"
                );
                return Outcome::RateLimited;
            }
            match rule.judge(response) {
                Verdict::Positive(detail) => Outcome::Positive(detail),
                Verdict::Negative => Outcome::Negative,
            }
        }
    }
}

/// Body grammars and status codes that mark a response as throttled or key-gated.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    patterns: Vec<Regex>,
    statuses: Vec<u16>,
}

impl RateLimitPolicy {
    pub fn new(patterns: &[String], statuses: &[u16]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            statuses: statuses.to_vec(),
        })
    }

    pub fn matches(&self, response: &ResponseEnvelope) -> bool {
        self.statuses.contains(&response.status_code)
            || self.patterns.iter().any(|re| re.is_match(&response.body))
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            statuses: vec![429],
        }
    }
}
