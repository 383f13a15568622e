use crate::app::families::{fetch, ClassifierSettings, ProbeFamily};
use crate::core::classifier::RateLimitPolicy;
use crate::domain::model::{RawResult, ResponseEnvelope, Target, TransportFailure, Verdict};
use crate::domain::ports::{ClassifierRule, ProbeCapability};
use crate::utils::error::Result;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "https://dns.google/resolve";

pub const RECORD_TYPES: [&str; 7] = ["A", "AAAA", "MX", "NS", "TXT", "SOA", "CNAME"];

/// DNS-over-HTTPS JSON lookup, one record type per probe.
pub struct DnsCapability {
    client: Client,
    endpoint: String,
}

impl DnsCapability {
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait::async_trait]
impl ProbeCapability for DnsCapability {
    async fn execute(&self, target: &Target, discriminator: &str) -> Result<RawResult> {
        tracing::debug!(target = %target, record_type = discriminator, "DNS lookup");
        let request = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/dns-json")
            .query(&[("name", target.as_str()), ("type", discriminator)]);

        let raw = fetch(request).await;
        if let RawResult::Response(response) = &raw {
            if let Some(failure) = resolution_failure(response) {
                tracing::debug!(
                    target = %target,
                    record_type = discriminator,
                    failure = ?failure,
                    "Resolver refused the name"
                );
                return Ok(RawResult::Failure(failure));
            }
        }
        Ok(raw)
    }
}

/// Maps the DoH `Status` (DNS RCODE) of a successful HTTP answer to a resolution failure.
fn resolution_failure(response: &ResponseEnvelope) -> Option<TransportFailure> {
    if !(200..300).contains(&response.status_code) {
        return None;
    }
    let parsed: DohResponse = serde_json::from_str(&response.body).ok()?;
    match parsed.status? {
        3 => Some(TransportFailure::Unresolvable),
        2 => Some(TransportFailure::Other("SERVFAIL".to_string())),
        5 => Some(TransportFailure::Other("REFUSED".to_string())),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status", default)]
    status: Option<u32>,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    data: String,
}

/// Positive when the JSON answer set is non-empty. An optional filter keeps only matching answers.
pub struct AnswerRule {
    limits: RateLimitPolicy,
    answer_filter: Option<Regex>,
}

impl AnswerRule {
    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self> {
        Ok(Self {
            limits: settings.rate_limit_policy(ProbeFamily::Dns)?,
            answer_filter: settings
                .positive_pattern
                .as_deref()
                .map(Regex::new)
                .transpose()?,
        })
    }
}

impl ClassifierRule for AnswerRule {
    fn name(&self) -> &str {
        "dns-answer"
    }

    fn is_rate_limited(&self, response: &ResponseEnvelope) -> bool {
        self.limits.matches(response)
    }

    fn judge(&self, response: &ResponseEnvelope) -> Verdict {
        let parsed: DohResponse = match serde_json::from_str(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "DNS body is not a JSON answer");
                return Verdict::Negative;
            }
        };

        let answers: Vec<String> = parsed
            .answer
            .into_iter()
            .map(|a| a.data)
            .filter(|data| self.answer_filter.as_ref().map_or(true, |re| re.is_match(data)))
            .collect();

        if answers.is_empty() {
            Verdict::Negative
        } else {
            Verdict::Positive(answers.join(", "))
        }
    }
}
