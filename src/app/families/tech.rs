use crate::app::families::{fetch, ClassifierSettings, ProbeFamily, StatusRange};
use crate::core::classifier::RateLimitPolicy;
use crate::domain::model::{RawResult, ResponseEnvelope, Target, Verdict};
use crate::domain::ports::{ClassifierRule, ProbeCapability};
use crate::utils::error::Result;
use regex::Regex;
use reqwest::Client;

pub const DEFAULT_SCHEMES: [&str; 2] = ["https", "http"];

pub const SERVED_STATUS: StatusRange = StatusRange { min: 100, max: 500 };

const GENERATOR_META: &str =
    r#"(?i)<meta[^>]+name=["']generator["'][^>]*content=["']([^"']+)["']"#;

/// Fetches the landing page over the scheme named by the discriminator.
pub struct TechCapability {
    client: Client,
}

impl TechCapability {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ProbeCapability for TechCapability {
    async fn execute(&self, target: &Target, discriminator: &str) -> Result<RawResult> {
        let url = format!("{}://{}/", discriminator.trim_end_matches("://"), target);
        tracing::debug!(url = %url, "Landing page request");
        Ok(fetch(self.client.get(&url)).await)
    }
}

/// Positive for a served, non-empty page; the detail carries the headers and meta
/// generator an external fingerprinter would start from.
pub struct BodyRule {
    limits: RateLimitPolicy,
    served: StatusRange,
    marker: Regex,
}

impl BodyRule {
    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self> {
        Ok(Self {
            limits: settings.rate_limit_policy(ProbeFamily::Tech)?,
            served: settings.positive_status.unwrap_or(SERVED_STATUS),
            marker: Regex::new(
                settings
                    .positive_pattern
                    .as_deref()
                    .unwrap_or(GENERATOR_META),
            )?,
        })
    }
}

impl ClassifierRule for BodyRule {
    fn name(&self) -> &str {
        "page-body"
    }

    fn is_rate_limited(&self, response: &ResponseEnvelope) -> bool {
        self.limits.matches(response)
    }

    fn judge(&self, response: &ResponseEnvelope) -> Verdict {
        if !self.served.contains(response.status_code) || response.body.trim().is_empty() {
            return Verdict::Negative;
        }

        let mut detail = vec![format!("status {}", response.status_code)];
        for header in ["server", "x-powered-by"] {
            if let Some(value) = response.header(header) {
                detail.push(format!("{}: {}", header, value));
            }
        }
        if let Some(caps) = self.marker.captures(&response.body) {
            let value = caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str());
            if let Some(value) = value {
                detail.push(format!("generator: {}", value.trim()));
            }
        }
        Verdict::Positive(detail.join("; "))
    }
}
