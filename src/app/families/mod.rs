//! Concrete probe families: each pairs a reqwest-backed [`ProbeCapability`] with a
//! [`ClassifierRule`] and a default discriminator list.

pub mod dns;
pub mod paths;
pub mod ports;
pub mod tech;

use crate::core::classifier::RateLimitPolicy;
use crate::domain::model::{RawResult, ResponseEnvelope, TransportFailure};
use crate::domain::ports::{ClassifierRule, ProbeCapability};
use crate::utils::error::Result;
use reqwest::{redirect, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Throttling and key-gating markers shared by every family; checked against the body
/// before the family predicate runs.
pub const RATE_LIMIT_MARKERS: [&str; 4] = [
    r"(?i)rate[ _-]?limit(ed)?\s*(exceeded|reached)",
    r"(?i)too many requests",
    r"(?i)api (count|quota|rate) exceeded",
    r"(?i)api key (required|invalid|missing)",
];

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ProbeFamily {
    Dns,
    Paths,
    Ports,
    Tech,
}

impl ProbeFamily {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeFamily::Dns => "dns",
            ProbeFamily::Paths => "paths",
            ProbeFamily::Ports => "ports",
            ProbeFamily::Tech => "tech",
        }
    }

    pub fn default_discriminators(&self) -> Vec<String> {
        let items: &[&str] = match self {
            ProbeFamily::Dns => &dns::RECORD_TYPES[..],
            ProbeFamily::Paths => &paths::COMMON_PATHS[..],
            ProbeFamily::Ports => &ports::DEFAULT_PORT_SLICES[..],
            ProbeFamily::Tech => &tech::DEFAULT_SCHEMES[..],
        };
        items.iter().map(|s| s.to_string()).collect()
    }

    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            ProbeFamily::Dns => Some(dns::DEFAULT_ENDPOINT),
            ProbeFamily::Ports => Some(ports::DEFAULT_ENDPOINT),
            ProbeFamily::Paths | ProbeFamily::Tech => None,
        }
    }

    pub fn default_rate_limit_patterns(&self) -> Vec<String> {
        let extra: &[&str] = match self {
            ProbeFamily::Ports => &ports::RATE_LIMIT_PATTERNS[..],
            ProbeFamily::Dns | ProbeFamily::Paths | ProbeFamily::Tech => &[],
        };
        RATE_LIMIT_MARKERS
            .iter()
            .chain(extra)
            .map(|s| s.to_string())
            .collect()
    }
}

impl fmt::Display for ProbeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-open status interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRange {
    pub min: u16,
    pub max: u16,
}

impl StatusRange {
    pub fn contains(&self, status: u16) -> bool {
        status >= self.min && status < self.max
    }
}

/// Per-family classifier overrides; `None` keeps the family default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierSettings {
    pub rate_limit_patterns: Option<Vec<String>>,
    pub rate_limit_statuses: Option<Vec<u16>>,
    pub positive_pattern: Option<String>,
    pub positive_status: Option<StatusRange>,
}

impl ClassifierSettings {
    pub(crate) fn rate_limit_policy(&self, family: ProbeFamily) -> Result<RateLimitPolicy> {
        let patterns = self
            .rate_limit_patterns
            .clone()
            .unwrap_or_else(|| family.default_rate_limit_patterns());
        let statuses = self.rate_limit_statuses.clone().unwrap_or_else(|| vec![429]);
        RateLimitPolicy::new(&patterns, &statuses)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FamilyOptions {
    /// API endpoint for `dns` / `ports`; ignored by the families that hit the target directly.
    pub endpoint: Option<String>,
    /// URL scheme used by `paths`; defaults to https.
    pub scheme: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub classifier: ClassifierSettings,
}

pub struct FamilyKit {
    pub family: ProbeFamily,
    pub capability: Arc<dyn ProbeCapability>,
    pub rule: Box<dyn ClassifierRule>,
}

pub fn build_family(family: ProbeFamily, options: &FamilyOptions) -> Result<FamilyKit> {
    let timeout = options.request_timeout_ms.map(Duration::from_millis);
    let endpoint = options.endpoint.clone();

    let (capability, rule): (Arc<dyn ProbeCapability>, Box<dyn ClassifierRule>) = match family {
        ProbeFamily::Dns => (
            Arc::new(dns::DnsCapability::new(
                http_client(timeout, redirect::Policy::default())?,
                endpoint.unwrap_or_else(|| dns::DEFAULT_ENDPOINT.to_string()),
            )),
            Box::new(dns::AnswerRule::from_settings(&options.classifier)?),
        ),
        ProbeFamily::Paths => (
            Arc::new(paths::PathCapability::new(
                http_client(timeout, redirect::Policy::none())?,
                options.scheme.clone().unwrap_or_else(|| "https".to_string()),
            )),
            Box::new(paths::StatusRule::from_settings(&options.classifier)?),
        ),
        ProbeFamily::Ports => (
            Arc::new(ports::PortScanCapability::new(
                http_client(timeout, redirect::Policy::default())?,
                endpoint.unwrap_or_else(|| ports::DEFAULT_ENDPOINT.to_string()),
            )),
            Box::new(ports::LineGrammarRule::from_settings(&options.classifier)?),
        ),
        ProbeFamily::Tech => (
            Arc::new(tech::TechCapability::new(http_client(
                timeout,
                redirect::Policy::limited(5),
            )?)),
            Box::new(tech::BodyRule::from_settings(&options.classifier)?),
        ),
    };

    Ok(FamilyKit {
        family,
        capability,
        rule,
    })
}

pub(crate) fn http_client(timeout: Option<Duration>, policy: redirect::Policy) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT).redirect(policy);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Sends the request and captures status, headers and body. Never returns a reqwest error.
pub(crate) async fn fetch(request: RequestBuilder) -> RawResult {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return RawResult::Failure(transport_failure(&e)),
    };

    let status_code = response.status().as_u16();
    let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();

    match response.text().await {
        Ok(body) => RawResult::Response(ResponseEnvelope {
            status_code,
            headers,
            body,
        }),
        Err(e) => RawResult::Failure(transport_failure(&e)),
    }
}

pub(crate) fn transport_failure(error: &reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        return TransportFailure::Timeout;
    }

    let mut source: Option<&dyn StdError> = Some(error);
    while let Some(current) = source {
        let message = current.to_string().to_ascii_lowercase();
        if message.contains("dns error")
            || message.contains("failed to lookup address")
            || message.contains("name or service not known")
            || message.contains("no such host")
        {
            return TransportFailure::Unresolvable;
        }
        source = current.source();
    }

    TransportFailure::Other(error.to_string())
}
