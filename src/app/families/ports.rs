use crate::app::families::{fetch, ClassifierSettings, ProbeFamily};
use crate::core::classifier::RateLimitPolicy;
use crate::domain::model::{RawResult, ResponseEnvelope, Target, Verdict};
use crate::domain::ports::{ClassifierRule, ProbeCapability};
use crate::utils::error::Result;
use regex::Regex;
use reqwest::Client;

pub const DEFAULT_ENDPOINT: &str = "https://api.hackertarget.com/nmap/";

/// Lets the endpoint pick its own port set. The public HackerTarget API only reads `q`
/// and always scans its fixed top ports, so one probe per target is the default.
pub const DEFAULT_SCAN: &str = "top";

pub const DEFAULT_PORT_SLICES: [&str; 1] = [DEFAULT_SCAN];

/// `80/tcp   open  http`
pub const OPEN_PORT_GRAMMAR: &str = r"(?i)(\d+)/(\w+)\s+open\s+(.*)";

pub const RATE_LIMIT_PATTERNS: [&str; 2] = [r"(?i)error.*(key required|api)", r"(?i)api count exceeded"];

/// Retrieves a remote scan result for one port slice.
///
/// Any discriminator other than [`DEFAULT_SCAN`] is sent as a `ports` query parameter.
/// Only endpoints that honor it (a self-hosted scanner, for instance) give distinct
/// results per slice.
pub struct PortScanCapability {
    client: Client,
    endpoint: String,
}

impl PortScanCapability {
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait::async_trait]
impl ProbeCapability for PortScanCapability {
    async fn execute(&self, target: &Target, discriminator: &str) -> Result<RawResult> {
        tracing::debug!(target = %target, ports = discriminator, "Port scan request");
        let request = self
            .client
            .get(&self.endpoint)
            .query(&scan_query(target, discriminator));
        Ok(fetch(request).await)
    }
}

pub(crate) fn scan_query<'a>(target: &'a Target, discriminator: &'a str) -> Vec<(&'static str, &'a str)> {
    let mut query = vec![("q", target.as_str())];
    let slice = discriminator.trim();
    if !slice.is_empty() && !slice.eq_ignore_ascii_case(DEFAULT_SCAN) {
        query.push(("ports", slice));
    }
    query
}

/// Positive when at least one body line matches the open-port grammar.
pub struct LineGrammarRule {
    limits: RateLimitPolicy,
    grammar: Regex,
}

impl LineGrammarRule {
    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self> {
        let grammar = settings
            .positive_pattern
            .as_deref()
            .unwrap_or(OPEN_PORT_GRAMMAR);
        Ok(Self {
            limits: settings.rate_limit_policy(ProbeFamily::Ports)?,
            grammar: Regex::new(grammar)?,
        })
    }

    fn describe(&self, line: &str) -> Option<String> {
        let caps = self.grammar.captures(line)?;
        match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(port), Some(proto), Some(service)) => Some(format!(
                "{}/{} {}",
                port.as_str(),
                proto.as_str(),
                service.as_str().trim()
            )),
            _ => caps.get(0).map(|m| m.as_str().trim().to_string()),
        }
    }
}

impl ClassifierRule for LineGrammarRule {
    fn name(&self) -> &str {
        "open-port-lines"
    }

    fn is_rate_limited(&self, response: &ResponseEnvelope) -> bool {
        self.limits.matches(response)
    }

    fn judge(&self, response: &ResponseEnvelope) -> Verdict {
        let open: Vec<String> = response
            .body
            .lines()
            .filter_map(|line| self.describe(line))
            .collect();
        if open.is_empty() {
            Verdict::Negative
        } else {
            Verdict::Positive(open.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN_OUTPUT: &str = "Starting Nmap 7.94 ( https://nmap.org )\n\
Nmap scan report for example.com (93.184.216.34)\n\
PORT    STATE  SERVICE\n\
22/tcp  closed ssh\n\
80/tcp  open   http\n\
443/tcp open   https\n\
Nmap done: 1 IP address (1 host up)";

    fn rule() -> LineGrammarRule {
        LineGrammarRule::from_settings(&ClassifierSettings::default()).unwrap()
    }

    #[test]
    fn test_open_ports_are_listed() {
        assert_eq!(
            rule().judge(&ResponseEnvelope::new(200, SCAN_OUTPUT)),
            Verdict::Positive("80/tcp http, 443/tcp https".to_string())
        );
    }

    #[test]
    fn test_no_open_ports_is_negative() {
        let body = "PORT   STATE    SERVICE\n22/tcp filtered ssh";
        assert_eq!(rule().judge(&ResponseEnvelope::new(200, body)), Verdict::Negative);
    }

    #[test]
    fn test_api_key_error_is_rate_limited() {
        let rule = rule();
        assert!(rule.is_rate_limited(&ResponseEnvelope::new(200, "error: API key required")));
        assert!(rule.is_rate_limited(&ResponseEnvelope::new(
            200,
            "API count exceeded - Increase Quota with Membership"
        )));
    }

    #[test]
    fn test_word_error_in_scan_output_is_not_rate_limited() {
        let body = "8080/tcp open  http-proxy error-pages";
        assert!(!rule().is_rate_limited(&ResponseEnvelope::new(200, body)));
    }

    #[test]
    fn test_custom_grammar_without_groups() {
        let rule = LineGrammarRule::from_settings(&ClassifierSettings {
            positive_pattern: Some(r"\d+/udp\s+open".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            rule.judge(&ResponseEnvelope::new(200, "53/udp  open  domain")),
            Verdict::Positive("53/udp  open".to_string())
        );
    }

    #[test]
    fn test_default_scan_sends_only_the_target() {
        let target: Target = "scanme.example.org".parse().unwrap();
        assert_eq!(scan_query(&target, DEFAULT_SCAN), vec![("q", "scanme.example.org")]);
        assert_eq!(
            scan_query(&target, "1-1024"),
            vec![("q", "scanme.example.org"), ("ports", "1-1024")]
        );
    }
}
