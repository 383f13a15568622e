use crate::app::families::{fetch, ClassifierSettings, ProbeFamily, StatusRange};
use crate::core::classifier::RateLimitPolicy;
use crate::domain::model::{RawResult, ResponseEnvelope, Target, Verdict};
use crate::domain::ports::{ClassifierRule, ProbeCapability};
use crate::utils::error::Result;
use reqwest::Client;

pub const COMMON_PATHS: [&str; 35] = [
    "/admin",
    "/login",
    "/dashboard",
    "/wp-admin",
    "/administrator",
    "/backup",
    "/config",
    "/test",
    "/dev",
    "/api",
    "/uploads",
    "/files",
    "/images",
    "/css",
    "/js",
    "/robots.txt",
    "/sitemap.xml",
    "/.htaccess",
    "/.env",
    "/config.json",
    "/package.json",
    "/phpinfo.php",
    "/admin.php",
    "/login.php",
    "/register.php",
    "/vendor/",
    "/includes/",
    "/cgi-bin/",
    "/.git/",
    "/.svn/",
    "/old/",
    "/temp/",
    "/tmp/",
    "/logs/",
    "/.well-known/security.txt",
];

pub const FOUND_STATUS: StatusRange = StatusRange { min: 200, max: 400 };

/// Path existence check. The client must not follow redirects: a 3xx counts as found.
pub struct PathCapability {
    client: Client,
    scheme: String,
}

impl PathCapability {
    pub fn new(client: Client, scheme: String) -> Self {
        Self { client, scheme }
    }

    pub fn url_for(&self, target: &Target, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}://{}{}", self.scheme, target, path)
        } else {
            format!("{}://{}/{}", self.scheme, target, path)
        }
    }
}

#[async_trait::async_trait]
impl ProbeCapability for PathCapability {
    async fn execute(&self, target: &Target, discriminator: &str) -> Result<RawResult> {
        let url = self.url_for(target, discriminator);
        tracing::debug!(url = %url, "Path probe");
        Ok(fetch(self.client.get(&url).header("Accept", "*/*")).await)
    }
}

pub struct StatusRule {
    limits: RateLimitPolicy,
    found: StatusRange,
}

impl StatusRule {
    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self> {
        Ok(Self {
            limits: settings.rate_limit_policy(ProbeFamily::Paths)?,
            found: settings.positive_status.unwrap_or(FOUND_STATUS),
        })
    }
}

impl ClassifierRule for StatusRule {
    fn name(&self) -> &str {
        "path-status"
    }

    fn is_rate_limited(&self, response: &ResponseEnvelope) -> bool {
        self.limits.matches(response)
    }

    fn judge(&self, response: &ResponseEnvelope) -> Verdict {
        if !self.found.contains(response.status_code) {
            return Verdict::Negative;
        }
        let size = response.header("content-length").unwrap_or("unknown");
        Verdict::Positive(format!("status {}, size {}", response.status_code, size))
    }
}
