use crate::adapters::report_writer::OutputFormat;
use crate::app::families::{ClassifierSettings, FamilyOptions, ProbeFamily};
use crate::core::scheduler::SchedulerConfig;
use crate::core::SchedulerSettings;
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A probe plan loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub plan: PlanConfig,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    pub family: FamilySection,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    pub output: Option<OutputSection>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    pub name: String,
    pub description: Option<String>,
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerSection {
    pub wave_size: Option<usize>,
    pub probe_timeout_ms: Option<u64>,
    pub inter_wave_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilySection {
    pub kind: ProbeFamily,
    pub endpoint: Option<String>,
    pub scheme: Option<String>,
    pub discriminators: Option<Vec<String>>,
    pub wordlist: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProbeError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ProbeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("plan.target", &self.plan.target)?;
        SchedulerConfig::from_settings(self).validate()?;

        if let Some(endpoint) = &self.family.endpoint {
            validate_url("family.endpoint", endpoint)?;
        }
        if let Some(scheme) = &self.family.scheme {
            validate_one_of("family.scheme", scheme, &["http", "https"])?;
        }
        if let Some(wordlist) = &self.family.wordlist {
            validate_path("family.wordlist", wordlist)?;
        }
        if let Some(patterns) = &self.classifier.rate_limit_patterns {
            validate_patterns("classifier.rate_limit_patterns", patterns)?;
        }
        if let Some(pattern) = &self.classifier.positive_pattern {
            validate_patterns("classifier.positive_pattern", std::slice::from_ref(pattern))?;
        }
        if let Some(range) = &self.classifier.positive_status {
            validate_range("classifier.positive_status.min", range.min, 100, range.max)?;
        }
        if let Some(path) = self.output_path() {
            validate_path("output.path", path)?;
        }

        Ok(())
    }

    pub fn discriminators(&self) -> &[String] {
        self.family.discriminators.as_deref().unwrap_or(&[])
    }

    pub fn family_options(&self) -> FamilyOptions {
        FamilyOptions {
            endpoint: self.family.endpoint.clone(),
            scheme: self.family.scheme.clone(),
            request_timeout_ms: Some(self.probe_timeout_ms()),
            classifier: self.classifier.clone(),
        }
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.path.as_deref())
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output
            .as_ref()
            .and_then(|o| o.format)
            .unwrap_or(OutputFormat::Json)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl SchedulerSettings for TomlConfig {
    fn wave_size(&self) -> usize {
        self.scheduler
            .wave_size
            .unwrap_or(crate::core::scheduler::DEFAULT_WAVE_SIZE)
    }

    fn probe_timeout_ms(&self) -> u64 {
        self.scheduler
            .probe_timeout_ms
            .unwrap_or(crate::core::scheduler::DEFAULT_PROBE_TIMEOUT_MS)
    }

    fn inter_wave_delay_ms(&self) -> u64 {
        self.scheduler
            .inter_wave_delay_ms
            .unwrap_or(crate::core::scheduler::DEFAULT_INTER_WAVE_DELAY_MS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
