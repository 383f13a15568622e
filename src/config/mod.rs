pub mod cli;
pub mod toml_config;

use crate::app::families::ProbeFamily;
use crate::core::Storage;
use crate::utils::error::Result;

#[cfg(feature = "cli")]
pub use self::flags::CliConfig;

/// Picks the discriminator list: explicit values, then a wordlist file, then the family defaults.
pub async fn resolve_discriminators<S: Storage>(
    storage: &S,
    explicit: &[String],
    wordlist: Option<&str>,
    family: ProbeFamily,
) -> Result<Vec<String>> {
    let explicit: Vec<String> = explicit
        .iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    if !explicit.is_empty() {
        return Ok(explicit);
    }

    if let Some(path) = wordlist {
        let data = storage.read_file(path).await?;
        let entries = parse_wordlist(&String::from_utf8_lossy(&data));
        tracing::info!(path, entries = entries.len(), "📂 Loaded wordlist");
        return Ok(entries);
    }

    Ok(family.default_discriminators())
}

/// One entry per line; blank lines and `#` comments are skipped.
pub fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(feature = "cli")]
mod flags {
    use crate::adapters::report_writer::OutputFormat;
    use crate::app::families::{FamilyOptions, ProbeFamily};
    use crate::core::scheduler::{
        DEFAULT_INTER_WAVE_DELAY_MS, DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_WAVE_SIZE,
    };
    use crate::core::SchedulerSettings;
    use crate::utils::error::Result;
    use crate::utils::validation::*;
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "recon-probe")]
    #[command(about = "Bounded concurrent probing of a single target")]
    pub struct CliConfig {
        /// Host to probe; scheme and path are stripped
        #[arg(long)]
        pub target: String,

        #[arg(long, value_enum, default_value = "paths")]
        pub family: ProbeFamily,

        /// Comma-separated record types, paths, port slices or schemes
        #[arg(long, value_delimiter = ',')]
        pub discriminators: Vec<String>,

        /// File with one discriminator per line
        #[arg(long)]
        pub wordlist: Option<String>,

        /// Override the family's API endpoint
        #[arg(long)]
        pub endpoint: Option<String>,

        /// Scheme for path probes
        #[arg(long)]
        pub scheme: Option<String>,

        #[arg(long, default_value_t = DEFAULT_WAVE_SIZE)]
        pub wave_size: usize,

        #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
        pub probe_timeout_ms: u64,

        #[arg(long, default_value_t = DEFAULT_INTER_WAVE_DELAY_MS)]
        pub inter_wave_delay_ms: u64,

        /// Write the report to this file instead of stdout
        #[arg(long)]
        pub output: Option<String>,

        #[arg(long, value_enum, default_value = "json")]
        pub format: OutputFormat,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub log_json: bool,

        #[arg(long, help = "Log memory and timing after each wave")]
        pub monitor: bool,
    }

    impl CliConfig {
        pub fn family_options(&self) -> FamilyOptions {
            FamilyOptions {
                endpoint: self.endpoint.clone(),
                scheme: self.scheme.clone(),
                request_timeout_ms: Some(self.probe_timeout_ms),
                classifier: Default::default(),
            }
        }
    }

    impl SchedulerSettings for CliConfig {
        fn wave_size(&self) -> usize {
            self.wave_size
        }

        fn probe_timeout_ms(&self) -> u64 {
            self.probe_timeout_ms
        }

        fn inter_wave_delay_ms(&self) -> u64 {
            self.inter_wave_delay_ms
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_non_empty_string("target", &self.target)?;
            validate_range("wave_size", self.wave_size, 1, 100)?;
            validate_positive_number("probe_timeout_ms", self.probe_timeout_ms, 1)?;

            if let Some(endpoint) = &self.endpoint {
                validate_url("endpoint", endpoint)?;
            }
            if let Some(scheme) = &self.scheme {
                validate_one_of("scheme", scheme, &["http", "https"])?;
            }
            if let Some(wordlist) = &self.wordlist {
                validate_path("wordlist", wordlist)?;
            }
            if let Some(output) = &self.output {
                validate_path("output", output)?;
            }

            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use tempfile::TempDir;

    #[test]
    fn test_parse_wordlist_skips_comments_and_blanks() {
        let content = "# admin panels\n/admin\n\n  /login  \n#/skip\n/.env\n";
        assert_eq!(parse_wordlist(content), vec!["/admin", "/login", "/.env"]);
    }

    #[tokio::test]
    async fn test_resolve_prefers_explicit_then_wordlist_then_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("paths.txt"), "/a\n/b\n").unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());

        let explicit = vec!["/x".to_string()];
        let resolved =
            resolve_discriminators(&storage, &explicit, Some("paths.txt"), ProbeFamily::Paths)
                .await
                .unwrap();
        assert_eq!(resolved, vec!["/x"]);

        let resolved = resolve_discriminators(&storage, &[], Some("paths.txt"), ProbeFamily::Paths)
            .await
            .unwrap();
        assert_eq!(resolved, vec!["/a", "/b"]);

        let resolved = resolve_discriminators(&storage, &[], None, ProbeFamily::Dns)
            .await
            .unwrap();
        assert_eq!(resolved.len(), 7);
    }
}
