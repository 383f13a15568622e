use crate::core::{Report, Storage};
use crate::utils::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Renders a finished report and persists it through a [`Storage`] backend.
pub struct ReportWriter<S: Storage> {
    storage: S,
    format: OutputFormat,
}

impl<S: Storage> ReportWriter<S> {
    pub fn new(storage: S, format: OutputFormat) -> Self {
        Self { storage, format }
    }

    pub async fn write(&self, report: &Report, path: &str) -> Result<usize> {
        let data = render(report, self.format)?;
        tracing::debug!(path, bytes = data.len(), format = ?self.format, "Writing report");
        self.storage.write_file(path, &data).await?;
        tracing::info!(path, "💾 Report saved");
        Ok(data.len())
    }
}

pub fn render(report: &Report, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(report)?),
        OutputFormat::Csv => render_csv(report),
        OutputFormat::Text => Ok(render_text(report).into_bytes()),
    }
}

fn render_csv(report: &Report) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["index", "discriminator", "bucket", "kind", "detail"])?;

    for result in report.ordered_results() {
        wtr.write_record([
            result.index.to_string(),
            result.spec.discriminator.clone(),
            result.outcome.bucket().to_string(),
            result.outcome.kind().to_string(),
            result.outcome.detail().unwrap_or_default().to_string(),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| ProbeError::IoError(e.into_error()))
}

fn render_text(report: &Report) -> String {
    let summary = report.summary();
    let mut lines = vec![
        format!("Target: {}", report.target),
        format!(
            "Issued: {} in {} wave(s), {} ms",
            report.total_issued,
            report.waves,
            (report.finished_at - report.started_at).num_milliseconds()
        ),
        format!(
            "Positives: {}  Negatives: {}  Rate limited: {}  Timed out: {}  Transport errors: {}",
            summary.positives,
            summary.negatives,
            summary.rate_limited,
            summary.timed_out,
            summary.transport_errors
        ),
    ];

    for (title, results) in [("Positives", &report.positives), ("Errors", &report.errors)] {
        if results.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{}:", title));
        lines.extend(results.iter().map(|result| {
            let head = format!(
                "  [{}] {} ({})",
                result.index,
                result.spec.discriminator,
                result.outcome.kind()
            );
            match result.outcome.detail() {
                Some(detail) => format!("{}: {}", head, detail),
                None => head,
            }
        }));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
