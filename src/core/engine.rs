use crate::core::aggregator::Aggregator;
use crate::core::classifier::classify;
use crate::core::scheduler::{BatchScheduler, SchedulerConfig};
use crate::core::target::normalize;
use crate::domain::model::{Outcome, ProbeResult, ProbeSpec, Report};
use crate::domain::ports::{ClassifierRule, ProbeCapability, SchedulerSettings};
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Wires target normalization, the batch scheduler, the classifier and the aggregator.
pub struct ProbeEngine {
    config: SchedulerConfig,
    monitor: RunMonitor,
    cancel: Option<CancellationToken>,
}

impl ProbeEngine {
    pub fn new<S: SchedulerSettings + ?Sized>(settings: &S) -> Self {
        Self::new_with_monitoring(settings, false)
    }

    pub fn new_with_monitoring<S: SchedulerSettings + ?Sized>(
        settings: &S,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            config: SchedulerConfig::from_settings(settings),
            monitor: RunMonitor::new(monitor_enabled),
            cancel: None,
        }
    }

    /// Checked between waves; specs not yet issued are reported as cancelled transport errors.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fails only on an invalid target or scheduler configuration.
    /// Per-probe failures end up in the report's `errors` bucket.
    pub async fn run(
        &self,
        target: &str,
        discriminators: &[String],
        capability: Arc<dyn ProbeCapability>,
        rule: &dyn ClassifierRule,
    ) -> Result<Report> {
        let target = normalize(target)?;
        let mut scheduler = BatchScheduler::new(self.config)?;
        if let Some(token) = &self.cancel {
            scheduler = scheduler.with_cancellation(token.clone());
        }

        let specs: Vec<ProbeSpec> = discriminators
            .iter()
            .map(|d| ProbeSpec {
                target: target.clone(),
                discriminator: d.clone(),
            })
            .collect();
        let total = specs.len();

        tracing::info!(
            target = %target,
            rule = rule.name(),
            probes = total,
            wave_size = self.config.wave_size,
            "🚀 Starting probe batch"
        );

        let mut aggregator = Aggregator::new(target.clone(), total);
        let summary = scheduler
            .run(&specs, capability, |wave| {
                let classified: Vec<ProbeResult> = wave
                    .results
                    .into_iter()
                    .map(|(index, raw)| {
                        let outcome = classify(&raw, rule);
                        tracing::debug!(
                            index,
                            discriminator = %specs[index].discriminator,
                            outcome = %outcome.kind(),
                            "Probe classified"
                        );
                        ProbeResult {
                            index,
                            spec: specs[index].clone(),
                            outcome,
                        }
                    })
                    .collect();
                aggregator.fold_wave(classified);
                self.monitor
                    .log_wave(wave.number + 1, aggregator.folded(), total);
            })
            .await;

        if let Some(first_skipped) = summary.cancelled_at {
            for (index, spec) in specs.iter().enumerate().skip(first_skipped) {
                aggregator.fold(ProbeResult {
                    index,
                    spec: spec.clone(),
                    outcome: Outcome::TransportError("cancelled".to_string()),
                });
            }
        }

        let report = aggregator.finish();
        let counts = report.summary();
        tracing::info!(
            target = %report.target,
            waves = report.waves,
            positives = counts.positives,
            negatives = counts.negatives,
            errors = report.errors.len(),
            rate_limited = counts.rate_limited,
            "✅ Probe batch finished"
        );
        if counts.rate_limited > 0 {
            tracing::warn!(
                rate_limited = counts.rate_limited,
                "Upstream rate limiting detected; wait before retrying"
            );
        }
        self.monitor.log_final_stats();

        Ok(report)
    }
}

/// One-shot form of [`ProbeEngine::run`] with explicit scheduler settings.
pub async fn run_probes(
    target: &str,
    discriminators: &[String],
    capability: Arc<dyn ProbeCapability>,
    rule: &dyn ClassifierRule,
    config: SchedulerConfig,
) -> Result<Report> {
    ProbeEngine::new(&config)
        .run(target, discriminators, capability, rule)
        .await
}
