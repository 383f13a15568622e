use crate::domain::model::{ProbeSpec, RawResult, TransportFailure};
use crate::domain::ports::{ProbeCapability, SchedulerSettings};
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, Validate};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_WAVE_SIZE: usize = 5;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_INTER_WAVE_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub wave_size: usize,
    pub probe_timeout_ms: u64,
    pub inter_wave_delay_ms: u64,
}

impl SchedulerConfig {
    pub fn from_settings<S: SchedulerSettings + ?Sized>(settings: &S) -> Self {
        Self {
            wave_size: settings.wave_size(),
            probe_timeout_ms: settings.probe_timeout_ms(),
            inter_wave_delay_ms: settings.inter_wave_delay_ms(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            wave_size: DEFAULT_WAVE_SIZE,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            inter_wave_delay_ms: DEFAULT_INTER_WAVE_DELAY_MS,
        }
    }
}

impl SchedulerSettings for SchedulerConfig {
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

impl Validate for SchedulerConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("scheduler.wave_size", self.wave_size as u64, 1)?;
        validate_positive_number("scheduler.probe_timeout_ms", self.probe_timeout_ms, 1)?;
        Ok(())
    }
}

/// Raw results of one settled wave, paired with their input index.
#[derive(Debug)]
pub struct Wave {
    pub number: usize,
    pub results: Vec<(usize, RawResult)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub waves_run: usize,
    /// Index of the first spec that was never issued because the run was cancelled.
    pub cancelled_at: Option<usize>,
}

/// Runs specs in consecutive waves: concurrent inside a wave, sequential across waves,
/// with a pause between waves.
pub struct BatchScheduler {
    config: SchedulerConfig,
    cancel: Option<CancellationToken>,
}

impl BatchScheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Consecutive index ranges of at most `wave_size` specs.
    pub fn plan(&self, total: usize) -> Vec<Range<usize>> {
        (0..total)
            .step_by(self.config.wave_size)
            .map(|start| start..(start + self.config.wave_size).min(total))
            .collect()
    }

    /// `on_wave` is called once per wave, only after every probe in it has settled.
    pub async fn run<F>(
        &self,
        specs: &[ProbeSpec],
        capability: Arc<dyn ProbeCapability>,
        mut on_wave: F,
    ) -> ScheduleSummary
    where
        F: FnMut(Wave),
    {
        let plan = self.plan(specs.len());
        let timeout = Duration::from_millis(self.config.probe_timeout_ms);
        let delay = Duration::from_millis(self.config.inter_wave_delay_ms);
        let mut waves_run = 0;

        for (number, range) in plan.into_iter().enumerate() {
            if number > 0 && !self.pause(delay).await {
                tracing::warn!(
                    waves_run,
                    remaining = specs.len() - range.start,
                    "Batch cancelled between waves"
                );
                return ScheduleSummary {
                    waves_run,
                    cancelled_at: Some(range.start),
                };
            }

            tracing::debug!(
                wave = number + 1,
                first = range.start,
                size = range.len(),
                "Dispatching wave"
            );

            let handles: Vec<_> = specs[range.clone()]
                .iter()
                .cloned()
                .map(|spec| {
                    let capability = Arc::clone(&capability);
                    tokio::spawn(execute_probe(capability, spec, timeout))
                })
                .collect();

            let results = join_all(handles)
                .await
                .into_iter()
                .zip(range)
                .map(|(joined, index)| {
                    let raw = joined.unwrap_or_else(|e| {
                        tracing::warn!(index, error = %e, "Probe task failed");
                        RawResult::Failure(TransportFailure::Other(format!(
                            "probe task failed: {}",
                            e
                        )))
                    });
                    (index, raw)
                })
                .collect();

            waves_run += 1;
            on_wave(Wave { number, results });
        }

        ScheduleSummary {
            waves_run,
            cancelled_at: None,
        }
    }

    /// Sleeps for the inter-wave delay. Returns `false` if cancellation was observed.
    async fn pause(&self, delay: Duration) -> bool {
        match &self.cancel {
            Some(token) => {
                if token.is_cancelled() {
                    return false;
                }
                tokio::select! {
                    _ = token.cancelled() => false,
                    _ = tokio::time::sleep(delay) => true,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }
}

async fn execute_probe(
    capability: Arc<dyn ProbeCapability>,
    spec: ProbeSpec,
    timeout: Duration,
) -> RawResult {
    match tokio::time::timeout(timeout, capability.execute(&spec.target, &spec.discriminator))
        .await
    {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            tracing::warn!(discriminator = %spec.discriminator, error = %e, "Probe failed");
            RawResult::Failure(TransportFailure::Other(e.to_string()))
        }
        Err(_) => {
            tracing::debug!(discriminator = %spec.discriminator, "Probe timed out");
            RawResult::Failure(TransportFailure::Timeout)
        }
    }
}
