use crate::domain::model::{RawResult, ResponseEnvelope, Target, Verdict};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait SchedulerSettings: Send + Sync {
    fn wave_size(&self) -> usize;
    fn probe_timeout_ms(&self) -> u64;
    fn inter_wave_delay_ms(&self) -> u64;
}

/// Issues one probe against the network. Returning `Err` is treated like a transport failure.
#[async_trait]
pub trait ProbeCapability: Send + Sync {
    async fn execute(&self, target: &Target, discriminator: &str) -> Result<RawResult>;
}

pub trait ClassifierRule: Send + Sync {
    fn name(&self) -> &str;

    /// Checked before `judge`; a rate-limited body is not real probe data.
    fn is_rate_limited(&self, response: &ResponseEnvelope) -> bool;

    fn judge(&self, response: &ResponseEnvelope) -> Verdict;
}
