//! Simulated delivery transport.
//!
//! Stands in for a real mail/push provider: sleeps a configured latency, then
//! succeeds with a configured probability. This is the one place
//! non-determinism is deliberately injected so the retry path gets exercised.

use super::{AttemptResult, DeliveryTransport};
use crate::config::DeliveryConfig;
use crate::models::NotificationRecord;
use async_trait::async_trait;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::debug;

/// Probabilistic transport simulating a real provider call
///
/// # Example
/// ```ignore
/// let transport = SimulatedTransport::new(&config);
/// let result = transport.attempt(&record).await;
/// ```
pub struct SimulatedTransport {
    latency: Duration,
    success_rate: f64,
}

impl SimulatedTransport {
    /// Creates a transport with the latency and success rate from `config`.
    pub fn new(config: &DeliveryConfig) -> Self {
        Self {
            latency: config.simulated_latency(),
            success_rate: config.success_rate,
        }
    }
}

#[async_trait]
impl DeliveryTransport for SimulatedTransport {
    async fn attempt(&self, record: &NotificationRecord) -> AttemptResult {
        let start = Instant::now();

        // Simulated provider round-trip
        tokio::time::sleep(self.latency).await;

        let success = rand::rng().random_bool(self.success_rate);
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            id = %record.id,
            channel = %record.channel,
            success,
            "simulated delivery attempt"
        );

        if success {
            AttemptResult::ok(duration_ms)
        } else {
            AttemptResult::error("simulated transport failure", duration_ms)
        }
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
