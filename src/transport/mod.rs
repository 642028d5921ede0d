//! Delivery transport abstraction.
//!
//! The engine performs every delivery attempt through the `DeliveryTransport`
//! trait, so the per-attempt behavior is an injectable dependency: production
//! wiring supplies a transport-backed implementation, tests supply a scripted
//! one.

mod scripted;
mod simulated;

pub use scripted::ScriptedTransport;
pub use simulated::SimulatedTransport;

use crate::models::NotificationRecord;
use async_trait::async_trait;

/// Result of one delivery attempt
#[derive(Debug, Clone)]
pub struct AttemptResult {
    /// Whether the attempt succeeded
    pub success: bool,
    /// Transport response body or error message, if any
    pub response: Option<String>,
    /// Time taken for the attempt in milliseconds
    pub duration_ms: u64,
}

impl AttemptResult {
    /// A successful attempt with no response body.
    pub fn ok(duration_ms: u64) -> Self {
        Self {
            success: true,
            response: None,
            duration_ms,
        }
    }

    /// A failed attempt carrying an error description.
    pub fn error(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            response: Some(message.into()),
            duration_ms,
        }
    }
}

/// Trait for per-attempt delivery transports
///
/// Uses `async_trait` to support async methods with dynamic dispatch.
/// All transports must be Send + Sync for use in async contexts.
///
/// A transport never returns an error: any fault during an attempt is
/// absorbed into an `AttemptResult` with `success: false`, so the retry loop
/// is the only place that decides what a failure means.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Performs one delivery attempt for the given record.
    async fn attempt(&self, record: &NotificationRecord) -> AttemptResult;

    /// Returns the transport name for logging/debugging.
    fn name(&self) -> &'static str;
}
