//! Notification delivery engine.
//!
//! Accepts outbound notifications on the `email` and `push` channels, runs
//! each through a bounded-retry delivery loop with linear backoff, supports a
//! silent mode that queues records until drained, and fans a single logical
//! notification out to both channels concurrently.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::DeliveryConfig;
use crate::models::{
    Channel, MultiChannelOutcome, NotificationRecord, NotificationStats, NotificationStatus,
};
use crate::transport::{DeliveryTransport, SimulatedTransport};

/// One slot in the notification log.
///
/// The claim flag enforces the single-writer discipline: a retry loop must
/// win the compare-exchange before touching the record, so each record is
/// mutated by exactly one loop for its whole lifetime. Everything else only
/// reads.
struct LogEntry {
    record: RwLock<NotificationRecord>,
    claimed: AtomicBool,
}

impl LogEntry {
    fn new(record: NotificationRecord) -> Arc<Self> {
        Arc::new(Self {
            record: RwLock::new(record),
            claimed: AtomicBool::new(false),
        })
    }
}

/// Asynchronous notification delivery engine
///
/// A single instance is shared by the whole process: construct it once and
/// hand out clones (cloning is cheap, all state lives behind `Arc`). The
/// notification log grows without bound until [`clear_notifications`] is
/// called; it is an in-memory observability structure, not durable storage.
///
/// [`clear_notifications`]: NotificationEngine::clear_notifications
///
/// # Example
/// ```ignore
/// let engine = NotificationEngine::with_simulated_transport(DeliveryConfig::default());
/// let delivered = engine
///     .send(Channel::Email, "user-1", "Your meeting was booked", None)
///     .await;
/// ```
#[derive(Clone)]
pub struct NotificationEngine {
    log: Arc<RwLock<Vec<Arc<LogEntry>>>>,
    silent: Arc<AtomicBool>,
    transport: Arc<dyn DeliveryTransport>,
    config: DeliveryConfig,
}

impl NotificationEngine {
    /// Creates an engine delivering through the given transport.
    ///
    /// # Arguments
    /// * `config` - Retry/backoff configuration
    /// * `transport` - Per-attempt delivery implementation
    pub fn new(config: DeliveryConfig, transport: Arc<dyn DeliveryTransport>) -> Self {
        Self {
            log: Arc::new(RwLock::new(Vec::new())),
            silent: Arc::new(AtomicBool::new(false)),
            transport,
            config,
        }
    }

    /// Creates an engine wired to the probabilistic [`SimulatedTransport`].
    pub fn with_simulated_transport(config: DeliveryConfig) -> Self {
        let transport = Arc::new(SimulatedTransport::new(&config));
        Self::new(config, transport)
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Sends one notification on one channel
    ///
    /// The record is created `Pending` and appended to the log before any
    /// delivery work happens, so it is observable even while in flight.
    /// Under silent mode the record stays `Pending` and no attempt is made;
    /// otherwise the retry loop runs to completion before this returns.
    ///
    /// # Returns
    /// `true` if silent mode absorbed the notification or delivery reached
    /// `Sent`; `false` if every attempt failed. No error escapes: attempt
    /// faults only show up in the record's `status` and `retry_count`.
    pub async fn send(
        &self,
        channel: Channel,
        recipient: &str,
        message: &str,
        subject: Option<&str>,
    ) -> bool {
        let record = NotificationRecord::new(
            channel,
            recipient.to_string(),
            message.to_string(),
            subject.map(str::to_string),
        );
        let id = record.id;
        let entry = LogEntry::new(record);
        self.log.write().await.push(entry.clone());

        if self.silent.load(Ordering::SeqCst) {
            debug!(%id, %channel, recipient, "silent mode on, notification queued");
            return true;
        }

        self.deliver_with_retry(entry).await
    }

    /// Fans one logical notification out to every channel
    ///
    /// Runs one `send` per channel concurrently; one channel's retries never
    /// delay or affect the other's. Completes once both sends have reached
    /// their outcome.
    pub async fn send_multi_channel(
        &self,
        recipient: &str,
        message: &str,
        subject: Option<&str>,
    ) -> MultiChannelOutcome {
        let (email, push) = futures::future::join(
            self.send(Channel::Email, recipient, message, subject),
            self.send(Channel::Push, recipient, message, subject),
        )
        .await;

        MultiChannelOutcome { email, push }
    }

    // ========================================================================
    // Silent Mode
    // ========================================================================

    /// Flips the engine-wide silent mode flag
    ///
    /// Turning the flag off drains the queue: every record still `Pending`
    /// gets its retry loop spawned, in log insertion order. The drain is
    /// fire-and-forget; this method does not wait for outcomes.
    pub async fn set_silent_mode(&self, enabled: bool) {
        let was_enabled = self.silent.swap(enabled, Ordering::SeqCst);
        info!(enabled, "silent mode changed");

        if was_enabled && !enabled {
            self.drain().await;
        }
    }

    /// Spawns a retry loop for every pending, unclaimed record.
    async fn drain(&self) {
        let entries: Vec<Arc<LogEntry>> = self.log.read().await.to_vec();

        let mut drained = 0usize;
        for entry in entries {
            if entry.claimed.load(Ordering::SeqCst) {
                continue;
            }
            if entry.record.read().await.status != NotificationStatus::Pending {
                continue;
            }

            let engine = self.clone();
            tokio::spawn(async move {
                engine.deliver_with_retry(entry).await;
            });
            drained += 1;
        }

        info!(drained, "draining queued notifications");
    }

    // ========================================================================
    // Retry Loop
    // ========================================================================

    /// Drives one record to a terminal state.
    ///
    /// Attempts delivery while `retry_count < max_retries`, sleeping
    /// `base_delay * retry_count` between failed attempts (linear backoff).
    /// Success marks the record `Sent`; exhausting the attempts marks it
    /// `Failed`. Runs to a terminal state once started, with no cancellation.
    async fn deliver_with_retry(&self, entry: Arc<LogEntry>) -> bool {
        if entry
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Another loop already owns this record (racing drains).
            return entry.record.read().await.status == NotificationStatus::Sent;
        }

        let max_retries = self.config.max_retries;

        loop {
            let snapshot = entry.record.read().await.clone();
            if snapshot.retry_count >= max_retries {
                break;
            }

            let result = self.transport.attempt(&snapshot).await;

            if result.success {
                let mut record = entry.record.write().await;
                record.status = NotificationStatus::Sent;
                info!(
                    id = %record.id,
                    channel = %record.channel,
                    recipient = %record.recipient,
                    retries = record.retry_count,
                    transport = self.transport.name(),
                    "notification sent"
                );
                return true;
            }

            let retry_count = {
                let mut record = entry.record.write().await;
                record.retry_count += 1;
                record.retry_count
            };
            warn!(
                id = %snapshot.id,
                channel = %snapshot.channel,
                attempt = retry_count,
                max_retries,
                response = result.response.as_deref().unwrap_or(""),
                "delivery attempt failed"
            );

            if retry_count < max_retries {
                tokio::time::sleep(self.config.backoff_delay(retry_count)).await;
            }
        }

        let mut record = entry.record.write().await;
        record.status = NotificationStatus::Failed;
        warn!(
            id = %record.id,
            channel = %record.channel,
            recipient = %record.recipient,
            retries = record.retry_count,
            "notification failed, retries exhausted"
        );
        false
    }

    // ========================================================================
    // Log Access
    // ========================================================================

    /// Snapshot of the notification log, in insertion order
    ///
    /// The returned records are detached copies; mutating them has no effect
    /// on engine state.
    pub async fn notifications(&self) -> Vec<NotificationRecord> {
        let log = self.log.read().await;
        let mut snapshot = Vec::with_capacity(log.len());
        for entry in log.iter() {
            snapshot.push(entry.record.read().await.clone());
        }
        snapshot
    }

    /// Aggregate counts derived by scanning the log at call time
    pub async fn stats(&self) -> NotificationStats {
        let log = self.log.read().await;
        let mut stats = NotificationStats::default();
        for entry in log.iter() {
            stats.total += 1;
            match entry.record.read().await.status {
                NotificationStatus::Sent => stats.sent += 1,
                NotificationStatus::Failed => stats.failed += 1,
                NotificationStatus::Pending => stats.pending += 1,
            }
        }
        stats
    }

    /// Empties the log. Intended for test isolation and resets, not for
    /// normal application flow.
    pub async fn clear_notifications(&self) {
        self.log.write().await.clear();
        debug!("notification log cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;
    use std::time::Duration;

    fn engine_with(transport: Arc<ScriptedTransport>) -> NotificationEngine {
        NotificationEngine::new(DeliveryConfig::default(), transport)
    }

    async fn wait_until_settled(engine: &NotificationEngine) {
        loop {
            let records = engine.notifications().await;
            if records.iter().all(|r| r.status.is_terminal()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_succeeds_first_attempt() {
        let transport = Arc::new(ScriptedTransport::new(true));
        let engine = engine_with(transport.clone());

        let delivered = engine
            .send(Channel::Email, "user-1", "Your meeting was booked", None)
            .await;

        assert!(delivered);
        let records = engine.notifications().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, NotificationStatus::Sent);
        assert_eq!(records[0].retry_count, 0);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_twice_then_succeeds() {
        let transport =
            Arc::new(ScriptedTransport::new(true).with_script(Channel::Push, [false, false, true]));
        let engine = engine_with(transport);

        let delivered = engine
            .send(
                Channel::Push,
                "student-42",
                "Your meeting was cancelled",
                Some("Meeting Cancelled"),
            )
            .await;

        assert!(delivered);
        let records = engine.notifications().await;
        assert_eq!(records[0].status, NotificationStatus::Sent);
        assert_eq!(records[0].retry_count, 2);
        assert_eq!(records[0].subject.as_deref(), Some("Meeting Cancelled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_marks_failed() {
        let transport = Arc::new(ScriptedTransport::new(false));
        let engine = engine_with(transport.clone());

        let delivered = engine
            .send(
                Channel::Push,
                "student-42",
                "Your meeting was cancelled",
                Some("Meeting Cancelled"),
            )
            .await;

        assert!(!delivered);
        let records = engine.notifications().await;
        assert_eq!(records[0].status, NotificationStatus::Failed);
        assert_eq!(records[0].retry_count, engine.config.max_retries);
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_mode_queues_without_attempting() {
        let transport = Arc::new(ScriptedTransport::new(true));
        let engine = engine_with(transport.clone());

        engine.set_silent_mode(true).await;
        let absorbed = engine.send(Channel::Email, "u1", "hello", None).await;

        assert!(absorbed);
        let records = engine.notifications().await;
        assert_eq!(records[0].status, NotificationStatus::Pending);
        assert_eq!(records[0].retry_count, 0);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_on_unmute_settles_every_record() {
        let transport = Arc::new(
            ScriptedTransport::new(true).with_channel_default(Channel::Push, false),
        );
        let engine = engine_with(transport);

        engine.set_silent_mode(true).await;
        engine.send(Channel::Email, "u1", "first", None).await;
        engine.send(Channel::Push, "u2", "second", None).await;
        engine.send(Channel::Email, "u3", "third", None).await;
        assert_eq!(engine.stats().await.pending, 3);

        engine.set_silent_mode(false).await;
        wait_until_settled(&engine).await;

        let stats = engine.stats().await;
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.sent, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_is_idempotent_across_toggles() {
        let transport = Arc::new(ScriptedTransport::new(true));
        let engine = engine_with(transport.clone());

        engine.set_silent_mode(true).await;
        engine.send(Channel::Email, "u1", "hello", None).await;

        engine.set_silent_mode(false).await;
        engine.set_silent_mode(true).await;
        engine.set_silent_mode(false).await;
        wait_until_settled(&engine).await;

        // The record went through exactly one retry loop.
        assert_eq!(transport.attempts(), 1);
        assert_eq!(engine.stats().await.sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_channel_outcomes_are_independent() {
        let transport = Arc::new(
            ScriptedTransport::new(true).with_channel_default(Channel::Email, false),
        );
        let engine = engine_with(transport);

        let outcome = engine
            .send_multi_channel("user-1", "Progress updated", Some("Progress"))
            .await;

        assert_eq!(
            outcome,
            MultiChannelOutcome {
                email: false,
                push: true
            }
        );

        let records = engine.notifications().await;
        assert_eq!(records.len(), 2);
        let email = records.iter().find(|r| r.channel == Channel::Email).unwrap();
        let push = records.iter().find(|r| r.channel == Channel::Push).unwrap();
        assert_eq!(email.status, NotificationStatus::Failed);
        assert_eq!(email.retry_count, 3);
        assert_eq!(push.status, NotificationStatus::Sent);
        assert_eq!(push.retry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_preserves_insertion_order_and_identity() {
        let transport = Arc::new(
            ScriptedTransport::new(true).with_script(Channel::Email, [false, true]),
        );
        let engine = engine_with(transport);

        // The email record needs a retry, the push record does not; the log
        // still lists them in send order.
        engine.send(Channel::Email, "u1", "slow", None).await;
        engine.send(Channel::Push, "u2", "fast", None).await;

        let before = engine.notifications().await;
        assert_eq!(before[0].channel, Channel::Email);
        assert_eq!(before[1].channel, Channel::Push);

        // Identity fields never change once appended.
        let after = engine.notifications().await;
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.recipient, b.recipient);
            assert_eq!(a.message, b.message);
            assert_eq!(a.created_at, b.created_at);
        }

        // Mutating a snapshot must not touch engine state.
        let mut detached = engine.notifications().await;
        detached.clear();
        assert_eq!(engine.stats().await.total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_consistency() {
        let transport = Arc::new(
            ScriptedTransport::new(true).with_channel_default(Channel::Push, false),
        );
        let engine = engine_with(transport);

        engine.send(Channel::Email, "u1", "a", None).await;
        engine.send(Channel::Push, "u2", "b", None).await;
        engine.set_silent_mode(true).await;
        engine.send(Channel::Email, "u3", "c", None).await;

        let stats = engine.stats().await;
        assert_eq!(stats.total, stats.sent + stats.failed + stats.pending);
        assert_eq!(stats.total, engine.notifications().await.len());
        assert_eq!(stats.pending, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_resets_log_and_stats() {
        let transport = Arc::new(ScriptedTransport::new(true));
        let engine = engine_with(transport);

        engine.send(Channel::Email, "u1", "a", None).await;
        engine.send_multi_channel("u2", "b", None).await;
        assert!(engine.stats().await.total > 0);

        engine.clear_notifications().await;

        assert!(engine.notifications().await.is_empty());
        assert_eq!(engine.stats().await, NotificationStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_iff_retry_count_at_max() {
        let transport = Arc::new(
            ScriptedTransport::new(true)
                .with_script(Channel::Email, [false, false, false, false, true])
                .with_channel_default(Channel::Push, false),
        );
        let engine = engine_with(transport);

        engine.send(Channel::Email, "u1", "a", None).await;
        engine.send(Channel::Push, "u2", "b", None).await;
        engine.send(Channel::Email, "u3", "c", None).await;

        let max = engine.config.max_retries;
        for record in engine.notifications().await {
            assert!(record.retry_count <= max);
            match record.status {
                NotificationStatus::Failed => assert_eq!(record.retry_count, max),
                NotificationStatus::Sent => assert!(record.retry_count < max),
                NotificationStatus::Pending => panic!("no record should still be pending"),
            }
        }
    }
}
