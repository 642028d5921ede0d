//! Scripted delivery transport for deterministic testing.
//!
//! Outcomes are programmed per channel ahead of time; each attempt consumes
//! the next scripted outcome for its channel, falling back to a channel
//! default and then the global default once the script is exhausted.

use super::{AttemptResult, DeliveryTransport};
use crate::models::{Channel, NotificationRecord};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic transport driven by programmed outcome sequences
///
/// # Example
/// ```ignore
/// // Fail the first two email attempts, then succeed on everything.
/// let transport = ScriptedTransport::new(true)
///     .with_script(Channel::Email, [false, false, true]);
/// ```
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<Channel, VecDeque<bool>>>,
    channel_defaults: HashMap<Channel, bool>,
    default_outcome: bool,
    attempts: AtomicUsize,
}

impl ScriptedTransport {
    /// Creates a transport whose every attempt yields `default_outcome`.
    pub fn new(default_outcome: bool) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            channel_defaults: HashMap::new(),
            default_outcome,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Queues an outcome sequence for `channel`, consumed one per attempt.
    pub fn with_script(self, channel: Channel, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.scripts
            .lock()
            .expect("script lock poisoned")
            .entry(channel)
            .or_default()
            .extend(outcomes);
        self
    }

    /// Fixes the fallback outcome for `channel` once its script runs out.
    pub fn with_channel_default(mut self, channel: Channel, outcome: bool) -> Self {
        self.channel_defaults.insert(channel, outcome);
        self
    }

    /// Total number of attempts made through this transport.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, channel: Channel) -> bool {
        let mut scripts = self.scripts.lock().expect("script lock poisoned");
        scripts
            .get_mut(&channel)
            .and_then(|queue| queue.pop_front())
            .or_else(|| self.channel_defaults.get(&channel).copied())
            .unwrap_or(self.default_outcome)
    }
}

#[async_trait]
impl DeliveryTransport for ScriptedTransport {
    async fn attempt(&self, record: &NotificationRecord) -> AttemptResult {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.next_outcome(record.channel) {
            AttemptResult::ok(0)
        } else {
            AttemptResult::error("scripted failure", 0)
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
