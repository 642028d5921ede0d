//! Notification data model.
//!
//! This module provides the record type tracked by the delivery engine's log,
//! the closed channel/status enums, and the aggregate types derived from the
//! log (stats, multi-channel outcomes).

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// Delivery channel for a notification
///
/// Closed set: extending it is a design change, not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Push,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Push => "push",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery lifecycle status of a notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }

    /// Whether the status is terminal (`Sent` or `Failed`).
    ///
    /// A record in a terminal status is never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Failed)
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// One notification's delivery lifecycle
///
/// Identity fields (`id`, `channel`, `recipient`, `subject`, `message`,
/// `created_at`) are fixed at creation. Only `status` and `retry_count` change
/// afterwards, and only from the retry loop that owns the record:
/// `retry_count` never decreases and never exceeds the configured maximum,
/// `status` only moves from `Pending` to a terminal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Unique record id, assigned at creation
    pub id: Uuid,
    /// Delivery channel
    pub channel: Channel,
    /// Opaque recipient identifier; address resolution is the transport's job
    pub recipient: String,
    /// Optional subject, only meaningful for channels that render one
    pub subject: Option<String>,
    /// Message body
    pub message: String,
    /// Current lifecycle status
    pub status: NotificationStatus,
    /// Number of delivery attempts already made
    pub retry_count: u32,
    /// Creation time
    pub created_at: Timestamp,
}

impl NotificationRecord {
    /// Creates a fresh `Pending` record with a generated id.
    pub(crate) fn new(
        channel: Channel,
        recipient: String,
        message: String,
        subject: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel,
            recipient,
            subject,
            message,
            status: NotificationStatus::Pending,
            retry_count: 0,
            created_at: Timestamp::now(),
        }
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Aggregate counts over the notification log
///
/// Derived by scanning the log at call time; `total` always equals
/// `sent + failed + pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub pending: usize,
}

/// Per-channel outcome of a multi-channel fan-out
///
/// Each flag is the result of that channel's independent `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiChannelOutcome {
    pub email: bool,
    pub push: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let record = NotificationRecord::new(
            Channel::Email,
            "user-1".to_string(),
            "hello".to_string(),
            None,
        );

        assert_eq!(record.status, NotificationStatus::Pending);
        assert_eq!(record.retry_count, 0);
        assert!(record.subject.is_none());
        assert!(!record.status.is_terminal());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Channel::Email.to_string(), "email");
        assert_eq!(Channel::Push.to_string(), "push");
        assert_eq!(NotificationStatus::Pending.to_string(), "pending");
        assert_eq!(NotificationStatus::Sent.to_string(), "sent");
        assert_eq!(NotificationStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(NotificationStatus::Sent.is_terminal());
        assert!(NotificationStatus::Failed.is_terminal());
        assert!(!NotificationStatus::Pending.is_terminal());
    }
}
