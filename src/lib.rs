//! Courier-RS
//!
//! In-process asynchronous notification delivery engine: bounded retries with
//! linear backoff, a silent mode that queues notifications until drained, and
//! concurrent multi-channel fan-out. The per-attempt transport is an
//! injectable trait, so callers can swap the probabilistic simulation for a
//! scripted one in tests.

pub mod config;
pub mod engine;
pub mod logger;
pub mod models;
pub mod transport;

pub use engine::NotificationEngine;
pub use models::{
    Channel, MultiChannelOutcome, NotificationRecord, NotificationStats, NotificationStatus,
};
pub use transport::{AttemptResult, DeliveryTransport, ScriptedTransport, SimulatedTransport};
