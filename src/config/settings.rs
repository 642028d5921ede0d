//! Configuration settings structures for courier-rs
//!
//! This module defines the configuration structures that can be loaded from
//! TOML files and environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

// ============================================================================
// Default value functions
// ============================================================================

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_simulated_latency_ms() -> u64 {
    100
}

fn default_success_rate() -> f64 {
    0.9
}

// ============================================================================
// Delivery Configuration
// ============================================================================

/// Delivery engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum delivery attempts per notification
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds; the wait before retry `n` is
    /// `base_delay_ms * n` (linear growth, not exponential)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Simulated transport round-trip latency in milliseconds
    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u64,

    /// Per-attempt success probability of the simulated transport (0.0..=1.0)
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            simulated_latency_ms: default_simulated_latency_ms(),
            success_rate: default_success_rate(),
        }
    }
}

impl DeliveryConfig {
    /// Validate delivery configuration
    ///
    /// # Validation Rules
    /// - `max_retries` must be at least 1
    /// - `success_rate` must be within 0.0..=1.0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::validation(
                "delivery.max_retries",
                "Maximum retries must be at least 1.",
            ));
        }

        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(ConfigError::validation(
                "delivery.success_rate",
                "Success rate must be between 0.0 and 1.0.",
            ));
        }

        Ok(())
    }

    /// Backoff wait before the next attempt, given the number of attempts
    /// already made. Scales linearly with `attempts_made`.
    pub fn backoff_delay(&self, attempts_made: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(attempts_made as u64))
    }

    /// Simulated transport latency as a `Duration`.
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

// ============================================================================
// Root Settings
// ============================================================================

/// Root settings structure loaded by `ConfigLoader`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log filter directive (e.g. "info", "courier_rs=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Delivery engine configuration
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl Settings {
    /// Validate all settings sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delivery.validate()
    }
}
