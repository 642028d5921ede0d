//! Configuration management module for courier-rs
//!
//! This module provides layered configuration loading with support for:
//! - A TOML configuration file
//! - Environment variable overrides
//!
//! # Configuration Priority (lowest to highest)
//! 1. Built-in defaults
//! 2. TOML configuration file (optional)
//! 3. `COURIER_*` environment variables

pub mod error;
pub mod loader;
pub mod settings;

// Re-export public types
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{DeliveryConfig, Settings};
