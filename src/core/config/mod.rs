//! # Configuration Module
//!
//! TOML-based configuration for the `triad` binary.

mod common;
mod settings;

pub use common::{default_log_level, hex_to_key, CipherSuite, CryptoSection, LoggingSection};
pub use settings::{example_config, Config};
