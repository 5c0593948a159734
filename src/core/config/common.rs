//! # Common Configuration Types
//!
//! Cipher suite selection, key loading and logging settings.

use serde::Deserialize;
use std::fs;
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::constants::KEY_ENV_VAR;
use crate::core::error::ConfigError;

/// Supported cipher suites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum CipherSuite {
    #[serde(rename = "aes-128-gcm")]
    Aes128Gcm,
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    /// Two AES-128 keys
    #[serde(rename = "aes-siv")]
    AesSiv,
    /// Two AES-256 keys
    #[serde(rename = "aes-siv-512")]
    AesSiv512,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl CipherSuite {
    /// Key length in bytes
    pub fn key_size(&self) -> usize {
        match self {
            CipherSuite::Aes128Gcm => 16,
            CipherSuite::Aes256Gcm => 32,
            CipherSuite::AesSiv => 32,
            CipherSuite::AesSiv512 => 64,
            CipherSuite::ChaCha20Poly1305 => 32,
        }
    }

    /// SIV puts its tag in front of the ciphertext.
    pub fn tag_first(&self) -> bool {
        matches!(self, CipherSuite::AesSiv | CipherSuite::AesSiv512)
    }
}

impl std::fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CipherSuite::Aes128Gcm => write!(f, "AES-128-GCM"),
            CipherSuite::Aes256Gcm => write!(f, "AES-256-GCM"),
            CipherSuite::AesSiv => write!(f, "AES-SIV-256"),
            CipherSuite::AesSiv512 => write!(f, "AES-SIV-512"),
            CipherSuite::ChaCha20Poly1305 => write!(f, "ChaCha20-Poly1305"),
        }
    }
}

impl FromStr for CipherSuite {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-128-gcm" => Ok(CipherSuite::Aes128Gcm),
            "aes-256-gcm" | "aes-gcm" => Ok(CipherSuite::Aes256Gcm),
            "aes-siv" => Ok(CipherSuite::AesSiv),
            "aes-siv-512" => Ok(CipherSuite::AesSiv512),
            "chacha20-poly1305" | "chacha" => Ok(CipherSuite::ChaCha20Poly1305),
            other => Err(ConfigError::ParseError(format!("unknown cipher suite '{}'", other))),
        }
    }
}

/// Cryptographic configuration
#[derive(Debug, Deserialize, Default)]
pub struct CryptoSection {
    #[serde(default)]
    pub cipher: CipherSuite,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key_file: Option<String>,
}

impl CryptoSection {
    /// Key from `key_file`, then `key`, then the `TRIAD_KEY` environment variable.
    pub fn get_key(&self) -> Result<Zeroizing<Vec<u8>>, ConfigError> {
        let expected = self.cipher.key_size();
        if let Some(ref path) = self.key_file {
            let content = Zeroizing::new(
                fs::read_to_string(path).map_err(|e| ConfigError::ReadError(format!("Cannot read key file: {}", e)))?,
            );
            return hex_to_key(content.trim(), expected);
        }
        if let Some(ref hex) = self.key {
            return hex_to_key(hex, expected);
        }
        if let Ok(hex) = std::env::var(KEY_ENV_VAR) {
            let hex = Zeroizing::new(hex);
            return hex_to_key(&hex, expected);
        }
        Err(ConfigError::MissingKey)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            level: default_log_level(),
        }
    }
}

pub fn default_log_level() -> String {
    "warn".to_string()
}

/// Decode a hex key and check its length.
pub fn hex_to_key(hex: &str, expected: usize) -> Result<Zeroizing<Vec<u8>>, ConfigError> {
    let hex = hex.trim();
    if hex.len() != expected * 2 {
        return Err(ConfigError::InvalidKey(format!(
            "Key must be {} hex chars, got {}",
            expected * 2,
            hex.len()
        )));
    }
    hex::decode(hex)
        .map(Zeroizing::new)
        .map_err(|_| ConfigError::InvalidKey("Invalid hex character".to_string()))
}
