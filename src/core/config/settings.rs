//! # Settings File
//!
//! Top-level `triad.toml` structure.

use super::common::*;
use crate::core::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crypto: CryptoSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

pub fn example_config() -> &'static str {
    r#"# triad configuration

[crypto]
# aes-128-gcm, aes-256-gcm, aes-siv, aes-siv-512, chacha20-poly1305
cipher = "aes-256-gcm"
# Hex key, sized for the cipher (triad genkey -s <cipher>)
key = "0000000000000000000000000000000000000000000000000000000000000000"
# Or read it from a file instead:
# key_file = "/etc/triad/key"
# With neither set, TRIAD_KEY from the environment is used.

[logging]
level = "warn"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config()).unwrap();
        assert_eq!(config.crypto.cipher, CipherSuite::Aes256Gcm);
        assert_eq!(config.crypto.get_key().unwrap().len(), 32);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_defaults_and_errors() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.crypto.cipher, CipherSuite::Aes256Gcm);
        assert!(config.crypto.key.is_none());

        let config = Config::parse("[crypto]\ncipher = \"aes-siv-512\"\n").unwrap();
        assert_eq!(config.crypto.cipher.key_size(), 64);

        assert!(matches!(
            Config::parse("[crypto]\ncipher = \"rot13\"\n"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            Config::load("/nonexistent/triad.toml"),
            Err(ConfigError::ReadError(_))
        ));
    }
}
