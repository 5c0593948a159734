//! # Error Module
//!
//! Unified error handling for the AEAD core, configuration and CLI.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum TriadError {
    Io(io::Error),
    Crypto(CryptoError),
    Config(ConfigError),
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    InvalidKeyLength { expected: usize, got: usize },
    InvalidNonceLength { expected: usize, got: usize },
    InvalidTagLength { expected: usize, got: usize },
    /// An operation was called in a state that does not allow it
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    MissingNonce,
    MissingTag,
    LengthMismatch { expected: u64, got: u64 },
    TooManyComponents { max: usize },
    /// The block counter would wrap; the session is unusable afterwards
    KeystreamExhausted,
    AuthenticationFailed,
    /// A `Verified` token was presented for output of a different message
    ForeignProof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ReadError(String),
    ParseError(String),
    InvalidKey(String),
    MissingKey,
}

impl std::error::Error for TriadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TriadError::Io(e) => Some(e),
            TriadError::Crypto(e) => Some(e),
            TriadError::Config(e) => Some(e),
            TriadError::Encoding(_) => None,
        }
    }
}

impl std::error::Error for CryptoError {}

impl std::error::Error for ConfigError {}

impl fmt::Display for TriadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriadError::Io(e) => write!(f, "I/O error: {}", e),
            TriadError::Crypto(e) => write!(f, "Crypto error: {}", e),
            TriadError::Config(e) => write!(f, "Config error: {}", e),
            TriadError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidKeyLength { expected, got } => {
                write!(f, "invalid key length: expected {}, got {}", expected, got)
            }
            CryptoError::InvalidNonceLength { expected, got } => {
                write!(f, "invalid nonce length: expected {}, got {}", expected, got)
            }
            CryptoError::InvalidTagLength { expected, got } => {
                write!(f, "invalid tag length: expected {}, got {}", expected, got)
            }
            CryptoError::InvalidState { operation, state } => {
                write!(f, "{} is not allowed in state {}", operation, state)
            }
            CryptoError::MissingNonce => write!(f, "nonce has not been set"),
            CryptoError::MissingTag => write!(f, "expected tag has not been set"),
            CryptoError::LengthMismatch { expected, got } => {
                write!(f, "length mismatch: registered {} bytes, got {}", expected, got)
            }
            CryptoError::TooManyComponents { max } => {
                write!(f, "too many authenticated components (max {})", max)
            }
            CryptoError::KeystreamExhausted => write!(f, "keystream exhausted"),
            CryptoError::AuthenticationFailed => write!(f, "authentication failed"),
            CryptoError::ForeignProof => write!(f, "verification proof belongs to another message"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
            ConfigError::MissingKey => write!(f, "No key configured"),
        }
    }
}

impl From<io::Error> for TriadError {
    fn from(e: io::Error) -> Self {
        TriadError::Io(e)
    }
}

impl From<CryptoError> for TriadError {
    fn from(e: CryptoError) -> Self {
        TriadError::Crypto(e)
    }
}

impl From<ConfigError> for TriadError {
    fn from(e: ConfigError) -> Self {
        TriadError::Config(e)
    }
}

impl From<hex::FromHexError> for TriadError {
    fn from(e: hex::FromHexError) -> Self {
        TriadError::Encoding(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TriadError>;
