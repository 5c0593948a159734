//! # triad - Streaming AEAD Constructions
//!
//! Three authenticated encryption modes sharing one session lifecycle:
//! - AES-GCM (counter mode + GHASH)
//! - AES-SIV (S2V over CMAC + counter mode, nonce-misuse resistant)
//! - ChaCha20-Poly1305
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── core/           # Library core
//! │   ├── config/     # Configuration handling
//! │   ├── crypto/     # Block cipher, universal hashes, AEAD sessions
//! │   └── error.rs    # Error types
//! └── cli/            # Command-line interface
//! ```
//!
//! ## Example
//!
//! ```
//! use triad::AesGcm;
//!
//! let mut gcm = AesGcm::with_key(&[0u8; 16]).unwrap();
//! gcm.set_nonce(&[0u8; 12]).unwrap().encrypt().unwrap();
//! let ciphertext = gcm.update(b"hello").unwrap();
//! let tag = gcm.authtag().unwrap();
//!
//! gcm.reset().set_nonce(&[0u8; 12]).unwrap();
//! gcm.set_authtag(&tag).unwrap().decrypt().unwrap();
//! let pending = gcm.update_unverified(&ciphertext).unwrap();
//! let proof = gcm.verify().unwrap();
//! assert_eq!(pending.release(&proof).unwrap(), b"hello");
//! ```

pub mod cli;
pub mod constants;
pub mod core;

// Re-export commonly used types
pub use constants::*;
pub use crate::core::config::{CipherSuite, Config};
pub use crate::core::crypto::{
    create_cipher, Aes, AesCmac, AesGcm, AesSiv, BlockCipher, ChaCha20, ChaCha20Poly1305, Cipher, Poly1305, Unverified,
    Verified,
};
pub use crate::core::error::{ConfigError, CryptoError, Result, TriadError};
