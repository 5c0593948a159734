//! # Constants
//!
//! Sizes shared by the AEAD constructions.

/// Block size of the block cipher collaborator in bytes
pub const BLOCK_SIZE: usize = 16;

/// Authentication tag size in bytes (all constructions)
pub const TAG_SIZE: usize = 16;

/// Recommended GCM nonce size in bytes
pub const GCM_NONCE_SIZE: usize = 12;

/// Maximum keystream blocks per GCM message (2^32 - 2)
pub const GCM_MAX_BLOCKS: u64 = (1 << 32) - 2;

/// AES-SIV key size in bytes (two AES-128 keys); 48 and 64 are also accepted
pub const SIV_KEY_SIZE: usize = 32;

/// Maximum number of S2V components (associated data vectors plus nonce)
pub const SIV_MAX_COMPONENTS: usize = 126;

/// ChaCha20 key size in bytes
pub const CHACHA20_KEY_SIZE: usize = 32;

/// ChaCha20 nonce size in bytes
pub const CHACHA20_NONCE_SIZE: usize = 12;

/// ChaCha20 keystream block size in bytes
pub const CHACHA20_BLOCK_SIZE: usize = 64;

/// Poly1305 one-time key size in bytes
pub const POLY1305_KEY_SIZE: usize = 32;

/// Poly1305 authentication tag size in bytes
pub const POLY1305_TAG_SIZE: usize = 16;

/// Chunk size used when streaming files through a session
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Environment variable consulted for the key when the config has none
pub const KEY_ENV_VAR: &str = "TRIAD_KEY";
