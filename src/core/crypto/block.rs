//! # Block Cipher Collaborator
//!
//! The 128-bit block permutation every block-cipher construction is generic
//! over, and its AES implementation backed by the RustCrypto `aes` crate.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

use crate::constants::BLOCK_SIZE;
use crate::core::error::CryptoError;

pub type Block = [u8; BLOCK_SIZE];

/// A keyed 128-bit block permutation.
pub trait BlockCipher {
    fn encrypt_block(&self, block: &Block) -> Block;
    fn decrypt_block(&self, block: &Block) -> Block;
}

/// AES with a 128, 192 or 256-bit key. Round keys are wiped on drop.
#[derive(Clone)]
pub enum Aes {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl Aes {
    /// Key the cipher; the key length selects the variant.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher = match key.len() {
            16 => Aes::Aes128(Aes128::new_from_slice(key).map_err(|_| bad_key(key))?),
            24 => Aes::Aes192(Aes192::new_from_slice(key).map_err(|_| bad_key(key))?),
            32 => Aes::Aes256(Aes256::new_from_slice(key).map_err(|_| bad_key(key))?),
            _ => return Err(bad_key(key)),
        };
        Ok(cipher)
    }

    pub fn key_bits(&self) -> usize {
        match self {
            Aes::Aes128(_) => 128,
            Aes::Aes192(_) => 192,
            Aes::Aes256(_) => 256,
        }
    }
}

/// Reports the nearest accepted size at or above the given length.
fn bad_key(key: &[u8]) -> CryptoError {
    let expected = [16, 24, 32].into_iter().find(|&size| size >= key.len()).unwrap_or(32);
    CryptoError::InvalidKeyLength {
        expected,
        got: key.len(),
    }
}

impl BlockCipher for Aes {
    fn encrypt_block(&self, block: &Block) -> Block {
        let mut buf = aes::Block::clone_from_slice(block);
        match self {
            Aes::Aes128(c) => c.encrypt_block(&mut buf),
            Aes::Aes192(c) => c.encrypt_block(&mut buf),
            Aes::Aes256(c) => c.encrypt_block(&mut buf),
        }
        let mut out = [0u8; BLOCK_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    fn decrypt_block(&self, block: &Block) -> Block {
        let mut buf = aes::Block::clone_from_slice(block);
        match self {
            Aes::Aes128(c) => c.decrypt_block(&mut buf),
            Aes::Aes192(c) => c.decrypt_block(&mut buf),
            Aes::Aes256(c) => c.decrypt_block(&mut buf),
        }
        let mut out = [0u8; BLOCK_SIZE];
        out.copy_from_slice(&buf);
        out
    }
}
