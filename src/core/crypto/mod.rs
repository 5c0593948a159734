//! # Cryptographic Module
//!
//! Streaming AEAD sessions over a pluggable block cipher, plus a one-shot
//! [`Cipher`] interface used by the CLI.
//!
//! Every session follows the same lifecycle:
//!
//! ```text
//! Init -> AddingData -> Encrypting | Decrypting -> Finalized
//! ```
//!
//! Decrypted chunks come back as [`Unverified`] until `verify` succeeds.

mod aead;
mod aes_gcm;
mod aes_siv;
mod block;
mod chacha20;
mod cmac;
mod gf128;
mod ghash;
mod poly1305;
mod tail;
mod util;

pub use aead::ChaCha20Poly1305;
pub use aes_gcm::{AesGcm, Gcm};
pub use aes_siv::{AesSiv, Siv};
pub use block::{Aes, Block, BlockCipher};
pub use chacha20::{ChaCha20, Keystream};
pub use cmac::{AesCmac, Cmac};
pub use ghash::Ghash;
pub use poly1305::Poly1305;
pub use tail::TailRing;
pub use util::{constant_time_compare, Unverified, Verified};

use crate::constants::TAG_SIZE;
use crate::core::config::CipherSuite;
use crate::core::error::{CryptoError, Result};

/// Unified one-shot AEAD interface.
///
/// `seal` returns the framed message and `open` takes it back:
/// `ciphertext || tag` for GCM and ChaCha20-Poly1305, `V || ciphertext`
/// for SIV. Every call starts a fresh session.
pub trait Cipher: Send {
    fn seal(&mut self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;
    fn open(&mut self, nonce: &[u8], sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>>;
    fn name(&self) -> &'static str;
}

fn split_tag(sealed: &[u8], tag_first: bool) -> Result<(&[u8], &[u8])> {
    if sealed.len() < TAG_SIZE {
        return Err(CryptoError::InvalidTagLength {
            expected: TAG_SIZE,
            got: sealed.len(),
        }
        .into());
    }
    Ok(if tag_first {
        let (tag, body) = sealed.split_at(TAG_SIZE);
        (body, tag)
    } else {
        sealed.split_at(sealed.len() - TAG_SIZE)
    })
}

impl<C: BlockCipher + Send> Cipher for Gcm<C> {
    fn seal(&mut self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.reset().add_associated_data(aad)?.set_nonce(nonce)?.encrypt()?;
        let mut out = self.update(plaintext)?;
        out.extend_from_slice(&self.authtag()?);
        Ok(out)
    }

    fn open(&mut self, nonce: &[u8], sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let (ciphertext, tag) = split_tag(sealed, false)?;
        self.reset().add_associated_data(aad)?.set_nonce(nonce)?;
        self.set_authtag(tag)?.decrypt()?;
        let plaintext = self.update_unverified(ciphertext)?;
        let proof = self.verify()?;
        Ok(plaintext.release(&proof)?)
    }

    fn name(&self) -> &'static str {
        "AES-GCM"
    }
}

impl<C: BlockCipher + Send> Cipher for Siv<C> {
    /// An empty `nonce` selects deterministic mode; an empty `aad` adds no vector.
    fn seal(&mut self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.reset();
        if !aad.is_empty() {
            self.add_associated_data(aad)?;
        }
        if !nonce.is_empty() {
            self.set_nonce(nonce)?;
        }
        self.add(plaintext)?.encrypt()?;
        let ciphertext = self.update(plaintext)?;
        let mut out = self.authtag()?.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn open(&mut self, nonce: &[u8], sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let (ciphertext, tag) = split_tag(sealed, true)?;
        self.reset();
        if !aad.is_empty() {
            self.add_associated_data(aad)?;
        }
        if !nonce.is_empty() {
            self.set_nonce(nonce)?;
        }
        self.set_authtag(tag)?.decrypt()?;
        let plaintext = self.update_unverified(ciphertext)?;
        let proof = self.verify()?;
        Ok(plaintext.release(&proof)?)
    }

    fn name(&self) -> &'static str {
        "AES-SIV"
    }
}

impl Cipher for ChaCha20Poly1305 {
    fn seal(&mut self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.reset().add_associated_data(aad)?.set_nonce(nonce)?.encrypt()?;
        let mut out = self.update(plaintext)?;
        out.extend_from_slice(&self.authtag()?);
        Ok(out)
    }

    fn open(&mut self, nonce: &[u8], sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let (ciphertext, tag) = split_tag(sealed, false)?;
        self.reset().add_associated_data(aad)?.set_nonce(nonce)?;
        self.set_authtag(tag)?.decrypt()?;
        let plaintext = self.update_unverified(ciphertext)?;
        let proof = self.verify()?;
        Ok(plaintext.release(&proof)?)
    }

    fn name(&self) -> &'static str {
        "ChaCha20-Poly1305"
    }
}

/// Create cipher from config
pub fn create_cipher(suite: CipherSuite, key: &[u8]) -> Result<Box<dyn Cipher>> {
    if key.len() != suite.key_size() {
        return Err(CryptoError::InvalidKeyLength {
            expected: suite.key_size(),
            got: key.len(),
        }
        .into());
    }
    let cipher: Box<dyn Cipher> = match suite {
        CipherSuite::Aes128Gcm | CipherSuite::Aes256Gcm => Box::new(AesGcm::with_key(key)?),
        CipherSuite::AesSiv | CipherSuite::AesSiv512 => Box::new(AesSiv::with_key(key)?),
        CipherSuite::ChaCha20Poly1305 => Box::new(ChaCha20Poly1305::with_key(key)?),
    };
    log::debug!("created {} cipher", suite);
    Ok(cipher)
}
