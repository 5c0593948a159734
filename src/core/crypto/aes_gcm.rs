//! # AES-GCM AEAD
//!
//! Streaming Galois/Counter Mode (NIST SP 800-38D) over any 128-bit block
//! cipher. GHASH always runs over the ciphertext.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::block::{Aes, Block, BlockCipher};
use super::ghash::Ghash;
use super::util::{constant_time_compare, expect_tag, increment_be, xor_in_place, MessageId, Unverified, Verified};
use crate::constants::{BLOCK_SIZE, GCM_MAX_BLOCKS, GCM_NONCE_SIZE};
use crate::core::error::CryptoError;

pub type AesGcm = Gcm<Aes>;

/// Counter-mode keystream for one message.
#[derive(Zeroize, ZeroizeOnDrop)]
struct CtrStream {
    /// Next counter block to encrypt
    counter: Block,
    keystream: Block,
    pos: usize,
    blocks: u64,
    tag_mask: Block,
}

impl CtrStream {
    fn apply<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8]) -> Result<(), CryptoError> {
        for byte in data.iter_mut() {
            if self.pos == BLOCK_SIZE {
                if self.blocks == GCM_MAX_BLOCKS {
                    return Err(CryptoError::KeystreamExhausted);
                }
                self.keystream = cipher.encrypt_block(&self.counter);
                increment_be(&mut self.counter[12..]);
                self.blocks += 1;
                self.pos = 0;
            }
            *byte ^= self.keystream[self.pos];
            self.pos += 1;
        }
        Ok(())
    }
}

enum State {
    Init,
    AddingData,
    Encrypting(CtrStream),
    Decrypting(CtrStream),
    Finalized(Block),
    Failed,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Init => "Init",
            State::AddingData => "AddingData",
            State::Encrypting(_) => "Encrypting",
            State::Decrypting(_) => "Decrypting",
            State::Finalized(_) => "Finalized",
            State::Failed => "Failed",
        }
    }
}

/// One GCM session at a time over a fixed key; `reset` starts the next.
pub struct Gcm<C: BlockCipher> {
    cipher: C,
    ghash: Ghash,
    aad: Vec<u8>,
    nonce: Option<Vec<u8>>,
    expected: Option<Block>,
    message: MessageId,
    state: State,
}

impl AesGcm {
    /// AES-GCM with a 128, 192 or 256-bit key.
    pub fn with_key(key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Gcm::new(Aes::new(key)?))
    }
}

impl<C: BlockCipher> Gcm<C> {
    /// Session over an already keyed block cipher.
    pub fn new(cipher: C) -> Self {
        let h = cipher.encrypt_block(&[0u8; BLOCK_SIZE]);
        Gcm {
            ghash: Ghash::new(&h),
            cipher,
            aad: Vec::new(),
            nonce: None,
            expected: None,
            message: MessageId::next(),
            state: State::Init,
        }
    }

    /// Drop all per-message state and return to `Init`, keeping the key.
    pub fn reset(&mut self) -> &mut Self {
        self.aad.clear();
        self.nonce = None;
        self.expected = None;
        self.ghash.reset();
        self.message = MessageId::next();
        self.state = State::Init;
        self
    }

    /// Append associated data. Repeated calls concatenate.
    pub fn add_associated_data(&mut self, aad: &[u8]) -> Result<&mut Self, CryptoError> {
        self.require_setup("add_associated_data")?;
        self.aad.extend_from_slice(aad);
        self.state = State::AddingData;
        Ok(self)
    }

    /// Any non-empty length is accepted; 12 bytes is the fast path.
    pub fn set_nonce(&mut self, nonce: &[u8]) -> Result<&mut Self, CryptoError> {
        self.require_setup("set_nonce")?;
        if nonce.is_empty() {
            return Err(CryptoError::InvalidNonceLength {
                expected: GCM_NONCE_SIZE,
                got: 0,
            });
        }
        self.nonce = Some(nonce.to_vec());
        self.state = State::AddingData;
        Ok(self)
    }

    /// Tag to check in `good`. Must be exactly 16 bytes.
    pub fn set_authtag(&mut self, tag: &[u8]) -> Result<&mut Self, CryptoError> {
        if let State::Finalized(_) | State::Failed = self.state {
            return Err(self.state_error("set_authtag"));
        }
        self.expected = Some(expect_tag(tag)?);
        Ok(self)
    }

    /// Close the setup phase and start encrypting.
    pub fn encrypt(&mut self) -> Result<&mut Self, CryptoError> {
        let stream = self.start("encrypt")?;
        self.state = State::Encrypting(stream);
        log::trace!("aes-gcm: encrypting, {} bytes of associated data", self.aad.len());
        Ok(self)
    }

    /// Close the setup phase and start decrypting.
    pub fn decrypt(&mut self) -> Result<&mut Self, CryptoError> {
        let stream = self.start("decrypt")?;
        self.state = State::Decrypting(stream);
        log::trace!("aes-gcm: decrypting, {} bytes of associated data", self.aad.len());
        Ok(self)
    }

    /// Encrypt a chunk; output length equals input length.
    pub fn update(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut out = plaintext.to_vec();
        self.keystream("update", true, &mut out)?;
        self.ghash.add(&out);
        Ok(out)
    }

    /// Decrypt a chunk. The plaintext is released once `verify` succeeds.
    pub fn update_unverified(&mut self, ciphertext: &[u8]) -> Result<Unverified<Vec<u8>>, CryptoError> {
        let mut out = ciphertext.to_vec();
        self.keystream("update_unverified", false, &mut out)?;
        self.ghash.add(ciphertext);
        Ok(Unverified::new(out, self.message))
    }

    /// Finish the session and return its tag. Repeated calls return the same tag.
    pub fn authtag(&mut self) -> Result<Block, CryptoError> {
        let tag = match &self.state {
            State::Encrypting(stream) | State::Decrypting(stream) => {
                let mut tag = self.ghash.digest();
                xor_in_place(&mut tag, &stream.tag_mask);
                tag
            }
            State::Finalized(tag) => return Ok(*tag),
            _ => return Err(self.state_error("authtag")),
        };
        self.state = State::Finalized(tag);
        Ok(tag)
    }

    /// Compare the session tag with the expected one in constant time.
    pub fn good(&mut self) -> Result<bool, CryptoError> {
        let expected = self.expected.ok_or(CryptoError::MissingTag)?;
        let tag = self.authtag()?;
        let ok = constant_time_compare(&tag, &expected);
        if !ok {
            log::warn!("aes-gcm: tag mismatch");
        }
        Ok(ok)
    }

    /// Like `good`, but a mismatch is an error and a match yields the token
    /// that releases this message's plaintext.
    pub fn verify(&mut self) -> Result<Verified, CryptoError> {
        if self.good()? {
            Ok(Verified::new(self.message))
        } else {
            Err(CryptoError::AuthenticationFailed)
        }
    }

    fn start(&mut self, operation: &'static str) -> Result<CtrStream, CryptoError> {
        self.require_setup(operation)?;
        let nonce = self.nonce.as_deref().ok_or(CryptoError::MissingNonce)?;

        let j0 = if nonce.len() == GCM_NONCE_SIZE {
            let mut j0 = [0u8; BLOCK_SIZE];
            j0[..GCM_NONCE_SIZE].copy_from_slice(nonce);
            j0[BLOCK_SIZE - 1] = 1;
            j0
        } else {
            self.ghash.reset();
            self.ghash.add(nonce);
            self.ghash.digest()
        };

        let tag_mask = self.cipher.encrypt_block(&j0);
        let mut counter = j0;
        increment_be(&mut counter[12..]);
        self.ghash.set_associated_data(&self.aad);
        self.message = MessageId::next();

        Ok(CtrStream {
            counter,
            keystream: [0; BLOCK_SIZE],
            pos: BLOCK_SIZE,
            blocks: 0,
            tag_mask,
        })
    }

    fn keystream(&mut self, operation: &'static str, encrypting: bool, data: &mut [u8]) -> Result<(), CryptoError> {
        let stream = match (&mut self.state, encrypting) {
            (State::Encrypting(stream), true) | (State::Decrypting(stream), false) => stream,
            (state, _) => {
                return Err(CryptoError::InvalidState {
                    operation,
                    state: state.name(),
                })
            }
        };
        let result = stream.apply(&self.cipher, data);
        if result.is_err() {
            log::warn!("aes-gcm: keystream exhausted, session poisoned");
            self.state = State::Failed;
        }
        result
    }

    fn require_setup(&self, operation: &'static str) -> Result<(), CryptoError> {
        match self.state {
            State::Init | State::AddingData => Ok(()),
            _ => Err(self.state_error(operation)),
        }
    }

    fn state_error(&self, operation: &'static str) -> CryptoError {
        CryptoError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }
}
