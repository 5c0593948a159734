//! # ChaCha20-Poly1305 AEAD
//!
//! Streaming RFC 8439 AEAD. The Poly1305 key is the first half of keystream
//! block 0, payload encryption starts at block 1.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::block::Block;
use super::chacha20::{ChaCha20, Keystream};
use super::poly1305::Poly1305;
use super::util::{constant_time_compare, expect_tag, MessageId, Unverified, Verified};
use crate::constants::{CHACHA20_KEY_SIZE, CHACHA20_NONCE_SIZE};
use crate::core::error::CryptoError;

/// Keystream and MAC for the message in flight.
struct Stream {
    keystream: Keystream,
    poly: Poly1305,
    aad_len: u64,
    data_len: u64,
}

impl Stream {
    fn finish(self) -> Block {
        let Stream {
            mut poly,
            aad_len,
            data_len,
            ..
        } = self;
        poly.pad();
        poly.update(&aad_len.to_le_bytes());
        poly.update(&data_len.to_le_bytes());
        poly.finalize()
    }
}

enum State {
    Init,
    AddingData,
    Encrypting(Stream),
    Decrypting(Stream),
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

#[derive(Zeroize, ZeroizeOnDrop)]
struct Secrets {
    key: [u8; CHACHA20_KEY_SIZE],
    nonce: Option<[u8; CHACHA20_NONCE_SIZE]>,
}

pub struct ChaCha20Poly1305 {
    secrets: Secrets,
    counter: u32,
    aad: Vec<u8>,
    expected: Option<Block>,
    message: MessageId,
    state: State,
}

impl ChaCha20Poly1305 {
    /// Session over a 256-bit key.
    pub fn new(key: &[u8; CHACHA20_KEY_SIZE]) -> Self {
        ChaCha20Poly1305 {
            secrets: Secrets {
                key: *key,
                nonce: None,
            },
            counter: 1,
            aad: Vec::new(),
            expected: None,
            message: MessageId::next(),
            state: State::Init,
        }
    }

    /// Like `new`, but checks the key length.
    pub fn with_key(key: &[u8]) -> Result<Self, CryptoError> {
        let key: &[u8; CHACHA20_KEY_SIZE] = key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: CHACHA20_KEY_SIZE,
            got: key.len(),
        })?;
        Ok(ChaCha20Poly1305::new(key))
    }

    /// Back to `Init` with the key kept. The initial block counter returns to 1.
    pub fn reset(&mut self) -> &mut Self {
        self.secrets.nonce = None;
        self.counter = 1;
        self.aad.zeroize();
        self.expected = None;
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

    /// The 96-bit nonce of RFC 8439.
    pub fn set_nonce(&mut self, nonce: &[u8]) -> Result<&mut Self, CryptoError> {
        self.require_setup("set_nonce")?;
        let nonce: [u8; CHACHA20_NONCE_SIZE] = nonce.try_into().map_err(|_| CryptoError::InvalidNonceLength {
            expected: CHACHA20_NONCE_SIZE,
            got: nonce.len(),
        })?;
        self.secrets.nonce = Some(nonce);
        self.state = State::AddingData;
        Ok(self)
    }

    /// Initial keystream block for the payload. Block 0 always keys Poly1305.
    pub fn set_counter(&mut self, counter: u32) -> Result<&mut Self, CryptoError> {
        self.require_setup("set_counter")?;
        self.counter = counter;
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

    /// Derive the Poly1305 key, absorb the associated data and start encrypting.
    pub fn encrypt(&mut self) -> Result<&mut Self, CryptoError> {
        let stream = self.start("encrypt")?;
        self.state = State::Encrypting(stream);
        log::trace!("chacha20-poly1305: encrypting from block {}", self.counter);
        Ok(self)
    }

    /// Derive the Poly1305 key, absorb the associated data and start decrypting.
    pub fn decrypt(&mut self) -> Result<&mut Self, CryptoError> {
        let stream = self.start("decrypt")?;
        self.state = State::Decrypting(stream);
        log::trace!("chacha20-poly1305: decrypting from block {}", self.counter);
        Ok(self)
    }

    /// Encrypt a chunk; output length equals input length.
    pub fn update(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut out = plaintext.to_vec();
        let stream = self.keystream("update", true, &mut out)?;
        stream.poly.update(&out);
        stream.data_len += out.len() as u64;
        Ok(out)
    }

    /// Plaintext is computed before the tag is checked; see [`Unverified`].
    pub fn update_unverified(&mut self, ciphertext: &[u8]) -> Result<Unverified<Vec<u8>>, CryptoError> {
        let mut out = ciphertext.to_vec();
        let stream = self.keystream("update_unverified", false, &mut out)?;
        stream.poly.update(ciphertext);
        stream.data_len += ciphertext.len() as u64;
        Ok(Unverified::new(out, self.message))
    }

    /// Finish the session and return its tag. Repeated calls return the same tag.
    pub fn authtag(&mut self) -> Result<Block, CryptoError> {
        match std::mem::replace(&mut self.state, State::Failed) {
            State::Encrypting(stream) | State::Decrypting(stream) => {
                let tag = stream.finish();
                self.state = State::Finalized(tag);
                Ok(tag)
            }
            State::Finalized(tag) => {
                self.state = State::Finalized(tag);
                Ok(tag)
            }
            other => {
                self.state = other;
                Err(self.state_error("authtag"))
            }
        }
    }

    /// Compare the session tag with the expected one in constant time.
    pub fn good(&mut self) -> Result<bool, CryptoError> {
        let expected = self.expected.ok_or(CryptoError::MissingTag)?;
        let tag = self.authtag()?;
        let ok = constant_time_compare(&tag, &expected);
        if !ok {
            log::warn!("chacha20-poly1305: tag mismatch");
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

    fn start(&mut self, operation: &'static str) -> Result<Stream, CryptoError> {
        self.require_setup(operation)?;
        let nonce = self.secrets.nonce.as_ref().ok_or(CryptoError::MissingNonce)?;

        let cipher = ChaCha20::new(&self.secrets.key, nonce);
        let mut poly_key = cipher.poly1305_key_gen();
        let mut poly = Poly1305::new(&poly_key);
        poly_key.zeroize();

        poly.update(&self.aad);
        poly.pad();
        self.message = MessageId::next();

        Ok(Stream {
            keystream: Keystream::new(cipher, self.counter),
            poly,
            aad_len: self.aad.len() as u64,
            data_len: 0,
        })
    }

    fn keystream(
        &mut self,
        operation: &'static str,
        encrypting: bool,
        data: &mut [u8],
    ) -> Result<&mut Stream, CryptoError> {
        let failed = match (&mut self.state, encrypting) {
            (State::Encrypting(stream), true) | (State::Decrypting(stream), false) => {
                stream.keystream.apply(data).is_err()
            }
            (state, _) => {
                return Err(CryptoError::InvalidState {
                    operation,
                    state: state.name(),
                })
            }
        };
        if failed {
            log::warn!("chacha20-poly1305: block counter exhausted, session poisoned");
            self.state = State::Failed;
            return Err(CryptoError::KeystreamExhausted);
        }
        match &mut self.state {
            State::Encrypting(stream) | State::Decrypting(stream) => Ok(stream),
            state => Err(CryptoError::InvalidState {
                operation,
                state: state.name(),
            }),
        }
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

impl Drop for ChaCha20Poly1305 {
    fn drop(&mut self) {
        self.aad.zeroize();
    }
}
