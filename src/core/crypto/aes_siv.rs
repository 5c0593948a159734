//! # AES-SIV AEAD
//!
//! Synthetic-IV authenticated encryption (RFC 5297). The key is split in
//! half: the first half keys CMAC for S2V, the second half keys CTR.
//!
//! Encryption needs the whole plaintext before the first ciphertext byte:
//! `add` it first, then `encrypt` and stream it through `update`. Decryption
//! streams, re-feeding recovered plaintext into S2V as it goes.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::block::{Aes, Block, BlockCipher};
use super::cmac::Cmac;
use super::gf128::dbl;
use super::tail::TailRing;
use super::util::{constant_time_compare, expect_tag, increment_be, xor_in_place, MessageId, Unverified, Verified};
use crate::constants::{BLOCK_SIZE, SIV_KEY_SIZE, SIV_MAX_COMPONENTS};
use crate::core::error::CryptoError;

pub type AesSiv = Siv<Aes>;

#[derive(Zeroize, ZeroizeOnDrop)]
struct CtrStream {
    counter: Block,
    keystream: Block,
    pos: usize,
}

impl CtrStream {
    /// Counter block: the synthetic IV with bit 31 of its last two words cleared.
    fn new(iv: &Block) -> Self {
        let mut counter = *iv;
        counter[8] &= 0x7f;
        counter[12] &= 0x7f;
        CtrStream {
            counter,
            keystream: [0; BLOCK_SIZE],
            pos: BLOCK_SIZE,
        }
    }

    fn apply<C: BlockCipher>(&mut self, cipher: &C, data: &mut [u8]) {
        for byte in data.iter_mut() {
            if self.pos == BLOCK_SIZE {
                self.keystream = cipher.encrypt_block(&self.counter);
                increment_be(&mut self.counter);
                self.pos = 0;
            }
            *byte ^= self.keystream[self.pos];
            self.pos += 1;
        }
    }
}

enum State {
    Init,
    AddingData,
    /// Plaintext is being fed to S2V ahead of encryption
    Absorbing,
    Encrypting { stream: CtrStream, iv: Block },
    Decrypting(CtrStream),
    Finalized(Block),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Init => "Init",
            State::AddingData => "AddingData",
            State::Absorbing => "Absorbing",
            State::Encrypting { .. } => "Encrypting",
            State::Decrypting(_) => "Decrypting",
            State::Finalized(_) => "Finalized",
        }
    }
}

pub struct Siv<C: BlockCipher> {
    mac: Cmac<C>,
    ctr: C,
    aad: Vec<Vec<u8>>,
    nonce: Option<Vec<u8>>,
    expected: Option<Block>,
    /// Running S2V value over the components processed so far
    s2v: Block,
    tail: TailRing,
    absorbed: u64,
    streamed: u64,
    message: MessageId,
    state: State,
}

impl AesSiv {
    /// AES-SIV with a 32, 48 or 64-byte key (two AES-128, -192 or -256 keys).
    pub fn with_key(key: &[u8]) -> Result<Self, CryptoError> {
        if !matches!(key.len(), 32 | 48 | 64) {
            return Err(CryptoError::InvalidKeyLength {
                expected: SIV_KEY_SIZE,
                got: key.len(),
            });
        }
        let (mac_key, ctr_key) = key.split_at(key.len() / 2);
        Ok(Siv::new(Aes::new(mac_key)?, Aes::new(ctr_key)?))
    }
}

impl<C: BlockCipher> Siv<C> {
    /// Session over a CMAC cipher and a CTR cipher keyed independently.
    pub fn new(mac_cipher: C, ctr_cipher: C) -> Self {
        Siv {
            mac: Cmac::new(mac_cipher),
            ctr: ctr_cipher,
            aad: Vec::new(),
            nonce: None,
            expected: None,
            s2v: [0; BLOCK_SIZE],
            tail: TailRing::new(),
            absorbed: 0,
            streamed: 0,
            message: MessageId::next(),
            state: State::Init,
        }
    }

    /// Drop all per-message state and return to `Init`, keeping the keys.
    pub fn reset(&mut self) -> &mut Self {
        self.aad.clear();
        self.nonce = None;
        self.expected = None;
        self.s2v.zeroize();
        self.tail.clear();
        self.mac.reset();
        self.absorbed = 0;
        self.streamed = 0;
        self.message = MessageId::next();
        self.state = State::Init;
        self
    }

    /// Add one associated data vector. Order matters.
    pub fn add_associated_data(&mut self, aad: &[u8]) -> Result<&mut Self, CryptoError> {
        self.require_setup("add_associated_data")?;
        if self.components() >= SIV_MAX_COMPONENTS {
            return Err(CryptoError::TooManyComponents {
                max: SIV_MAX_COMPONENTS,
            });
        }
        self.aad.push(aad.to_vec());
        self.state = State::AddingData;
        Ok(self)
    }

    /// Switch to nonce-based mode. The nonce is the last S2V component.
    pub fn set_nonce(&mut self, nonce: &[u8]) -> Result<&mut Self, CryptoError> {
        self.require_setup("set_nonce")?;
        if self.nonce.is_none() && self.components() >= SIV_MAX_COMPONENTS {
            return Err(CryptoError::TooManyComponents {
                max: SIV_MAX_COMPONENTS,
            });
        }
        self.nonce = Some(nonce.to_vec());
        self.state = State::AddingData;
        Ok(self)
    }

    /// Expected synthetic IV; also the counter start for `decrypt`, so it
    /// cannot change once a message is being processed.
    pub fn set_authtag(&mut self, tag: &[u8]) -> Result<&mut Self, CryptoError> {
        if !matches!(self.state, State::Init | State::AddingData | State::Absorbing) {
            return Err(self.state_error("set_authtag"));
        }
        self.expected = Some(expect_tag(tag)?);
        Ok(self)
    }

    /// Register plaintext with S2V ahead of `encrypt`.
    pub fn add(&mut self, plaintext: &[u8]) -> Result<&mut Self, CryptoError> {
        match self.state {
            State::Init | State::AddingData => {
                self.begin_s2v();
                self.state = State::Absorbing;
            }
            State::Absorbing => {}
            _ => return Err(self.state_error("add")),
        }
        self.absorb(plaintext);
        self.absorbed += plaintext.len() as u64;
        Ok(self)
    }

    /// Compute the synthetic IV over everything registered and start CTR.
    pub fn encrypt(&mut self) -> Result<&mut Self, CryptoError> {
        if !matches!(self.state, State::Absorbing) {
            return Err(self.state_error("encrypt"));
        }
        let iv = self.finish_s2v();
        self.message = MessageId::next();
        self.state = State::Encrypting {
            stream: CtrStream::new(&iv),
            iv,
        };
        log::trace!("aes-siv: encrypting {} registered bytes", self.absorbed);
        Ok(self)
    }

    /// Start CTR from the expected tag. `set_authtag` must come first.
    pub fn decrypt(&mut self) -> Result<&mut Self, CryptoError> {
        self.require_setup("decrypt")?;
        let expected = self.expected.ok_or(CryptoError::MissingTag)?;
        self.begin_s2v();
        self.message = MessageId::next();
        self.state = State::Decrypting(CtrStream::new(&expected));
        log::trace!("aes-siv: decrypting with {} associated data vectors", self.aad.len());
        Ok(self)
    }

    /// Encrypt a chunk of the plaintext registered with `add`.
    pub fn update(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let stream = match &mut self.state {
            State::Encrypting { stream, .. } => stream,
            other => {
                return Err(CryptoError::InvalidState {
                    operation: "update",
                    state: other.name(),
                })
            }
        };
        let streamed = self.streamed + plaintext.len() as u64;
        if streamed > self.absorbed {
            return Err(CryptoError::LengthMismatch {
                expected: self.absorbed,
                got: streamed,
            });
        }
        let mut out = plaintext.to_vec();
        stream.apply(&self.ctr, &mut out);
        self.streamed = streamed;
        Ok(out)
    }

    /// Decrypt a chunk, feeding the recovered plaintext back into S2V.
    pub fn update_unverified(&mut self, ciphertext: &[u8]) -> Result<Unverified<Vec<u8>>, CryptoError> {
        let stream = match &mut self.state {
            State::Decrypting(stream) => stream,
            other => {
                return Err(CryptoError::InvalidState {
                    operation: "update_unverified",
                    state: other.name(),
                })
            }
        };
        let mut out = ciphertext.to_vec();
        stream.apply(&self.ctr, &mut out);
        self.absorb(&out);
        self.streamed += out.len() as u64;
        Ok(Unverified::new(out, self.message))
    }

    /// The synthetic IV. Without any `add`, it covers an empty plaintext.
    pub fn authtag(&mut self) -> Result<Block, CryptoError> {
        let tag = match self.state {
            State::Init | State::AddingData => {
                self.begin_s2v();
                self.finish_s2v()
            }
            State::Absorbing | State::Decrypting(_) => self.finish_s2v(),
            State::Encrypting { iv, .. } => iv,
            State::Finalized(tag) => return Ok(tag),
        };
        self.state = State::Finalized(tag);
        Ok(tag)
    }

    /// Compare the synthetic IV with the expected one in constant time.
    pub fn good(&mut self) -> Result<bool, CryptoError> {
        let expected = self.expected.ok_or(CryptoError::MissingTag)?;
        let tag = self.authtag()?;
        let ok = constant_time_compare(&tag, &expected);
        if !ok {
            log::warn!("aes-siv: synthetic IV mismatch");
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

    fn components(&self) -> usize {
        self.aad.len() + usize::from(self.nonce.is_some())
    }

    /// S2V over the zero block, every AAD vector and the nonce.
    fn begin_s2v(&mut self) {
        let mut d = self.mac.mac(&[0u8; BLOCK_SIZE]);
        for component in self.aad.iter().chain(self.nonce.iter()) {
            let m = self.mac.mac(component);
            d = dbl(&d);
            xor_in_place(&mut d, &m);
        }
        self.s2v = d;
        self.tail.clear();
        self.mac.reset();
        self.absorbed = 0;
        self.streamed = 0;
    }

    fn absorb(&mut self, data: &[u8]) {
        let mac = &mut self.mac;
        self.tail.push(data, |evicted| {
            mac.add(evicted);
        });
    }

    /// Close S2V with the plaintext's last block: xorend for 16 bytes or
    /// more, doubling plus 10* padding below that.
    fn finish_s2v(&mut self) -> Block {
        let (last, n) = self.tail.to_block();
        let mut d = self.s2v;
        if n == BLOCK_SIZE {
            xor_in_place(&mut d, &last);
        } else {
            d = dbl(&d);
            xor_in_place(&mut d[..n], &last[..n]);
            d[n] ^= 0x80;
        }
        self.mac.add(&d);
        let iv = self.mac.digest();
        self.tail.clear();
        d.zeroize();
        iv
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

impl<C: BlockCipher> Drop for Siv<C> {
    fn drop(&mut self) {
        self.s2v.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A1_KEY: &str = "fffefdfcfbfaf9f8f7f6f5f4f3f2f1f0f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";
    const A1_AAD: &str = "101112131415161718191a1b1c1d1e1f2021222324252627";
    const A1_PT: &str = "112233445566778899aabbccddee";

    const A2_KEY: &str = "7f7e7d7c7b7a79787776757473727170404142434445464748494a4b4c4d4e4f";
    const A2_AAD1: &str = "00112233445566778899aabbccddeeffdeaddadadeaddadaffeeddccbbaa99887766554433221100";
    const A2_AAD2: &str = "102030405060708090a0";
    const A2_NONCE: &str = "09f911029d74e35bd84156c5635688c0";
    const A2_PT: &str = "7468697320697320736f6d6520706c61696e7465787420746f20656e6372797074207573696e67205349562d414553";
    const A2_CT: &str = "cb900f2fddbe404326601965c889bf17dba77ceb094fa663b7a3f748ba8af829ea64ad544a272e9c485b62a3fd5c0d";
    const A2_TAG: &str = "7bdb6e3b432667eb06f4d14bff2fbd0f";

    fn h(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    fn a2_session() -> AesSiv {
        let mut siv = AesSiv::with_key(&h(A2_KEY)).unwrap();
        siv.add_associated_data(&h(A2_AAD1))
            .unwrap()
            .add_associated_data(&h(A2_AAD2))
            .unwrap()
            .set_nonce(&h(A2_NONCE))
            .unwrap();
        siv
    }

    #[test]
    fn test_rfc5297_deterministic() {
        let mut siv = AesSiv::with_key(&h(A1_KEY)).unwrap();
        siv.add_associated_data(&h(A1_AAD)).unwrap();
        siv.add(&h(A1_PT)).unwrap().encrypt().unwrap();
        let ct = siv.update(&h(A1_PT)).unwrap();
        assert_eq!(hex::encode(ct), "40c02b9690c4dc04daef7f6afe5c");
        assert_eq!(hex::encode(siv.authtag().unwrap()), "85632d07c6e8f37f950acd320a2ecc93");
    }

    #[test]
    fn test_rfc5297_nonce_based() {
        let mut siv = a2_session();
        siv.add(&h(A2_PT)).unwrap().encrypt().unwrap();
        assert_eq!(hex::encode(siv.authtag().unwrap()), A2_TAG);

        let mut siv = a2_session();
        let pt = h(A2_PT);
        for piece in pt.chunks(5) {
            siv.add(piece).unwrap();
        }
        siv.encrypt().unwrap();
        let mut ct = Vec::new();
        for piece in pt.chunks(16) {
            ct.extend(siv.update(piece).unwrap());
        }
        assert_eq!(hex::encode(ct), A2_CT);
        assert_eq!(hex::encode(siv.authtag().unwrap()), A2_TAG);
    }

    #[test]
    fn test_rfc5297_decrypt_streaming() {
        let ct = h(A2_CT);
        for size in [1, 7, 16, 17, ct.len()] {
            let mut siv = a2_session();
            siv.set_authtag(&h(A2_TAG)).unwrap().decrypt().unwrap();
            let mut pt = Vec::new();
            let mut pieces = Vec::new();
            for chunk in ct.chunks(size) {
                pieces.push(siv.update_unverified(chunk).unwrap());
            }
            let proof = siv.verify().unwrap();
            for piece in pieces {
                pt.extend(piece.release(&proof).unwrap());
            }
            assert_eq!(hex::encode(pt), A2_PT, "chunk size {}", size);
        }
    }

    #[test]
    fn test_rfc5297_tampered() {
        let mut ct = h(A2_CT);
        ct[20] ^= 0x04;
        let mut siv = a2_session();
        siv.set_authtag(&h(A2_TAG)).unwrap().decrypt().unwrap();
        let _ = siv.update_unverified(&ct).unwrap();
        assert!(!siv.good().unwrap());

        let mut siv = AesSiv::with_key(&h(A2_KEY)).unwrap();
        siv.add_associated_data(&h(A2_AAD1)).unwrap().set_nonce(&h(A2_NONCE)).unwrap();
        siv.set_authtag(&h(A2_TAG)).unwrap().decrypt().unwrap();
        let _ = siv.update_unverified(&h(A2_CT)).unwrap();
        assert_eq!(siv.verify(), Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn test_block_boundaries() {
        let key = [0x42u8; 32];
        let data: Vec<u8> = (0u8..40).collect();
        let mut tags = Vec::new();
        for len in [0, 1, 15, 16, 17, 32, 33] {
            let pt = &data[..len];
            let mut siv = AesSiv::with_key(&key).unwrap();
            siv.add_associated_data(b"header").unwrap();
            siv.add(pt).unwrap().encrypt().unwrap();
            let ct = siv.update(pt).unwrap();
            let tag = siv.authtag().unwrap();
            assert_eq!(ct.len(), len);

            let mut siv = AesSiv::with_key(&key).unwrap();
            siv.add_associated_data(b"header").unwrap();
            siv.set_authtag(&tag).unwrap().decrypt().unwrap();
            let back = siv.update_unverified(&ct).unwrap();
            let proof = siv.verify().unwrap();
            assert_eq!(back.release(&proof).unwrap(), pt);
            tags.push(tag);
        }
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), 7);
    }

    #[test]
    fn test_empty_plaintext_tag() {
        let mut siv = AesSiv::with_key(&h(A1_KEY)).unwrap();
        siv.add_associated_data(&h(A1_AAD)).unwrap();
        let implicit = siv.authtag().unwrap();

        let mut siv = AesSiv::with_key(&h(A1_KEY)).unwrap();
        siv.add_associated_data(&h(A1_AAD)).unwrap();
        siv.add(&[]).unwrap().encrypt().unwrap();
        assert!(siv.update(&[]).unwrap().is_empty());
        assert_eq!(siv.authtag().unwrap(), implicit);
    }

    #[test]
    fn test_wider_keys() {
        for len in [48, 64] {
            let key = vec![7u8; len];
            let mut siv = AesSiv::with_key(&key).unwrap();
            siv.add(b"wider key").unwrap().encrypt().unwrap();
            let ct = siv.update(b"wider key").unwrap();
            let tag = siv.authtag().unwrap();

            siv.reset();
            siv.set_authtag(&tag).unwrap().decrypt().unwrap();
            let pt = siv.update_unverified(&ct).unwrap();
            let proof = siv.verify().unwrap();
            assert_eq!(pt.release(&proof).unwrap(), b"wider key");
        }
        assert!(AesSiv::with_key(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_state_errors() {
        let mut siv = AesSiv::with_key(&h(A1_KEY)).unwrap();
        assert!(matches!(
            siv.encrypt(),
            Err(CryptoError::InvalidState { operation: "encrypt", .. })
        ));
        assert_eq!(siv.decrypt().err(), Some(CryptoError::MissingTag));

        siv.add(b"abc").unwrap();
        assert!(siv.add_associated_data(b"late").is_err());
        siv.encrypt().unwrap();
        assert!(matches!(
            siv.add(b"more"),
            Err(CryptoError::InvalidState { operation: "add", state: "Encrypting" })
        ));
        assert!(siv.update_unverified(b"abc").is_err());
        assert_eq!(
            siv.update(b"abcd"),
            Err(CryptoError::LengthMismatch { expected: 3, got: 4 })
        );
        assert_eq!(siv.update(b"abc").unwrap().len(), 3);
    }

    #[test]
    fn test_authtag_fixed_once_streaming() {
        let mut forged = h(A2_TAG);
        for b in forged.iter_mut() {
            *b ^= 0xff;
        }
        let mut siv = a2_session();
        siv.set_authtag(&forged).unwrap().decrypt().unwrap();
        let _ = siv.update_unverified(&h(A2_CT)).unwrap();
        assert_eq!(
            siv.set_authtag(&h(A2_TAG)).err(),
            Some(CryptoError::InvalidState {
                operation: "set_authtag",
                state: "Decrypting"
            })
        );
        assert_eq!(siv.good(), Ok(false));

        let mut siv = a2_session();
        siv.add(&h(A2_PT)).unwrap().encrypt().unwrap();
        assert!(matches!(
            siv.set_authtag(&h(A2_TAG)),
            Err(CryptoError::InvalidState { state: "Encrypting", .. })
        ));

        // before encrypt the tag may still be set
        let mut siv = a2_session();
        siv.add(&h(A2_PT)).unwrap().set_authtag(&h(A2_TAG)).unwrap();
        siv.encrypt().unwrap();
        assert_eq!(siv.good(), Ok(true));
    }

    #[test]
    fn test_proof_does_not_carry_over_reset() {
        let key = [0x24u8; 32];
        let mut siv = AesSiv::with_key(&key).unwrap();
        siv.add(b"first").unwrap().encrypt().unwrap();
        let ct = siv.update(b"first").unwrap();
        let tag = siv.authtag().unwrap();

        siv.reset();
        siv.set_authtag(&tag).unwrap().decrypt().unwrap();
        let first = siv.update_unverified(&ct).unwrap();
        let proof = siv.verify().unwrap();

        siv.reset();
        siv.set_authtag(&[0u8; 16]).unwrap().decrypt().unwrap();
        let second = siv.update_unverified(&ct).unwrap();
        assert!(!siv.good().unwrap());

        assert_eq!(second.release(&proof), Err(CryptoError::ForeignProof));
        assert_eq!(first.release(&proof).unwrap(), b"first");

        // a proof made straight from Init covers the empty message only
        siv.reset();
        siv.set_authtag(&[0u8; 16]).unwrap().decrypt().unwrap();
        let rejected = siv.update_unverified(&ct).unwrap();
        assert!(!siv.good().unwrap());
        siv.reset();
        let empty_iv = siv.authtag().unwrap();
        siv.reset();
        siv.set_authtag(&empty_iv).unwrap();
        let empty_proof = siv.verify().unwrap();
        assert_eq!(rejected.release(&empty_proof), Err(CryptoError::ForeignProof));
    }

    #[test]
    fn test_component_limit() {
        let mut siv = AesSiv::with_key(&[0u8; 32]).unwrap();
        for _ in 0..SIV_MAX_COMPONENTS {
            siv.add_associated_data(b"x").unwrap();
        }
        assert!(siv.add_associated_data(b"x").is_err());
        assert!(siv.set_nonce(b"n").is_err());
    }
}
