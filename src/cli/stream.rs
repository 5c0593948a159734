//! # File Streaming
//!
//! Drives one AEAD session over a reader in fixed-size chunks.

use std::io::{ErrorKind, Read};

use zeroize::Zeroizing;

use crate::constants::{DEFAULT_CHUNK_SIZE, TAG_SIZE};
use crate::core::config::CipherSuite;
use crate::core::crypto::{AesGcm, AesSiv, Block, ChaCha20Poly1305, Unverified, Verified};
use crate::core::error::{CryptoError, Result};

/// A session for whichever suite was selected.
pub enum Session {
    Gcm(AesGcm),
    Siv(AesSiv),
    ChaCha(ChaCha20Poly1305),
}

/// Fill `buf` as far as the reader allows; 0 means end of input.
fn read_chunk<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

impl Session {
    pub fn new(suite: CipherSuite, key: &[u8]) -> Result<Self> {
        Ok(match suite {
            CipherSuite::Aes128Gcm | CipherSuite::Aes256Gcm => Session::Gcm(AesGcm::with_key(key)?),
            CipherSuite::AesSiv | CipherSuite::AesSiv512 => Session::Siv(AesSiv::with_key(key)?),
            CipherSuite::ChaCha20Poly1305 => Session::ChaCha(ChaCha20Poly1305::with_key(key)?),
        })
    }

    /// Feed associated data and nonce. SIV skips empty ones.
    pub fn setup(&mut self, nonce: &[u8], aad: &[u8]) -> Result<()> {
        match self {
            Session::Gcm(s) => {
                s.add_associated_data(aad)?.set_nonce(nonce)?;
            }
            Session::Siv(s) => {
                if !aad.is_empty() {
                    s.add_associated_data(aad)?;
                }
                if !nonce.is_empty() {
                    s.set_nonce(nonce)?;
                }
            }
            Session::ChaCha(s) => {
                s.add_associated_data(aad)?.set_nonce(nonce)?;
            }
        }
        Ok(())
    }

    fn update(&mut self, chunk: &[u8]) -> std::result::Result<Vec<u8>, CryptoError> {
        match self {
            Session::Gcm(s) => s.update(chunk),
            Session::Siv(s) => s.update(chunk),
            Session::ChaCha(s) => s.update(chunk),
        }
    }

    fn update_unverified(&mut self, chunk: &[u8]) -> std::result::Result<Unverified<Vec<u8>>, CryptoError> {
        match self {
            Session::Gcm(s) => s.update_unverified(chunk),
            Session::Siv(s) => s.update_unverified(chunk),
            Session::ChaCha(s) => s.update_unverified(chunk),
        }
    }

    fn authtag(&mut self) -> std::result::Result<Block, CryptoError> {
        match self {
            Session::Gcm(s) => s.authtag(),
            Session::Siv(s) => s.authtag(),
            Session::ChaCha(s) => s.authtag(),
        }
    }

    fn set_authtag(&mut self, tag: &[u8]) -> std::result::Result<(), CryptoError> {
        match self {
            Session::Gcm(s) => s.set_authtag(tag).map(drop),
            Session::Siv(s) => s.set_authtag(tag).map(drop),
            Session::ChaCha(s) => s.set_authtag(tag).map(drop),
        }
    }

    fn verify(&mut self) -> std::result::Result<Verified, CryptoError> {
        match self {
            Session::Gcm(s) => s.verify(),
            Session::Siv(s) => s.verify(),
            Session::ChaCha(s) => s.verify(),
        }
    }

    /// Encrypt everything from `input`, returning the framed message.
    pub fn seal_stream<R: Read>(&mut self, mut input: R) -> Result<Vec<u8>> {
        if let Session::Siv(siv) = self {
            // the synthetic IV covers the whole plaintext
            let mut plaintext = Zeroizing::new(Vec::new());
            input.read_to_end(&mut plaintext)?;
            for chunk in plaintext.chunks(DEFAULT_CHUNK_SIZE) {
                siv.add(chunk)?;
            }
            if plaintext.is_empty() {
                siv.add(&[])?;
            }
            siv.encrypt()?;
            let mut ciphertext = Vec::with_capacity(plaintext.len());
            for chunk in plaintext.chunks(DEFAULT_CHUNK_SIZE) {
                ciphertext.extend(siv.update(chunk)?);
            }
            let mut sealed = siv.authtag()?.to_vec();
            sealed.extend(ciphertext);
            return Ok(sealed);
        }

        match self {
            Session::Gcm(s) => s.encrypt().map(drop)?,
            Session::ChaCha(s) => s.encrypt().map(drop)?,
            Session::Siv(_) => {}
        }
        let mut buf = Zeroizing::new(vec![0u8; DEFAULT_CHUNK_SIZE]);
        let mut sealed = Vec::new();
        loop {
            let n = read_chunk(&mut input, &mut buf)?;
            if n == 0 {
                break;
            }
            sealed.extend(self.update(&buf[..n])?);
        }
        sealed.extend_from_slice(&self.authtag()?);
        Ok(sealed)
    }

    /// Decrypt a framed message. Nothing is returned unless the tag verifies.
    pub fn open_stream<R: Read>(&mut self, mut input: R) -> Result<Zeroizing<Vec<u8>>> {
        let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];
        let mut pending = Vec::new();

        if let Session::Siv(siv) = self {
            let mut tag = [0u8; TAG_SIZE];
            let n = read_chunk(&mut input, &mut tag)?;
            if n < TAG_SIZE {
                return Err(CryptoError::InvalidTagLength {
                    expected: TAG_SIZE,
                    got: n,
                }
                .into());
            }
            siv.set_authtag(&tag)?.decrypt()?;
            loop {
                let n = read_chunk(&mut input, &mut buf)?;
                if n == 0 {
                    break;
                }
                pending.push(siv.update_unverified(&buf[..n])?);
            }
        } else {
            match self {
                Session::Gcm(s) => s.decrypt().map(drop)?,
                Session::ChaCha(s) => s.decrypt().map(drop)?,
                Session::Siv(_) => {}
            }
            // the last TAG_SIZE bytes seen so far may be the tag
            let mut held: Vec<u8> = Vec::with_capacity(TAG_SIZE);
            loop {
                let n = read_chunk(&mut input, &mut buf)?;
                if n == 0 {
                    break;
                }
                held.extend_from_slice(&buf[..n]);
                if held.len() > TAG_SIZE {
                    let body: Vec<u8> = held.drain(..held.len() - TAG_SIZE).collect();
                    pending.push(self.update_unverified(&body)?);
                }
            }
            if held.len() < TAG_SIZE {
                return Err(CryptoError::InvalidTagLength {
                    expected: TAG_SIZE,
                    got: held.len(),
                }
                .into());
            }
            self.set_authtag(&held)?;
        }

        let proof = self.verify()?;
        let mut plaintext = Zeroizing::new(Vec::new());
        for chunk in pending {
            plaintext.extend(chunk.release(&proof)?);
        }
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SUITES: [CipherSuite; 5] = [
        CipherSuite::Aes128Gcm,
        CipherSuite::Aes256Gcm,
        CipherSuite::AesSiv,
        CipherSuite::AesSiv512,
        CipherSuite::ChaCha20Poly1305,
    ];

    fn session(suite: CipherSuite, aad: &[u8]) -> Session {
        let key = vec![0x5au8; suite.key_size()];
        let mut session = Session::new(suite, &key).unwrap();
        session.setup(&[1u8; 12], aad).unwrap();
        session
    }

    #[test]
    fn test_stream_roundtrip() {
        for suite in SUITES {
            for len in [0, 1, 16, DEFAULT_CHUNK_SIZE - 1, DEFAULT_CHUNK_SIZE + 17] {
                let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
                let sealed = session(suite, b"hdr").seal_stream(Cursor::new(&data)).unwrap();
                assert_eq!(sealed.len(), len + TAG_SIZE);
                let opened = session(suite, b"hdr").open_stream(Cursor::new(&sealed)).unwrap();
                assert_eq!(opened.as_slice(), data.as_slice(), "{} len {}", suite, len);
            }
        }
    }

    #[test]
    fn test_stream_rejects_tampering() {
        for suite in SUITES {
            let mut sealed = session(suite, b"").seal_stream(Cursor::new(b"payload")).unwrap();
            let last = sealed.len() - 1;
            sealed[last] ^= 1;
            let err = session(suite, b"").open_stream(Cursor::new(&sealed)).err().unwrap();
            assert!(err.to_string().contains("authentication failed"), "{}", suite);
        }
    }

    #[test]
    fn test_stream_short_input() {
        let err = session(CipherSuite::ChaCha20Poly1305, b"")
            .open_stream(Cursor::new(&[0u8; 10]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("tag length"));
    }
}
