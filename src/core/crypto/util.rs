//! # Cryptographic Utilities
//!
//! Constant-time helpers shared by the constructions, and the wrapper that
//! keeps decrypted bytes out of reach until the session has verified its tag.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use subtle::ConstantTimeEq;

use crate::constants::TAG_SIZE;
use crate::core::error::CryptoError;

/// Constant-time comparison (prevents timing attacks).
///
/// Lengths are public, so a length mismatch returns `false` without touching
/// the contents.
#[inline(never)]
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Accept an expected tag only if it is exactly one tag long.
pub fn expect_tag(tag: &[u8]) -> Result<[u8; TAG_SIZE], CryptoError> {
    <[u8; TAG_SIZE]>::try_from(tag).map_err(|_| CryptoError::InvalidTagLength {
        expected: TAG_SIZE,
        got: tag.len(),
    })
}

/// Branch-free big-endian increment modulo 2^(8 * counter.len()).
#[inline]
pub fn increment_be(counter: &mut [u8]) {
    let mut carry = 1u16;
    for byte in counter.iter_mut().rev() {
        let sum = u16::from(*byte) + carry;
        *byte = sum as u8;
        carry = sum >> 8;
    }
}

#[inline]
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

static NEXT_MESSAGE: AtomicU64 = AtomicU64::new(1);

/// Identifies one message of one session. Every `encrypt`/`decrypt` draws a
/// fresh id, so ids are never shared across sessions or after `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MessageId(u64);

impl MessageId {
    pub(crate) fn next() -> Self {
        MessageId(NEXT_MESSAGE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Proof that a message's tag matched. Only a successful `verify()` makes one,
/// and it only releases output of that same message.
#[derive(Debug, PartialEq, Eq)]
pub struct Verified {
    message: MessageId,
}

impl Verified {
    pub(crate) fn new(message: MessageId) -> Self {
        Verified { message }
    }
}

/// Output of a decrypting `update`: bytes recovered before the tag was checked.
#[must_use = "decrypted bytes must be released with a Verified token"]
pub struct Unverified<T> {
    inner: T,
    message: MessageId,
}

impl<T> Unverified<T> {
    pub(crate) fn new(inner: T, message: MessageId) -> Self {
        Unverified { inner, message }
    }

    /// Release the data with the proof from the message that produced it.
    pub fn release(self, proof: &Verified) -> Result<T, CryptoError> {
        if proof.message != self.message {
            return Err(CryptoError::ForeignProof);
        }
        Ok(self.inner)
    }

    /// Release the data without a verification proof.
    pub fn into_inner_unchecked(self) -> T {
        self.inner
    }
}

impl<T: AsRef<[u8]>> Unverified<T> {
    pub fn len(&self) -> usize {
        self.inner.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.as_ref().is_empty()
    }
}

impl<T: AsRef<[u8]>> fmt::Debug for Unverified<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unverified({} bytes)", self.len())
    }
}
