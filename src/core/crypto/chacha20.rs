//! # ChaCha20 Stream Cipher
//!
//! RFC 8439 block function and a resumable keystream over it.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{CHACHA20_BLOCK_SIZE, CHACHA20_KEY_SIZE, CHACHA20_NONCE_SIZE, POLY1305_KEY_SIZE};
use crate::core::error::CryptoError;

/// ChaCha20 keyed with a key and nonce; the block counter is supplied per block.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20 {
    state: [u32; 16],
}

#[inline(always)]
fn quarter_round(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(7);
}

fn le_words<const N: usize>(bytes: &[u8]) -> [u32; N] {
    let mut words = [0u32; N];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

impl ChaCha20 {
    /// "expand 32-byte k"
    pub const CONSTANTS: [u32; 4] = [0x61707865, 0x3320646e, 0x79622d32, 0x6b206574];

    pub fn new(key: &[u8; CHACHA20_KEY_SIZE], nonce: &[u8; CHACHA20_NONCE_SIZE]) -> Self {
        let mut state = [0u32; 16];
        state[..4].copy_from_slice(&Self::CONSTANTS);
        state[4..12].copy_from_slice(&le_words::<8>(key));
        state[13..].copy_from_slice(&le_words::<3>(nonce));
        ChaCha20 { state }
    }

    /// One 64-byte keystream block at `counter`.
    pub fn block(&self, counter: u32) -> [u8; CHACHA20_BLOCK_SIZE] {
        let mut input = self.state;
        input[12] = counter;
        let mut x = input;

        for _ in 0..10 {
            quarter_round(&mut x, 0, 4, 8, 12);
            quarter_round(&mut x, 1, 5, 9, 13);
            quarter_round(&mut x, 2, 6, 10, 14);
            quarter_round(&mut x, 3, 7, 11, 15);

            quarter_round(&mut x, 0, 5, 10, 15);
            quarter_round(&mut x, 1, 6, 11, 12);
            quarter_round(&mut x, 2, 7, 8, 13);
            quarter_round(&mut x, 3, 4, 9, 14);
        }

        let mut out = [0u8; CHACHA20_BLOCK_SIZE];
        for (chunk, (w, i)) in out.chunks_exact_mut(4).zip(x.iter().zip(input.iter())) {
            chunk.copy_from_slice(&w.wrapping_add(*i).to_le_bytes());
        }
        x.zeroize();
        input.zeroize();
        out
    }

    /// Poly1305 one-time key: the first 32 bytes of block 0.
    pub fn poly1305_key_gen(&self) -> [u8; POLY1305_KEY_SIZE] {
        let mut block = self.block(0);
        let mut key = [0u8; POLY1305_KEY_SIZE];
        key.copy_from_slice(&block[..POLY1305_KEY_SIZE]);
        block.zeroize();
        key
    }
}

/// Keystream position that survives across calls.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Keystream {
    cipher: ChaCha20,
    next_counter: u32,
    /// Set once the block at `u32::MAX` has been handed out
    exhausted: bool,
    block: [u8; CHACHA20_BLOCK_SIZE],
    pos: usize,
}

impl Keystream {
    pub fn new(cipher: ChaCha20, counter: u32) -> Self {
        Keystream {
            cipher,
            next_counter: counter,
            exhausted: false,
            block: [0; CHACHA20_BLOCK_SIZE],
            pos: CHACHA20_BLOCK_SIZE,
        }
    }

    /// XOR keystream into `data`. Fails rather than let the counter wrap.
    pub fn apply(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        for byte in data.iter_mut() {
            if self.pos == CHACHA20_BLOCK_SIZE {
                if self.exhausted {
                    return Err(CryptoError::KeystreamExhausted);
                }
                self.block = self.cipher.block(self.next_counter);
                match self.next_counter.checked_add(1) {
                    Some(next) => self.next_counter = next,
                    None => self.exhausted = true,
                }
                self.pos = 0;
            }
            *byte ^= self.block[self.pos];
            self.pos += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(key: &str, nonce: &str) -> ChaCha20 {
        let key: [u8; 32] = hex::decode(key).unwrap().try_into().unwrap();
        let nonce: [u8; 12] = hex::decode(nonce).unwrap().try_into().unwrap();
        ChaCha20::new(&key, &nonce)
    }

    fn encrypt(key: &str, nonce: &str, counter: u32, pt: &str) -> String {
        let mut data = hex::decode(pt).unwrap();
        Keystream::new(cipher(key, nonce), counter).apply(&mut data).unwrap();
        hex::encode(data)
    }

    #[test]
    fn test_block_function() {
        // RFC 8439 2.3.2
        let c = cipher(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
            "000000090000004a00000000",
        );
        assert_eq!(
            hex::encode(c.block(1)),
            "10f1e7e4d13b5915500fdd1fa32071c4c7d1f4c733c068030422aa9ac3d46c4e\
             d2826446079faa0914c2d705d98b02a2b5129cd1de164eb9cbd083e8a2503c4e"
        );
    }

    #[test]
    fn test_rfc8439_encryption() {
        // 2.4.2
        let ct = encrypt(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
            "000000000000004a00000000",
            1,
            PT242,
        );
        assert_eq!(ct, CT242);

        // A.2 #1 and #3
        assert_eq!(
            encrypt(&"00".repeat(32), &"00".repeat(12), 0, &"00".repeat(64)),
            CTA21
        );
        assert_eq!(
            encrypt(
                "1c9240a5eb55d38af333888604f6b5f0473917c1402b80099dca5cbc207075c0",
                "000000000000000000000002",
                42,
                PTA23,
            ),
            CTA23
        );
    }

    #[test]
    fn test_chunked_keystream() {
        let pt = hex::decode(PT242).unwrap();
        let key = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
        for size in [1, 3, 63, 64, 65] {
            let mut ks = Keystream::new(cipher(key, "000000000000004a00000000"), 1);
            let mut out = Vec::new();
            for chunk in pt.chunks(size) {
                let mut chunk = chunk.to_vec();
                ks.apply(&mut chunk).unwrap();
                out.extend(chunk);
            }
            assert_eq!(hex::encode(out), CT242, "chunk size {}", size);
        }
    }

    #[test]
    fn test_poly1305_key_gen() {
        let cases = [
            (
                "808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f",
                "000000000001020304050607",
                "8ad5a08b905f81cc815040274ab29471a833b637e3fd0da508dbb8e2fdd1a646",
            ),
            (
                "0000000000000000000000000000000000000000000000000000000000000001",
                "000000000000000000000002",
                "ecfa254f845f647473d3cb140da9e87606cb33066c447b87bc2666dde3fbb739",
            ),
            (
                "1c9240a5eb55d38af333888604f6b5f0473917c1402b80099dca5cbc207075c0",
                "000000000000000000000002",
                "965e3bc6f9ec7ed9560808f4d229f94b137ff275ca9b3fcbdd59deaad23310ae",
            ),
        ];
        for (key, nonce, otk) in cases {
            assert_eq!(hex::encode(cipher(key, nonce).poly1305_key_gen()), otk);
        }
    }

    #[test]
    fn test_counter_exhaustion() {
        let mut ks = Keystream::new(cipher(&"00".repeat(32), &"00".repeat(12)), u32::MAX);
        let mut data = [0u8; 64];
        ks.apply(&mut data).unwrap();
        let mut more = [0u8; 1];
        assert_eq!(ks.apply(&mut more), Err(CryptoError::KeystreamExhausted));
    }

    const PT242: &str = "4c616469657320616e642047656e746c656d656e206f662074686520636c6173\
                         73206f66202739393a204966204920636f756c64206f6666657220796f75206f\
                         6e6c79206f6e652074697020666f7220746865206675747572652c2073756e73\
                         637265656e20776f756c642062652069742e";
    const CT242: &str = "6e2e359a2568f98041ba0728dd0d6981e97e7aec1d4360c20a27afccfd9fae0b\
                         f91b65c5524733ab8f593dabcd62b3571639d624e65152ab8f530c359f0861d8\
                         07ca0dbf500d6a6156a38e088a22b65e52bc514d16ccf806818ce91ab7793736\
                         5af90bbf74a35be6b40b8eedf2785e42874d";
    const CTA21: &str = "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7\
                         da41597c5157488d7724e03fb8d84a376a43b8f41518a11cc387b669b2ee6586";
    const PTA23: &str = "2754776173206272696c6c69672c20616e642074686520736c6974687920746f\
                         7665730a446964206779726520616e642067696d626c6520696e207468652077\
                         6162653a0a416c6c206d696d737920776572652074686520626f726f676f7665\
                         732c0a416e6420746865206d6f6d65207261746873206f757467726162652e";
    const CTA23: &str = "62e6347f95ed87a45ffae7426f27a1df5fb69110044c0d73118effa95b01e5cf\
                         166d3df2d721caf9b21e5fb14c616871fd84c54f9d65b283196c7fe4f60553eb\
                         f39c6402c42234e32a356b3e764312a61a5532055716ead6962568f87d3f3f77\
                         04c6a8d1bcd1bf4d50d6154b6da731b187b58dfd728afa36757a797ac188d1";
}
