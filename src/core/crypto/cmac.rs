//! # CMAC
//!
//! Incremental block-cipher MAC (RFC 4493). The most recent block is held
//! back until more data arrives, since the last block gets a different
//! subkey depending on whether it is complete.

use zeroize::Zeroize;

use super::block::{Aes, Block, BlockCipher};
use super::gf128::dbl;
use crate::constants::BLOCK_SIZE;
use crate::core::error::CryptoError;

pub type AesCmac = Cmac<Aes>;

pub struct Cmac<C: BlockCipher> {
    cipher: C,
    k1: Block,
    k2: Block,
    sum: Block,
    last: Block,
    last_len: usize,
    tag: Option<Block>,
}

impl AesCmac {
    /// AES-CMAC with a 128, 192 or 256-bit key.
    pub fn with_key(key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Cmac::new(Aes::new(key)?))
    }
}

impl<C: BlockCipher> Cmac<C> {
    pub fn new(cipher: C) -> Self {
        let l = cipher.encrypt_block(&[0u8; BLOCK_SIZE]);
        let k1 = dbl(&l);
        let k2 = dbl(&k1);
        Cmac {
            cipher,
            k1,
            k2,
            sum: [0; BLOCK_SIZE],
            last: [0; BLOCK_SIZE],
            last_len: 0,
            tag: None,
        }
    }

    pub fn reset(&mut self) -> &mut Self {
        self.sum.zeroize();
        self.last.zeroize();
        self.last_len = 0;
        self.tag = None;
        self
    }

    /// Append message bytes. After `digest` the next `add` starts a new message.
    pub fn add(&mut self, data: &[u8]) -> &mut Self {
        if self.tag.is_some() {
            self.reset();
        }
        let mut data = data;
        while !data.is_empty() {
            if self.last_len == BLOCK_SIZE {
                let block = self.last;
                self.chain(&block);
                self.last_len = 0;
            }
            let take = (BLOCK_SIZE - self.last_len).min(data.len());
            self.last[self.last_len..self.last_len + take].copy_from_slice(&data[..take]);
            self.last_len += take;
            data = &data[take..];
        }
        self
    }

    /// Finish the message. Repeated calls return the same tag.
    pub fn digest(&mut self) -> Block {
        if let Some(tag) = self.tag {
            return tag;
        }
        let mut block = [0u8; BLOCK_SIZE];
        block[..self.last_len].copy_from_slice(&self.last[..self.last_len]);
        let subkey = if self.last_len == BLOCK_SIZE {
            &self.k1
        } else {
            block[self.last_len] = 0x80;
            &self.k2
        };
        for (b, k) in block.iter_mut().zip(subkey) {
            *b ^= k;
        }
        self.chain(&block);
        let tag = self.sum;
        self.tag = Some(tag);
        tag
    }

    /// One-shot MAC of `data`.
    pub fn mac(&mut self, data: &[u8]) -> Block {
        self.reset();
        self.add(data);
        self.digest()
    }

    fn chain(&mut self, block: &Block) {
        for (s, b) in self.sum.iter_mut().zip(block) {
            *s ^= b;
        }
        self.sum = self.cipher.encrypt_block(&self.sum);
    }
}

impl<C: BlockCipher> Drop for Cmac<C> {
    fn drop(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
        self.sum.zeroize();
        self.last.zeroize();
        if let Some(tag) = self.tag.as_mut() {
            tag.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY128: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const MSG64: &str = "6bc1bee22e409f96e93d7e117393172a\
                         ae2d8a571e03ac9c9eb76fac45af8e51\
                         30c81c46a35ce411e5fbc1191a0a52ef\
                         f69f2445df4f9b17ad2b417be66c3710";

    fn cmac(key: &str) -> AesCmac {
        AesCmac::with_key(&hex::decode(key).unwrap()).unwrap()
    }

    #[test]
    fn test_rfc4493_aes128() {
        let msg = hex::decode(MSG64).unwrap();
        let mut mac = cmac(KEY128);
        let cases = [
            (0, "bb1d6929e95937287fa37d129b756746"),
            (16, "070a16b46b4d4144f79bdd9dd04a287c"),
            (40, "dfa66747de9ae63030ca32611497c827"),
            (64, "51f0bebf7e3b9d92fc49741779363cfe"),
        ];
        for (len, tag) in cases {
            assert_eq!(hex::encode(mac.mac(&msg[..len])), tag, "length {}", len);
        }
    }

    #[test]
    fn test_aes256_empty_message() {
        let mut mac = cmac("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4");
        assert_eq!(hex::encode(mac.digest()), "028962f61b7bf89efc6b551f4667d983");
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let msg = hex::decode(MSG64).unwrap();
        let mut mac = cmac(KEY128);
        for piece in msg[..40].chunks(3) {
            mac.add(piece);
        }
        assert_eq!(hex::encode(mac.digest()), "dfa66747de9ae63030ca32611497c827");
        // digest is idempotent
        assert_eq!(hex::encode(mac.digest()), "dfa66747de9ae63030ca32611497c827");
        // next add starts a new message
        mac.add(&msg[..16]);
        assert_eq!(hex::encode(mac.digest()), "070a16b46b4d4144f79bdd9dd04a287c");
    }
}
