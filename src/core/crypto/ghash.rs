//! # GHASH
//!
//! Polynomial evaluation hash over GF(2^128): associated data and data are
//! each zero-padded to whole blocks, then a block of their bit lengths closes
//! the hash.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::block::Block;
use super::gf128::{self, Element, HashKey};
use crate::constants::BLOCK_SIZE;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Ghash {
    key: HashKey,
    acc: Element,
    aad_len: u64,
    data_len: u64,
    buffer: Block,
    buffer_len: usize,
}

impl Ghash {
    pub fn new(subkey: &Block) -> Self {
        Ghash {
            key: HashKey::new(subkey),
            acc: [0; 4],
            aad_len: 0,
            data_len: 0,
            buffer: [0; BLOCK_SIZE],
            buffer_len: 0,
        }
    }

    /// Replace the subkey and start over.
    pub fn set_subkey(&mut self, subkey: &Block) {
        self.key = HashKey::new(subkey);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.acc = [0; 4];
        self.aad_len = 0;
        self.data_len = 0;
        self.buffer.zeroize();
        self.buffer_len = 0;
    }

    /// Restart the hash with `aad` absorbed ahead of the data.
    pub fn set_associated_data(&mut self, aad: &[u8]) {
        self.reset();
        self.add(aad);
        self.flush();
        self.aad_len = self.data_len;
        self.data_len = 0;
    }

    pub fn add(&mut self, data: &[u8]) -> &mut Self {
        let mut data = data;
        self.data_len += data.len() as u64;

        if self.buffer_len > 0 {
            let needed = BLOCK_SIZE - self.buffer_len;
            let take = needed.min(data.len());
            self.buffer[self.buffer_len..self.buffer_len + take].copy_from_slice(&data[..take]);
            self.buffer_len += take;
            data = &data[take..];

            if self.buffer_len < BLOCK_SIZE {
                return self;
            }
            let block = self.buffer;
            self.absorb(&block);
            self.buffer_len = 0;
        }

        let mut blocks = data.chunks_exact(BLOCK_SIZE);
        for chunk in &mut blocks {
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(chunk);
            self.absorb(&block);
        }

        let rest = blocks.remainder();
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.buffer_len = rest.len();
        self
    }

    /// Hash value over everything added so far. Does not change the state.
    pub fn digest(&self) -> Block {
        let mut acc = self.acc;
        if self.buffer_len > 0 {
            let mut block = [0u8; BLOCK_SIZE];
            block[..self.buffer_len].copy_from_slice(&self.buffer[..self.buffer_len]);
            acc = self.key.mul(&gf128::add(&acc, &gf128::pack(&block)));
        }
        let aad_bits = self.aad_len.wrapping_mul(8);
        let data_bits = self.data_len.wrapping_mul(8);
        let lengths = [
            (aad_bits >> 32) as u32,
            aad_bits as u32,
            (data_bits >> 32) as u32,
            data_bits as u32,
        ];
        acc = self.key.mul(&gf128::add(&acc, &lengths));
        gf128::unpack(&acc)
    }

    fn absorb(&mut self, block: &Block) {
        self.acc = self.key.mul(&gf128::add(&self.acc, &gf128::pack(block)));
    }

    /// Zero-pad and absorb a pending partial block.
    fn flush(&mut self) {
        if self.buffer_len > 0 {
            self.buffer[self.buffer_len..].fill(0);
            let block = self.buffer;
            self.absorb(&block);
            self.buffer_len = 0;
        }
    }
}
