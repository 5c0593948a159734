//! # Poly1305 One-Time MAC
//!
//! RFC 8439 Poly1305 with a 130-bit accumulator in five 26-bit limbs.

use subtle::{Choice, ConditionallySelectable};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{POLY1305_KEY_SIZE, POLY1305_TAG_SIZE};

const LIMB_MASK: u32 = 0x03ff_ffff;
const HIBIT: u32 = 1 << 24;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Poly1305 {
    r: [u32; 5],
    /// `5 * r`, folds the reduction mod 2^130 - 5 into the multiply
    r5: [u32; 5],
    s: [u32; 4],
    acc: [u32; 5],
    buffer: [u8; 16],
    buffer_len: usize,
}

fn le_word(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Split 16 little-endian bytes into 26-bit limbs.
fn limbs(block: &[u8; 16]) -> [u32; 5] {
    let t0 = le_word(&block[0..4]);
    let t1 = le_word(&block[4..8]);
    let t2 = le_word(&block[8..12]);
    let t3 = le_word(&block[12..16]);
    [
        t0 & LIMB_MASK,
        ((t0 >> 26) | (t1 << 6)) & LIMB_MASK,
        ((t1 >> 20) | (t2 << 12)) & LIMB_MASK,
        ((t2 >> 14) | (t3 << 18)) & LIMB_MASK,
        t3 >> 8,
    ]
}

/// Propagate carries through all limbs; returns the carry out of bit 130.
fn full_carry(h: &mut [u32; 5]) -> u32 {
    let mut c = 0;
    for limb in h.iter_mut() {
        *limb += c;
        c = *limb >> 26;
        *limb &= LIMB_MASK;
    }
    c
}

impl Poly1305 {
    pub fn new(key: &[u8; POLY1305_KEY_SIZE]) -> Self {
        let mut lo = [0u8; 16];
        lo.copy_from_slice(&key[..16]);
        let l = limbs(&lo);
        lo.zeroize();

        // clamp
        let r = [
            l[0] & 0x03ff_ffff,
            l[1] & 0x03ff_ff03,
            l[2] & 0x03ff_c0ff,
            l[3] & 0x03f0_3fff,
            l[4] & 0x000f_ffff,
        ];
        let r5 = r.map(|limb| limb * 5);
        let s = [
            le_word(&key[16..20]),
            le_word(&key[20..24]),
            le_word(&key[24..28]),
            le_word(&key[28..32]),
        ];

        Poly1305 {
            r,
            r5,
            s,
            acc: [0; 5],
            buffer: [0; 16],
            buffer_len: 0,
        }
    }

    /// One-shot MAC of `message`.
    pub fn mac(key: &[u8; POLY1305_KEY_SIZE], message: &[u8]) -> [u8; POLY1305_TAG_SIZE] {
        let mut poly = Poly1305::new(key);
        poly.update(message);
        poly.finalize()
    }

    pub fn update(&mut self, data: &[u8]) {
        let mut data = data;

        if self.buffer_len > 0 {
            let take = (16 - self.buffer_len).min(data.len());
            self.buffer[self.buffer_len..self.buffer_len + take].copy_from_slice(&data[..take]);
            self.buffer_len += take;
            data = &data[take..];

            if self.buffer_len < 16 {
                return;
            }
            let block = self.buffer;
            self.process_block(&block, HIBIT);
            self.buffer_len = 0;
        }

        let mut blocks = data.chunks_exact(16);
        for chunk in &mut blocks {
            let mut block = [0u8; 16];
            block.copy_from_slice(chunk);
            self.process_block(&block, HIBIT);
        }

        let rest = blocks.remainder();
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.buffer_len = rest.len();
    }

    /// Zero-fill a pending partial block and absorb it as a full block.
    pub fn pad(&mut self) {
        if self.buffer_len > 0 {
            self.buffer[self.buffer_len..].fill(0);
            let block = self.buffer;
            self.process_block(&block, HIBIT);
            self.buffer_len = 0;
        }
    }

    /// acc = (acc + block) * r mod 2^130 - 5, carries kept lazy.
    fn process_block(&mut self, block: &[u8; 16], hibit: u32) {
        let m = limbs(block);
        let a0 = u64::from(self.acc[0] + m[0]);
        let a1 = u64::from(self.acc[1] + m[1]);
        let a2 = u64::from(self.acc[2] + m[2]);
        let a3 = u64::from(self.acc[3] + m[3]);
        let a4 = u64::from(self.acc[4] + m[4] + hibit);

        let [r0, r1, r2, r3, r4] = self.r.map(u64::from);
        let [_, s1, s2, s3, s4] = self.r5.map(u64::from);

        let d0 = a0 * r0 + a1 * s4 + a2 * s3 + a3 * s2 + a4 * s1;
        let mut d1 = a0 * r1 + a1 * r0 + a2 * s4 + a3 * s3 + a4 * s2;
        let mut d2 = a0 * r2 + a1 * r1 + a2 * r0 + a3 * s4 + a4 * s3;
        let mut d3 = a0 * r3 + a1 * r2 + a2 * r1 + a3 * r0 + a4 * s4;
        let mut d4 = a0 * r4 + a1 * r3 + a2 * r2 + a3 * r1 + a4 * r0;

        let mask = u64::from(LIMB_MASK);
        d1 += d0 >> 26;
        let mut h0 = d0 & mask;
        d2 += d1 >> 26;
        let mut h1 = d1 & mask;
        d3 += d2 >> 26;
        let h2 = d2 & mask;
        d4 += d3 >> 26;
        let h3 = d3 & mask;
        h0 += (d4 >> 26) * 5;
        let h4 = d4 & mask;
        h1 += h0 >> 26;
        h0 &= mask;

        self.acc = [h0 as u32, h1 as u32, h2 as u32, h3 as u32, h4 as u32];
    }

    /// Produce the tag. A short final block is padded with a single 1 bit.
    pub fn finalize(mut self) -> [u8; POLY1305_TAG_SIZE] {
        if self.buffer_len > 0 {
            let mut block = [0u8; 16];
            block[..self.buffer_len].copy_from_slice(&self.buffer[..self.buffer_len]);
            block[self.buffer_len] = 1;
            self.process_block(&block, 0);
        }

        let mut h = self.acc;
        let overflow = full_carry(&mut h);
        h[0] += overflow * 5;
        full_carry(&mut h);

        // g = h + 5 - 2^130; keep it when h >= p
        let mut g = [0u32; 5];
        let mut c = 5;
        for (gi, hi) in g.iter_mut().zip(h.iter()) {
            let t = hi + c;
            *gi = t & LIMB_MASK;
            c = t >> 26;
        }
        let reduce = Choice::from(c as u8);
        for (hi, gi) in h.iter_mut().zip(g.iter()) {
            *hi = u32::conditional_select(hi, gi, reduce);
        }

        let f0 = u64::from(h[0] | (h[1] << 26)) + u64::from(self.s[0]);
        let f1 = u64::from((h[1] >> 6) | (h[2] << 20)) + u64::from(self.s[1]) + (f0 >> 32);
        let f2 = u64::from((h[2] >> 12) | (h[3] << 14)) + u64::from(self.s[2]) + (f1 >> 32);
        let f3 = u64::from((h[3] >> 18) | (h[4] << 8)) + u64::from(self.s[3]) + (f2 >> 32);

        let mut tag = [0u8; POLY1305_TAG_SIZE];
        tag[0..4].copy_from_slice(&(f0 as u32).to_le_bytes());
        tag[4..8].copy_from_slice(&(f1 as u32).to_le_bytes());
        tag[8..12].copy_from_slice(&(f2 as u32).to_le_bytes());
        tag[12..16].copy_from_slice(&(f3 as u32).to_le_bytes());
        h.zeroize();
        g.zeroize();
        tag
    }
}
