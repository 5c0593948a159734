//! # GF(2^128) Arithmetic
//!
//! Field operations for the two bit orders in use: GHASH's reflected order
//! (elements packed big-endian into four `u32` words, multiplication by `x`
//! is a right shift) and CMAC/S2V's natural order (a left shift on bytes).
//! Reduction polynomial: 1 + x + x^2 + x^7 + x^128.

use zeroize::Zeroize;

use super::block::Block;

/// A field element in GHASH bit order.
pub type Element = [u32; 4];

/// Reduction constants for a 4-bit right shift, indexed by the dropped nibble.
const REDUCTION: [u32; 16] = [
    0x0000_0000, 0x1c20_0000, 0x3840_0000, 0x2460_0000,
    0x7080_0000, 0x6ca0_0000, 0x48c0_0000, 0x54e0_0000,
    0xe100_0000, 0xfd20_0000, 0xd940_0000, 0xc560_0000,
    0x9180_0000, 0x8da0_0000, 0xa9c0_0000, 0xb5e0_0000,
];

/// Table slot for each nibble value (bit-reversed 4-bit index).
const NIBBLE_SLOT: [usize; 16] = [0, 8, 4, 12, 2, 10, 6, 14, 1, 9, 5, 13, 3, 11, 7, 15];

pub fn pack(block: &Block) -> Element {
    let mut e = [0u32; 4];
    for (word, chunk) in e.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    e
}

pub fn unpack(e: &Element) -> Block {
    let mut block = [0u8; 16];
    for (chunk, word) in block.chunks_exact_mut(4).zip(e) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    block
}

#[inline]
pub fn add(a: &Element, b: &Element) -> Element {
    [a[0] ^ b[0], a[1] ^ b[1], a[2] ^ b[2], a[3] ^ b[3]]
}

/// Multiply by `x` in GHASH order, without branching on the dropped bit.
#[inline]
pub fn double(a: &Element) -> Element {
    let carry = 0u32.wrapping_sub(a[3] & 1) & 0xe100_0000;
    [
        (a[0] >> 1) ^ carry,
        (a[1] >> 1) | (a[0] << 31),
        (a[2] >> 1) | (a[1] << 31),
        (a[3] >> 1) | (a[2] << 31),
    ]
}

/// Multiply by `x` in CMAC order (RFC 4493 `dbl`), branch-free.
pub fn dbl(block: &Block) -> Block {
    let mut out = [0u8; 16];
    let mask = 0u8.wrapping_sub(block[0] >> 7);
    for i in 0..15 {
        out[i] = (block[i] << 1) | (block[i + 1] >> 7);
    }
    out[15] = (block[15] << 1) ^ (mask & 0x87);
    out
}

/// Precomputed multiples of a hash subkey `H`, one per 4-bit digit.
#[derive(Clone, Zeroize)]
pub struct HashKey {
    table: [Element; 16],
}

impl HashKey {
    pub fn new(h: &Block) -> Self {
        let h = pack(h);
        let mut table = [[0u32; 4]; 16];
        table[NIBBLE_SLOT[1]] = h;
        for i in (2..16).step_by(2) {
            table[NIBBLE_SLOT[i]] = double(&table[NIBBLE_SLOT[i / 2]]);
            table[NIBBLE_SLOT[i + 1]] = add(&table[NIBBLE_SLOT[i]], &h);
        }
        HashKey { table }
    }

    /// `b * H`, consuming `b` one nibble at a time from its low end.
    pub fn mul(&self, b: &Element) -> Element {
        let mut v = [0u32; 4];
        for k in (0..4).rev() {
            let mut w = b[k];
            for _ in 0..8 {
                let overflow = (v[3] & 0xf) as usize;
                v[3] = (v[2] << 28) | (v[3] >> 4);
                v[2] = (v[1] << 28) | (v[2] >> 4);
                v[1] = (v[0] << 28) | (v[1] >> 4);
                v[0] = (v[0] >> 4) ^ REDUCTION[overflow];
                v = add(&v, &self.table[(w & 0xf) as usize]);
                w >>= 4;
            }
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(s: &str) -> Element {
        pack(&hex::decode(s).unwrap().try_into().unwrap())
    }

    #[test]
    fn test_pack_is_big_endian() {
        let e = element("000102030405060708090a0b0c0d0e0f");
        assert_eq!(e, [0x00010203, 0x04050607, 0x08090a0b, 0x0c0d0e0f]);
        assert_eq!(hex::encode(unpack(&e)), "000102030405060708090a0b0c0d0e0f");
    }

    #[test]
    fn test_double_reduces() {
        // x^127 * x wraps to the reduction polynomial
        let top = [0, 0, 0, 1];
        assert_eq!(double(&top), [0xe100_0000, 0, 0, 0]);
        assert_eq!(double(&[0x8000_0000, 0, 0, 0]), [0x4000_0000, 0, 0, 0]);
    }

    #[test]
    fn test_mul_by_one() {
        // The multiplicative identity is the element with only bit 0 set (0x80 in byte 0)
        let one = element("80000000000000000000000000000000");
        let h = hex::decode("66e94bd4ef8a2c3b884cfa59ca342b2e").unwrap();
        let key = HashKey::new(&h.clone().try_into().unwrap());
        assert_eq!(hex::encode(unpack(&key.mul(&one))), hex::encode(&h));
        assert_eq!(key.mul(&[0; 4]), [0; 4]);
    }

    #[test]
    fn test_mul_commutes() {
        let a = hex::decode("66e94bd4ef8a2c3b884cfa59ca342b2e").unwrap();
        let b = hex::decode("0388dace60b6a392f328c2b971b2fe78").unwrap();
        let ka = HashKey::new(&a.clone().try_into().unwrap());
        let kb = HashKey::new(&b.clone().try_into().unwrap());
        let ab = ka.mul(&pack(&b.try_into().unwrap()));
        let ba = kb.mul(&pack(&a.try_into().unwrap()));
        assert_eq!(ab, ba);
        // NIST SP 800-38D test case 2, first GHASH step
        assert_eq!(hex::encode(unpack(&ab)), "5e2ec746917062882c85b0685353deb7");
    }

    #[test]
    fn test_dbl_rfc4493_subkeys() {
        // L = AES-128(2b7e1516..., 0)
        let l: Block = hex::decode("7df76b0c1ab899b33e42f047b91b546f")
            .unwrap()
            .try_into()
            .unwrap();
        let k1 = dbl(&l);
        assert_eq!(hex::encode(k1), "fbeed618357133667c85e08f7236a8de");
        assert_eq!(hex::encode(dbl(&k1)), "f7ddac306ae266ccf90bc11ee46d513b");
    }
}
