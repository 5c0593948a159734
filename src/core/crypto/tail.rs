//! # Tail Ring
//!
//! Sliding window over the last block of a byte stream. Bytes pushed past
//! the window are handed to an eviction callback in stream order.
//!
//! The window lives in a fixed one-block arena. `count` is a logical offset
//! kept in `[0, 2 * BLOCK_SIZE)`: below one block it is the fill level, above
//! it `count - BLOCK_SIZE` is the ring position of the oldest byte.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::block::Block;
use crate::constants::BLOCK_SIZE;

#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct TailRing {
    arena: Block,
    count: usize,
}

impl TailRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.arena.zeroize();
        self.count = 0;
    }

    /// Bytes currently held: `min(total pushed, BLOCK_SIZE)`.
    pub fn len(&self) -> usize {
        self.count.min(BLOCK_SIZE)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn start(&self) -> usize {
        self.count.saturating_sub(BLOCK_SIZE)
    }

    /// The window in stream order, as two slices of the arena.
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        if self.count <= BLOCK_SIZE {
            (&self.arena[..self.count], &[])
        } else {
            let start = self.start();
            (&self.arena[start..], &self.arena[..start])
        }
    }

    /// The window copied into a block in stream order, with its length.
    pub fn to_block(&self) -> (Block, usize) {
        let (head, tail) = self.as_slices();
        let mut block = [0u8; BLOCK_SIZE];
        block[..head.len()].copy_from_slice(head);
        block[head.len()..head.len() + tail.len()].copy_from_slice(tail);
        (block, head.len() + tail.len())
    }

    pub fn push<F: FnMut(&[u8])>(&mut self, data: &[u8], mut evict: F) {
        if data.is_empty() {
            return;
        }
        let held = self.len();

        if held + data.len() <= BLOCK_SIZE {
            self.arena[held..held + data.len()].copy_from_slice(data);
            self.count = held + data.len();
            return;
        }

        if data.len() >= BLOCK_SIZE {
            // The whole window and all but the last block of `data` fall out.
            let (head, tail) = self.as_slices();
            evict(head);
            evict(tail);
            let split = data.len() - BLOCK_SIZE;
            evict(&data[..split]);
            self.arena.copy_from_slice(&data[split..]);
            self.count = BLOCK_SIZE;
            return;
        }

        let mut data = data;
        if held < BLOCK_SIZE {
            let fill = BLOCK_SIZE - held;
            self.arena[held..].copy_from_slice(&data[..fill]);
            self.count = BLOCK_SIZE;
            data = &data[fill..];
        }

        // Window is full: overwrite the oldest bytes in place.
        let n = data.len();
        let start = self.start();
        let first = n.min(BLOCK_SIZE - start);
        evict(&self.arena[start..start + first]);
        self.arena[start..start + first].copy_from_slice(&data[..first]);
        if first < n {
            let rest = n - first;
            evict(&self.arena[..rest]);
            self.arena[..rest].copy_from_slice(&data[first..]);
        }
        self.count += n;
        if self.count >= 2 * BLOCK_SIZE {
            self.count -= BLOCK_SIZE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(pieces: &[&[u8]]) -> (Vec<u8>, Vec<u8>) {
        let mut ring = TailRing::new();
        let mut evicted = Vec::new();
        for piece in pieces {
            ring.push(piece, |b| evicted.extend_from_slice(b));
            assert_eq!(ring.to_block().1, ring.len());
        }
        let (block, len) = ring.to_block();
        (evicted, block[..len].to_vec())
    }

    #[test]
    fn test_short_stream_stays_in_window() {
        let (evicted, window) = feed(&[b"abc", b"defg"]);
        assert!(evicted.is_empty());
        assert_eq!(window, b"abcdefg");
    }

    #[test]
    fn test_exact_block_is_not_evicted() {
        let (evicted, window) = feed(&[b"0123456789", b"abcdef"]);
        assert!(evicted.is_empty());
        assert_eq!(window, b"0123456789abcdef");
    }

    #[test]
    fn test_small_pushes_wrap_ring() {
        let data: Vec<u8> = (0u8..100).collect();
        for step in 1..BLOCK_SIZE {
            let pieces: Vec<&[u8]> = data.chunks(step).collect();
            let (evicted, window) = feed(&pieces);
            assert_eq!(evicted, &data[..84], "step {}", step);
            assert_eq!(window, &data[84..], "step {}", step);
        }
    }

    #[test]
    fn test_large_push_after_wrap() {
        let data: Vec<u8> = (0u8..80).collect();
        let (evicted, window) = feed(&[&data[..20], &data[20..25], &data[25..70], &data[70..]]);
        assert_eq!(evicted, &data[..64]);
        assert_eq!(window, &data[64..]);
    }

    #[test]
    fn test_clear() {
        let mut ring = TailRing::new();
        ring.push(&[1u8; 40], |_| {});
        assert_eq!(ring.len(), BLOCK_SIZE);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.as_slices(), (&[][..], &[][..]));
    }
}
