//! ChaCha20 keystream random source.
//!
//! Every draw is taken from a ChaCha20 keystream. Production callers key it
//! from the operating system's entropy source; tests key it with a fixed
//! value so generated output is reproducible.

use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

const BUFFER_LEN: usize = 1024;
const KEY_LEN: usize = 32;

pub struct KeystreamRng {
    cipher: ChaCha20,
    buffer: Zeroizing<Vec<u8>>,
    pos: usize,
}

impl KeystreamRng {
    pub fn from_key(key: &[u8; KEY_LEN]) -> Self {
        let mut rng = Self {
            cipher: ChaCha20::new(key.into(), &[0u8; 12].into()),
            buffer: Zeroizing::new(vec![0u8; BUFFER_LEN]),
            pos: 0,
        };
        rng.refill();
        rng
    }

    /// Keys a fresh keystream from the operating system CSPRNG.
    pub fn from_entropy() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut key[..]);
        Self::from_key(&key)
    }

    fn refill(&mut self) {
        self.buffer.fill(0);
        self.cipher.apply_keystream(&mut self.buffer);
        self.pos = 0;
    }

    fn next_u32(&mut self) -> u32 {
        if self.pos + 4 > self.buffer.len() {
            self.refill();
        }

        let bytes = [
            self.buffer[self.pos],
            self.buffer[self.pos + 1],
            self.buffer[self.pos + 2],
            self.buffer[self.pos + 3],
        ];
        self.pos += 4;

        u32::from_le_bytes(bytes)
    }

    /// Uniform integer in `0..bound`.
    ///
    /// Values from the top partial range of `u32` are rejected and redrawn,
    /// so no index is favoured by the final modulo.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero or does not fit in a `u32`.
    pub fn below(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "bound must be positive");
        let bound = u32::try_from(bound).unwrap_or_else(|_| panic!("bound exceeds u32 range"));

        let span = u64::from(u32::MAX) + 1;
        let rejection_threshold = span - (span % u64::from(bound));

        loop {
            let value = self.next_u32();
            if u64::from(value) < rejection_threshold {
                return (value % bound) as usize;
            }
        }
    }

    /// Uniformly chosen element of a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}
