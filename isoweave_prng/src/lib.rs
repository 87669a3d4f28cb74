// Seeded pseudo-random source for level generation.
//
// xoshiro256++ (Blackman & Vigna) with its 256-bit state expanded from a
// single `u64` seed through SplitMix64. Written out by hand so the stream
// is bit-identical on every target: the same `(config, seed)` pair must
// always grow the same puzzle, and a snapshot that stores the state must
// resume the same stream after a reload.
//
// `isoweave_core` is the only consumer: cell placement draws from a sorted
// candidate list with `choose`.
//
// **Critical constraint: determinism.** No floating point in the core
// step, no OS entropy, no thread-local generators.

use serde::{Deserialize, Serialize};

/// xoshiro256++ generator. Cloning forks the stream at its current state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRng {
    state: [u64; 4],
}

impl PuzzleRng {
    /// Seed a generator. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        let mut state = [0u64; 4];
        for word in &mut state {
            *word = splitmix64(&mut sm);
        }
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let [s0, s1, s2, s3] = self.state;
        let out = s0.wrapping_add(s3).rotate_left(23).wrapping_add(s0);

        let t = s1 << 17;
        let s2 = s2 ^ s0;
        let s3 = s3 ^ s1;
        let s1 = s1 ^ s2;
        let s0 = s0 ^ s3;
        self.state = [s0, s1, s2 ^ t, s3.rotate_left(45)];

        out
    }

    /// Uniform integer in `[low, high)`, without modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: empty range {low}..{high}");
        let span = high - low;
        if span.is_power_of_two() {
            return low + (self.next_u64() & (span - 1));
        }
        // Values below `zone` would bias the low residues.
        let zone = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= zone {
                return low + r % span;
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Pick one element uniformly. `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            let i = self.range_usize(0, items.len());
            items.get(i)
        }
    }
}

/// SplitMix64 step, used only to expand the seed.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = PuzzleRng::new(7);
        let mut b = PuzzleRng::new(7);
        for _ in 0..500 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn neighbouring_seeds_diverge() {
        let mut a = PuzzleRng::new(7);
        let mut b = PuzzleRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn range_usize_stays_in_bounds() {
        let mut rng = PuzzleRng::new(99);
        for _ in 0..5_000 {
            let v = rng.range_usize(3, 17);
            assert!((3..17).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn range_u64_power_of_two_span() {
        let mut rng = PuzzleRng::new(5);
        for _ in 0..1_000 {
            assert!(rng.range_u64(8, 16) < 16);
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = PuzzleRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[42]), Some(&42));
    }

    #[test]
    fn choose_hits_every_element() {
        let mut rng = PuzzleRng::new(3);
        let items = [0usize, 1, 2, 3];
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[*rng.choose(&items).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s), "choose never picked some element: {seen:?}");
    }

    #[test]
    fn serde_roundtrip_resumes_stream() {
        let mut rng = PuzzleRng::new(42);
        for _ in 0..37 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: PuzzleRng = serde_json::from_str(&json).unwrap();
        for _ in 0..50 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
