//! Reproducible per-team question ordering.
//!
//! Each team sees the room's question bank in a personalized but stable
//! order. Instead of persisting a per-team ordering table, the order is
//! recomputed on every read from a seed derived from the team and room
//! identifiers: same seed, same permutation.

/// Pseudo-random stream seeded from an arbitrary string.
///
/// FNV-1a folds the seed into 64 bits, and an xorshift64* step produces the
/// stream. Statistical quality only has to be good enough for shuffling a
/// question list; cryptographic strength is irrelevant here.
struct SeededStream {
    state: u64,
}

impl SeededStream {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    fn from_seed(seed: &str) -> Self {
        let mut hash = Self::FNV_OFFSET;
        for byte in seed.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(Self::FNV_PRIME);
        }

        // xorshift degenerates on an all-zero state.
        Self {
            state: if hash == 0 { Self::FNV_OFFSET } else { hash },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Uniform index in `0..bound` (`bound` must be non-zero).
    fn next_index(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

/// Shuffle `items` in place using a Fisher–Yates pass driven by `seed`.
///
/// Pure and deterministic: repeated calls with the same seed produce the
/// same permutation.
pub fn shuffle_seeded<T>(items: &mut [T], seed: &str) {
    let mut stream = SeededStream::from_seed(seed);
    for i in (1..items.len()).rev() {
        let j = stream.next_index(i + 1);
        items.swap(i, j);
    }
}

/// Seed convention for a team's view of a room's question bank.
pub fn team_order_seed(team_id: &str, room_code: &str) -> String {
    format!("{team_id}:{room_code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_yields_the_same_order() {
        let mut first: Vec<u32> = (0..25).collect();
        let mut second: Vec<u32> = (0..25).collect();

        shuffle_seeded(&mut first, "team-a:DEMO");
        shuffle_seeded(&mut second, "team-a:DEMO");

        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_yield_different_orders() {
        let mut first: Vec<u32> = (0..25).collect();
        let mut second: Vec<u32> = (0..25).collect();

        shuffle_seeded(&mut first, "team-a:DEMO");
        shuffle_seeded(&mut second, "team-b:DEMO");

        assert_ne!(first, second);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..25).collect();
        shuffle_seeded(&mut items, "team-a:DEMO");

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..25).collect::<Vec<u32>>());
    }

    #[test]
    fn degenerate_inputs_are_untouched() {
        let mut empty: Vec<u32> = Vec::new();
        shuffle_seeded(&mut empty, "x");
        assert!(empty.is_empty());

        let mut single = vec![7];
        shuffle_seeded(&mut single, "x");
        assert_eq!(single, vec![7]);
    }

    #[test]
    fn seed_convention_joins_team_and_room() {
        assert_eq!(team_order_seed("t-1", "DEMO"), "t-1:DEMO");
    }
}
