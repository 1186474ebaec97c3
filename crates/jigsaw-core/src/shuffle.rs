//! Board shuffling

use crate::permutation::Permutation;

/// Shuffles boards with an in-place Fisher-Yates pass
pub struct Shuffler {
    rng: SimpleRng,
}

impl Default for Shuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl Shuffler {
    /// Create a shuffler seeded from the platform entropy source
    pub fn new() -> Self {
        Self {
            rng: SimpleRng::new(),
        }
    }

    /// Create a shuffler with a specific seed for reproducibility
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SimpleRng::with_seed(seed),
        }
    }

    /// One uniform Fisher-Yates pass over the whole board
    pub fn shuffle(&mut self, perm: &mut Permutation) {
        let cells = perm.cells_mut();
        for i in (1..cells.len()).rev() {
            let j = self.rng.next_usize(i + 1);
            cells.swap(i, j);
        }
    }

    /// Shuffle until the board is not solved.
    ///
    /// Boards with fewer than two cells cannot be unsolved and are left as-is.
    pub fn scramble(&mut self, perm: &mut Permutation) {
        if perm.len() < 2 {
            return;
        }
        loop {
            self.shuffle(perm);
            if !perm.is_solved() {
                break;
            }
            log::debug!("shuffle produced a solved board, reshuffling");
        }
    }
}

/// Simple PRNG for wasm-friendly seeding
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new() -> Self {
        let mut seed_bytes = [0u8; 8];
        if getrandom::getrandom(&mut seed_bytes).is_err() {
            // Fallback: use a static counter if getrandom fails
            static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
            let counter = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            seed_bytes = counter.to_le_bytes();
        }
        Self::with_seed(u64::from_le_bytes(seed_bytes))
    }

    fn with_seed(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        // PCG-like PRNG
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let xorshifted = (((self.state >> 18) ^ self.state) >> 27) as u32;
        let rot = (self.state >> 59) as u32;
        (xorshifted.rotate_right(rot)) as u64
    }

    fn next_usize(&mut self, bound: usize) -> usize {
        (self.next_u64() as usize) % bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_bijection(perm: &Permutation) -> bool {
        let mut sorted = perm.pieces().to_vec();
        sorted.sort_unstable();
        sorted.iter().enumerate().all(|(i, &p)| i == p)
    }

    #[test]
    fn test_scramble_never_solved() {
        for grid_size in 2..=12 {
            for seed in 0..20 {
                let mut shuffler = Shuffler::with_seed(seed);
                let mut perm = Permutation::identity(grid_size);
                shuffler.scramble(&mut perm);

                assert!(!perm.is_solved(), "solved board for n={} seed={}", grid_size, seed);
                assert!(is_bijection(&perm));
                assert_eq!(perm.len(), grid_size * grid_size);
            }
        }
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let mut a = Permutation::identity(6);
        let mut b = Permutation::identity(6);
        Shuffler::with_seed(7).scramble(&mut a);
        Shuffler::with_seed(7).scramble(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_cell_board_is_left_alone() {
        let mut perm = Permutation::identity(1);
        Shuffler::with_seed(1).scramble(&mut perm);
        assert!(perm.is_solved());
    }

    #[test]
    fn test_two_by_two_reaches_every_arrangement() {
        let mut shuffler = Shuffler::with_seed(99);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let mut perm = Permutation::identity(2);
            shuffler.shuffle(&mut perm);
            seen.insert(perm.pieces().to_vec());
        }
        assert_eq!(seen.len(), 24);
    }
}
