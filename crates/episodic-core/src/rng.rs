// Seeded randomness
//
// Every random decision in episodic (catalog shuffle, class selection, file
// permutation, sampler draws) takes an explicit `&mut R: Rng` argument. There
// is no process-wide generator: reproducibility comes from seeding the value
// passed in, and concurrent episode construction uses one generator per
// thread (see `fork`).
//
// ChaCha8 is used as the concrete generator because its output for a given
// seed is fixed across platforms and rand releases, which `StdRng` does not
// promise.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The concrete generator used for episode sampling.
pub type EpisodeRng = ChaCha8Rng;

/// Seed used when none is configured. Matches the catalog's historic seed.
pub const DEFAULT_SEED: u64 = 1;

/// A generator seeded from a fixed value.
pub fn seeded(seed: u64) -> EpisodeRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A generator seeded from OS entropy.
pub fn from_entropy() -> EpisodeRng {
    ChaCha8Rng::from_entropy()
}

/// Derive an independent generator from `parent`.
///
/// The child is seeded from the parent's next output, so forking is itself
/// deterministic given the parent's state.
pub fn fork<R: Rng + ?Sized>(parent: &mut R) -> EpisodeRng {
    ChaCha8Rng::seed_from_u64(parent.gen())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = seeded(42);
        let mut b = seeded(42);
        let xs: Vec<u64> = (0..8).map(|_| a.gen()).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn fork_is_deterministic_and_independent() {
        let mut p1 = seeded(DEFAULT_SEED);
        let mut p2 = seeded(DEFAULT_SEED);
        let mut c1 = fork(&mut p1);
        let mut c2 = fork(&mut p2);
        assert_eq!(c1.gen::<u64>(), c2.gen::<u64>());

        // Sibling forks draw different streams.
        let mut s1 = fork(&mut p1);
        let mut s2 = fork(&mut p1);
        assert_ne!(s1.gen::<u64>(), s2.gen::<u64>());
    }
}
