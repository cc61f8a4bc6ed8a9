//! Shared utilities for Ferrite benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates `size` bytes of deterministic pseudo-random data.
///
/// Benchmarks use a fixed seed so runs are comparable.
pub fn random_data(size: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size).map(|_| rng.gen()).collect()
}
