//! Injectable randomness for importance sampling and forgetting draws

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform floats in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_float(&self) -> f64;
}

/// Thread-local OS-seeded randomness
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_float(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Seeded, reproducible randomness shared behind a lock
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn next_float(&self) -> f64 {
        self.rng.lock().random::<f64>()
    }
}

/// Sample uniformly from `[min, max)` using `random`.
pub fn sample_range(random: &dyn RandomSource, min: f64, max: f64) -> f64 {
    let r = random.next_float().clamp(0.0, 1.0);
    let value = min + r * (max - min);
    // guard the open upper bound against r == 1.0 from a misbehaving source
    if value >= max { min } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_in_range() {
        let random = ThreadRandom;
        for _ in 0..1000 {
            let value = random.next_float();
            assert!((0.0..1.0).contains(&value), "value {value} out of range");
        }
    }

    #[test]
    fn test_seeded_random_is_deterministic() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        let seq_a: Vec<f64> = (0..16).map(|_| a.next_float()).collect();
        let seq_b: Vec<f64> = (0..16).map(|_| b.next_float()).collect();
        assert_eq!(seq_a, seq_b);
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn test_seeded_random_differs_by_seed() {
        let a = SeededRandom::new(1);
        let b = SeededRandom::new(2);
        let seq_a: Vec<f64> = (0..8).map(|_| a.next_float()).collect();
        let seq_b: Vec<f64> = (0..8).map(|_| b.next_float()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn test_sample_range_bounds() {
        let random = SeededRandom::new(7);
        for _ in 0..1000 {
            let value = sample_range(&random, 50.0, 100.0);
            assert!((50.0..100.0).contains(&value), "value {value} out of range");
        }
    }
}
