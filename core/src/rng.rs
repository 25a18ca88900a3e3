//! Deterministic random number generation for demo data.
//!
//! RULE: Seeding never calls a platform RNG. The same seed always yields
//! the same figures, so demo databases are reproducible.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct SeedRng {
    inner: Pcg64Mcg,
}

impl SeedRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Derive an independent stream for one account manager, so adding a
    /// manager to the roster never shifts the others' figures.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self::new(seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform float in [lo, lo + span).
    pub fn uniform(&mut self, lo: f64, span: f64) -> f64 {
        lo + self.next_f64() * span
    }

    /// Uniform integer in [lo, lo + n).
    pub fn below(&mut self, lo: i64, n: u64) -> i64 {
        assert!(n > 0, "n must be > 0");
        lo + (self.inner.next_u64() % n) as i64
    }
}
