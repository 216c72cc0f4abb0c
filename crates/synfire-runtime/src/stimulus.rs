//! Poisson stimulus source
//!
//! The stimulus-core variant injects externally generated spikes instead of
//! routed ones: each tick it samples a Bernoulli draw against a Q16 rate
//! and, on success, feeds its routing key through the normal spike path.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use synfire_storage::PoissonRegion;

/// Per-tick Poisson spike generator
#[derive(Debug)]
pub struct PoissonSource {
    key: u32,
    rate_q16: u32,
    rng: StdRng,
}

impl PoissonSource {
    /// Build a source from its configuration region
    pub fn new(region: PoissonRegion) -> Self {
        Self {
            key: region.key_base,
            rate_q16: region.rate_q16,
            rng: StdRng::seed_from_u64(region.seed as u64),
        }
    }

    /// Draw the current tick's stimulus, if any
    pub fn sample(&mut self) -> Option<u32> {
        if (self.rng.gen::<u16>() as u32) < self.rate_q16 {
            Some(self.key)
        } else {
            None
        }
    }
}
