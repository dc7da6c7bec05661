//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::trait_::TerrainPolicy;

/// Uniformly random action selection over `[0, action_count)`.
///
/// Seeded, so a run can be replayed exactly.
pub struct RandomTerrainPolicy {
    action_count: usize,
    rng: StdRng,
}

impl RandomTerrainPolicy {
    /// Creates a new random policy.
    ///
    /// # Arguments
    ///
    /// * `action_count` - Size of the adversary's action space.
    /// * `seed` - Seed of the action stream.
    pub fn new(action_count: usize, seed: u64) -> Self {
        Self {
            action_count,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl TerrainPolicy for RandomTerrainPolicy {
    fn select_action(&mut self, _observation: &[f64]) -> usize {
        if self.action_count == 0 {
            return 0;
        }
        self.rng.gen_range(0..self.action_count)
    }

    fn name(&self) -> &str {
        "random"
    }
}
