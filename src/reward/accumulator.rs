//! Scalar reward ledger with a single terminal drain.

use super::error::RewardError;

/// Reward ledger owned by one agent for one episode.
///
/// `cumulative` is the plain sum of every [`add`](Self::add); it is never
/// clamped. The only clamp happens in [`drain_clamped`](Self::drain_clamped),
/// which may run once per episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardAccumulator {
    cumulative: f64,
    pending_increment: f64,
    drained: bool,
}

impl RewardAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` (possibly negative) to the ledger.
    pub fn add(&mut self, delta: f64) {
        self.cumulative += delta;
        self.pending_increment += delta;
    }

    /// Returns the reward added since the previous call and clears it.
    pub fn take_pending(&mut self) -> f64 {
        std::mem::take(&mut self.pending_increment)
    }

    /// Sum of everything added this episode.
    pub fn cumulative(&self) -> f64 {
        self.cumulative
    }

    /// Reward added since the last [`take_pending`](Self::take_pending).
    pub fn pending(&self) -> f64 {
        self.pending_increment
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    /// Closes the ledger and returns its inverse payoff.
    ///
    /// ```text
    /// payoff = max_reward - clamp(cumulative, 0, max_reward)
    /// ```
    ///
    /// The better this agent scored, the smaller the payoff handed to its
    /// opponent. A second drain in the same episode is an error.
    pub fn drain_clamped(&mut self, max_reward: f64) -> Result<f64, RewardError> {
        if !max_reward.is_finite() || max_reward <= 0.0 {
            return Err(RewardError::InvalidMaxReward(max_reward));
        }
        if self.drained {
            return Err(RewardError::AlreadyDrained);
        }
        self.drained = true;
        Ok(max_reward - self.cumulative.clamp(0.0, max_reward))
    }

    /// Clears the ledger for a new episode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
