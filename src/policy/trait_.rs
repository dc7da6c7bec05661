//! Policy trait for the terrain adversary.

/// A policy that answers the adversary's decision requests.
///
/// Actions index the adversary's discrete action space:
/// - 0: hold the current height
/// - odd: raise by tier `(action + 1) / 2`
/// - even: lower by tier `action / 2`
pub trait TerrainPolicy: Send + Sync {
    /// Selects the action for one decision request.
    ///
    /// # Arguments
    ///
    /// * `observation` - Adversary observation: steps since the last meter,
    ///   current height, last action reward.
    fn select_action(&mut self, observation: &[f64]) -> usize;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
