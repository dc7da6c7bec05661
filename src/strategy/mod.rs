//! Pluggable observation, reward and termination functions.
//!
//! Each agent binds one [`StrategySet`] at reset. A set is three plain
//! closures over the agent's context snapshot, so a new course variant is a
//! new set of functions rather than a new agent type. The closed catalogues
//! [`WalkerStrategy`] and [`AdversaryStrategy`] build the sets used by the
//! stock courses.

pub mod adversary;
pub mod walker;

use std::fmt;

use crate::Observation;

pub use adversary::{AdversaryContext, AdversaryStrategy};
pub use walker::{WalkerContext, WalkerObservation, WalkerReward, WalkerStrategy, WalkerTermination};

/// Builds the observation vector from a context snapshot.
pub type ObservationFn<C> = Box<dyn Fn(&C) -> Observation + Send + Sync>;
/// Computes the reward for the current tick.
pub type RewardFn<C> = Box<dyn Fn(&C) -> f64 + Send + Sync>;
/// Decides whether the agent should terminate.
pub type TerminateFn<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// The three functions an agent evaluates every decision.
///
/// Functions receive the context by shared reference. Transient state such as
/// the walker's pain is cleared by the agent after the whole set has run, so
/// the reward and termination functions of one tick see the same values.
pub struct StrategySet<C> {
    name: String,
    observe: ObservationFn<C>,
    reward: RewardFn<C>,
    terminate: TerminateFn<C>,
}

impl<C> StrategySet<C> {
    /// Assembles a set from arbitrary functions.
    pub fn new(
        name: impl Into<String>,
        observe: impl Fn(&C) -> Observation + Send + Sync + 'static,
        reward: impl Fn(&C) -> f64 + Send + Sync + 'static,
        terminate: impl Fn(&C) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            observe: Box::new(observe),
            reward: Box::new(reward),
            terminate: Box::new(terminate),
        }
    }

    pub fn observe(&self, ctx: &C) -> Observation {
        (self.observe)(ctx)
    }

    pub fn reward(&self, ctx: &C) -> f64 {
        (self.reward)(ctx)
    }

    pub fn should_terminate(&self, ctx: &C) -> bool {
        (self.terminate)(ctx)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C> fmt::Debug for StrategySet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategySet")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_set_invokes_supplied_functions() {
        let set: StrategySet<i32> = StrategySet::new(
            "doubler",
            |c: &i32| vec![f64::from(*c)],
            |c: &i32| f64::from(*c) * 2.0,
            |c: &i32| *c > 10,
        );
        assert_eq!(set.observe(&3), vec![3.0]);
        assert_eq!(set.reward(&3), 6.0);
        assert!(!set.should_terminate(&3));
        assert!(set.should_terminate(&11));
        assert_eq!(set.name(), "doubler");
    }

    #[test]
    fn closures_may_capture_parameters() {
        let threshold = 4.5;
        let set: StrategySet<f64> = StrategySet::new(
            "threshold",
            |_: &f64| Vec::new(),
            |_: &f64| 0.0,
            move |x: &f64| *x < threshold,
        );
        assert!(set.should_terminate(&1.0));
        assert!(!set.should_terminate(&5.0));
    }

    #[test]
    fn debug_shows_name() {
        let set: StrategySet<()> =
            StrategySet::new("noop", |_: &()| Vec::new(), |_: &()| 0.0, |_: &()| false);
        assert!(format!("{:?}", set).contains("noop"));
    }
}
