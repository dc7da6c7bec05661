//! Walker strategy catalogue.
//!
//! Every reward folds in the tick's pain, so harmful contacts cost reward on
//! the tick after they happen. Upright/forward bonuses are suppressed while
//! the walker is in recovery mode.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::StrategySet;
use crate::config::WalkerConfig;
use crate::physics::{BodyKinematics, Vec3};
use crate::Observation;

/// Snapshot of the walker handed to its strategy functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkerContext {
    /// Torso ("pelvis" role) kinematics.
    pub torso: BodyKinematics,
    /// Kinematics of the body part that drives meter tracking.
    pub tracked: BodyKinematics,
    pub center_of_mass: Vec3,
    pub effort: f64,
    pub joints_at_limit: f64,
    /// A foot-class part touched the terrain since the last tick.
    pub foot_contact: bool,
    /// A non-foot part touched the terrain since the last tick.
    pub non_foot_hit: bool,
    /// Contact penalty collected since the last tick.
    pub pain: f64,
    pub recovery_mode: bool,
    /// Tracked-part height above terrain at evenly spaced points ahead.
    pub terrain_profile: Vec<f64>,
    /// Position of the tracked part inside its profile cell, in `[0, 1)`.
    pub profile_fraction: f64,
    pub step_count: u32,
    pub last_whole_meter: i64,
    /// Forward speed the target-velocity reward currently asks for.
    pub target_velocity: f64,
}

impl WalkerContext {
    /// Forward speed of the torso.
    pub fn forward_velocity(&self) -> f64 {
        self.torso.velocity[0]
    }

    /// Alignment of the torso's up axis with world up, zero in recovery.
    pub fn upright_bonus(&self) -> f64 {
        if self.recovery_mode {
            0.0
        } else {
            self.torso.up[1]
        }
    }

    /// Alignment of the torso's forward axis with the course, zero in recovery.
    pub fn forward_bonus(&self) -> f64 {
        if self.recovery_mode {
            0.0
        } else {
            self.torso.forward[0]
        }
    }
}

/// Reward formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WalkerReward {
    /// `v + forward_bonus - 0.3 effort - 4 joints_at_limit - pain`
    Hopper,
    /// `v + upright_bonus - height_penalty - 0.1 effort - pain`
    Walker2d,
    /// `clamp(1 - 1.2 |target - v|, -1, 1) + forward_bonus - 0.3 effort - 4 joints_at_limit - pain`
    TargetVelocity,
}

/// Termination rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WalkerTermination {
    /// Any pain recorded this tick is fatal while the center of mass is
    /// below the near threshold, or below the far threshold once the pain
    /// exceeds `far_pain_tolerance` (zero by default).
    NonFootHitTerrain,
    /// Only the step budget ends the episode.
    Never,
}

/// Observation layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WalkerObservation {
    /// Torso velocity, forward, up, foot contact, tracked-part height.
    Default,
    /// `Default` plus the terrain profile and the cell fraction.
    TerrainProfile,
    /// `Default` plus the target and current forward velocity.
    TargetVelocity,
}

impl WalkerObservation {
    pub const BASE_DIM: usize = 11;

    /// Observation length for the given configuration.
    pub fn dim(&self, config: &WalkerConfig) -> usize {
        match self {
            WalkerObservation::Default => Self::BASE_DIM,
            WalkerObservation::TerrainProfile => Self::BASE_DIM + config.profile_samples + 1,
            WalkerObservation::TargetVelocity => Self::BASE_DIM + 2,
        }
    }

    /// Whether the agent must sample terrain heights each tick.
    pub fn needs_profile(&self) -> bool {
        matches!(self, WalkerObservation::TerrainProfile)
    }
}

/// A catalogue entry: one reward, one termination, one observation layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WalkerStrategy {
    pub reward: WalkerReward,
    pub termination: WalkerTermination,
    pub observation: WalkerObservation,
}

impl WalkerStrategy {
    /// Single-leg hopper on the adversarial course.
    pub fn hopper() -> Self {
        Self {
            reward: WalkerReward::Hopper,
            termination: WalkerTermination::NonFootHitTerrain,
            observation: WalkerObservation::TerrainProfile,
        }
    }

    /// Planar biped on flat ground.
    pub fn walker2d() -> Self {
        Self {
            reward: WalkerReward::Walker2d,
            termination: WalkerTermination::NonFootHitTerrain,
            observation: WalkerObservation::Default,
        }
    }

    /// Track a commanded forward speed.
    pub fn target_velocity() -> Self {
        Self {
            reward: WalkerReward::TargetVelocity,
            termination: WalkerTermination::NonFootHitTerrain,
            observation: WalkerObservation::TargetVelocity,
        }
    }

    /// Builds the function set, capturing the thresholds from `config`.
    pub fn build(&self, config: &WalkerConfig) -> StrategySet<WalkerContext> {
        StrategySet {
            name: self.to_string(),
            observe: observation_fn(self.observation),
            reward: reward_fn(self.reward, config),
            terminate: termination_fn(self.termination, config),
        }
    }
}

impl fmt::Display for WalkerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?}/{:?}",
            self.reward, self.termination, self.observation
        )
    }
}

fn reward_fn(kind: WalkerReward, config: &WalkerConfig) -> super::RewardFn<WalkerContext> {
    match kind {
        WalkerReward::Hopper => Box::new(|c: &WalkerContext| {
            c.forward_velocity() + c.forward_bonus()
                - 0.3 * c.effort
                - 4.0 * c.joints_at_limit
                - c.pain
        }),
        WalkerReward::Walker2d => {
            let target_height = config.target_height;
            Box::new(move |c: &WalkerContext| {
                let height_penalty = (target_height - c.torso.position[1]).max(0.0);
                c.forward_velocity() + c.upright_bonus() - height_penalty - 0.1 * c.effort - c.pain
            })
        }
        WalkerReward::TargetVelocity => Box::new(|c: &WalkerContext| {
            let error = (c.target_velocity - c.forward_velocity()).abs();
            let tracking = (1.0 - error * 1.2).clamp(-1.0, 1.0);
            tracking + c.forward_bonus() - 0.3 * c.effort - 4.0 * c.joints_at_limit - c.pain
        }),
    }
}

fn termination_fn(
    kind: WalkerTermination,
    config: &WalkerConfig,
) -> super::TerminateFn<WalkerContext> {
    match kind {
        WalkerTermination::NonFootHitTerrain => {
            let near = config.near_threshold;
            let far = config.far_threshold;
            let tolerance = config.far_pain_tolerance;
            Box::new(move |c: &WalkerContext| {
                let x = c.center_of_mass[0];
                (c.pain > 0.0 && x < near) || (c.pain > tolerance && x < far)
            })
        }
        WalkerTermination::Never => Box::new(|_: &WalkerContext| false),
    }
}

fn observation_fn(kind: WalkerObservation) -> super::ObservationFn<WalkerContext> {
    match kind {
        WalkerObservation::Default => Box::new(base_observation),
        WalkerObservation::TerrainProfile => Box::new(|c: &WalkerContext| {
            let mut obs = base_observation(c);
            obs.extend_from_slice(&c.terrain_profile);
            obs.push(c.profile_fraction);
            obs
        }),
        WalkerObservation::TargetVelocity => Box::new(|c: &WalkerContext| {
            let mut obs = base_observation(c);
            obs.push(c.target_velocity);
            obs.push(c.forward_velocity());
            obs
        }),
    }
}

fn base_observation(c: &WalkerContext) -> Observation {
    let mut obs = Vec::with_capacity(WalkerObservation::BASE_DIM);
    obs.extend_from_slice(&c.torso.velocity);
    obs.extend_from_slice(&c.torso.forward);
    obs.extend_from_slice(&c.torso.up);
    obs.push(if c.foot_contact { 1.0 } else { 0.0 });
    obs.push(c.tracked.position[1]);
    obs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> WalkerContext {
        let mut c = WalkerContext::default();
        c.torso.velocity = [1.5, 0.0, 0.0];
        c.torso.position = [3.0, 1.0, 0.0];
        c.center_of_mass = [3.0, 0.8, 0.0];
        c
    }

    #[test]
    fn hopper_reward_combines_terms() {
        let set = WalkerStrategy::hopper().build(&WalkerConfig::default());
        let mut c = ctx();
        c.effort = 1.0;
        c.joints_at_limit = 0.5;
        c.pain = 5.0;
        // 1.5 + 1.0 - 0.3 - 2.0 - 5.0
        assert!((set.reward(&c) - (-4.8)).abs() < 1e-12);
    }

    #[test]
    fn recovery_mode_suppresses_bonus() {
        let set = WalkerStrategy::hopper().build(&WalkerConfig::default());
        let mut c = ctx();
        let upright = set.reward(&c);
        c.recovery_mode = true;
        assert!((upright - set.reward(&c) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn walker2d_penalizes_low_torso() {
        let set = WalkerStrategy::walker2d().build(&WalkerConfig::default());
        let mut c = ctx();
        let tall = set.reward(&c);
        c.torso.position[1] = 0.15;
        assert!((tall - set.reward(&c) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn target_velocity_tracking_is_clamped() {
        let set = WalkerStrategy::target_velocity().build(&WalkerConfig::default());
        let mut c = ctx();
        c.target_velocity = 1.0;
        c.torso.velocity[0] = 1.0;
        assert!((set.reward(&c) - 2.0).abs() < 1e-12);
        c.torso.velocity[0] = -10.0;
        assert!((set.reward(&c) - 0.0).abs() < 1e-12);
        // a flipped target rewards moving backwards
        c.target_velocity = -1.0;
        c.torso.velocity[0] = -1.0;
        assert!((set.reward(&c) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn target_velocity_observation_carries_target_and_speed() {
        let config = WalkerConfig::default();
        let set = WalkerStrategy::target_velocity().build(&config);
        let mut c = ctx();
        c.target_velocity = -1.0;
        let obs = set.observe(&c);
        assert_eq!(obs.len(), WalkerObservation::TargetVelocity.dim(&config));
        assert_eq!(obs.len(), WalkerObservation::BASE_DIM + 2);
        assert_eq!(obs[WalkerObservation::BASE_DIM], -1.0);
        assert_eq!(obs[WalkerObservation::BASE_DIM + 1], 1.5);
    }

    #[test]
    fn near_threshold_terminates_on_any_pain() {
        let set = WalkerStrategy::hopper().build(&WalkerConfig::default());
        let mut c = ctx();
        c.center_of_mass[0] = 1.5;
        assert!(!set.should_terminate(&c));
        c.pain = 5.0;
        assert!(set.should_terminate(&c));
    }

    #[test]
    fn any_pain_below_far_threshold_terminates() {
        let set = WalkerStrategy::hopper().build(&WalkerConfig::default());
        let mut c = ctx();
        c.center_of_mass[0] = 20.0;
        assert!(!set.should_terminate(&c));
        c.pain = 5.0;
        assert!(set.should_terminate(&c));
        c.center_of_mass[0] = 150.0;
        assert!(!set.should_terminate(&c));
    }

    #[test]
    fn far_pain_tolerance_is_opt_in() {
        let config = WalkerConfig {
            far_pain_tolerance: 10.0,
            ..WalkerConfig::default()
        };
        let set = WalkerStrategy::hopper().build(&config);
        let mut c = ctx();
        c.center_of_mass[0] = 20.0;
        c.pain = 5.0;
        assert!(!set.should_terminate(&c));
        c.pain = 15.0;
        assert!(set.should_terminate(&c));
    }

    #[test]
    fn never_termination_ignores_pain() {
        let strategy = WalkerStrategy {
            termination: WalkerTermination::Never,
            ..WalkerStrategy::hopper()
        };
        let set = strategy.build(&WalkerConfig::default());
        let mut c = ctx();
        c.center_of_mass[0] = 0.5;
        c.pain = 100.0;
        assert!(!set.should_terminate(&c));
    }

    #[test]
    fn observation_dims_match_layouts() {
        let config = WalkerConfig::default();
        let mut c = ctx();
        c.terrain_profile = vec![0.0; config.profile_samples];

        let default = WalkerStrategy::walker2d().build(&config);
        assert_eq!(
            default.observe(&c).len(),
            WalkerObservation::Default.dim(&config)
        );

        let profile = WalkerStrategy::hopper().build(&config);
        assert_eq!(
            profile.observe(&c).len(),
            WalkerObservation::TerrainProfile.dim(&config)
        );
    }

    #[test]
    fn foot_contact_is_encoded() {
        let set = WalkerStrategy::walker2d().build(&WalkerConfig::default());
        let mut c = ctx();
        c.foot_contact = true;
        assert_eq!(set.observe(&c)[9], 1.0);
    }
}
