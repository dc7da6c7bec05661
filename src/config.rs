//! Configuration for an assault-course episode.
//!
//! One immutable [`CourseConfig`] value is handed to the coordinator at
//! construction and shared (by reference) with both agents. Constants that
//! both agents depend on, such as the terrain ceiling, live here instead of
//! being duplicated per agent.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategy::{AdversaryStrategy, WalkerStrategy};

/// Errors reported by [`CourseConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Course length must be at least {required} segments, got {actual}")]
    CourseTooShort { required: usize, actual: usize },

    #[error("Height range is empty: min {min} >= max {max}")]
    EmptyHeightRange { min: f64, max: f64 },

    #[error("Mid height {mid} lies outside [{min}, {max}]")]
    MidHeightOutOfRange { mid: f64, min: f64, max: f64 },

    #[error("Field `{0}` must be strictly positive")]
    NonPositive(&'static str),

    #[error("Adversary needs at least one action (hold)")]
    NoActions,

    #[error("Tracked body part `{0}` has no binding")]
    UnboundTrackedPart(String),
}

/// Binds a role name used by strategies (e.g. `"pelvis"`) to the name of the
/// rigid body in the physics scene (e.g. `"torso"`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyPartBinding {
    pub role: String,
    pub scene_name: String,
}

impl BodyPartBinding {
    pub fn new(role: impl Into<String>, scene_name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            scene_name: scene_name.into(),
        }
    }
}

/// Height-map geometry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerrainConfig {
    /// Number of writable segments ahead of the walker's start.
    pub course_length: usize,
    /// Total number of columns in the scene's height map.
    pub heightmap_width: usize,
    /// World x of height-map column 0.
    pub origin_x: f64,
    /// World meters covered by one height-map column.
    pub segment_length: f64,
    /// Distance behind the walker's start where the writable window begins.
    pub lead_offset: f64,
    /// World-height to height-map-unit factor.
    pub scale_y: f64,
    /// Terrain floor in world units.
    pub min_height: f64,
    /// Terrain ceiling in world units.
    pub max_height: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            course_length: 100,
            heightmap_width: 513,
            origin_x: 0.0,
            segment_length: 1.0,
            lead_offset: 1.0,
            scale_y: 600.0,
            min_height: 0.0,
            max_height: 10.0,
        }
    }
}

impl TerrainConfig {
    /// Midpoint of the clamp range.
    pub fn mid_range(&self) -> f64 {
        (self.min_height + self.max_height) / 2.0
    }
}

/// Walker body layout, contact classification and termination thresholds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WalkerConfig {
    /// Role → scene-body bindings resolved at reset.
    pub body_parts: Vec<BodyPartBinding>,
    /// Role whose forward coordinate drives meter tracking.
    pub tracked_part: String,
    /// Role used for velocity/orientation terms.
    pub torso_part: String,
    /// Scene names classified as feet. Everything else counts as non-foot.
    pub foot_parts: Vec<String>,
    /// Surface names that count as terrain for contact penalties.
    pub terrain_surfaces: Vec<String>,
    /// Pain added by one non-foot terrain contact.
    pub pain_penalty: f64,
    /// Below this center-of-mass x, any pain terminates.
    pub near_threshold: f64,
    /// Below this center-of-mass x, pain above `far_pain_tolerance` terminates.
    pub far_threshold: f64,
    /// Pain tolerated within a single tick below `far_threshold`. Zero makes
    /// any hit fatal there.
    pub far_pain_tolerance: f64,
    /// Torso height below which the walker2d reward applies a penalty.
    pub target_height: f64,
    /// Forward speed targeted by the target-velocity reward at reset.
    pub target_velocity: f64,
    /// The target flips sign every this many ticks; 0 keeps it fixed.
    pub target_switch_steps: u32,
    /// Number of terrain height samples in the profile observation.
    pub profile_samples: usize,
    /// Spacing between profile samples, in meters.
    pub profile_spacing: f64,
    /// Profile starts this far behind the tracked part.
    pub profile_lookbehind: f64,
    /// Ground height assumed where a profile point has no terrain under it.
    pub profile_ceiling: f64,
    /// Strategy selected at every reset.
    pub strategy: WalkerStrategy,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            body_parts: vec![
                BodyPartBinding::new("pelvis", "torso"),
                BodyPartBinding::new("foot", "foot"),
            ],
            tracked_part: "foot".into(),
            torso_part: "pelvis".into(),
            foot_parts: vec!["foot".into()],
            terrain_surfaces: vec!["terrain".into()],
            pain_penalty: 5.0,
            near_threshold: 2.0,
            far_threshold: 100.0,
            far_pain_tolerance: 0.0,
            target_height: 0.65,
            target_velocity: 1.0,
            target_switch_steps: 400,
            profile_samples: 25,
            profile_spacing: 0.2,
            profile_lookbehind: 2.0,
            profile_ceiling: 10.0,
            strategy: WalkerStrategy::hopper(),
        }
    }
}

impl WalkerConfig {
    /// Scene name bound to `role`, if any.
    pub fn scene_name(&self, role: &str) -> Option<&str> {
        self.body_parts
            .iter()
            .find(|b| b.role == role)
            .map(|b| b.scene_name.as_str())
    }

    /// Returns true if `part_name` (a scene name) is foot-class.
    pub fn is_foot(&self, part_name: &str) -> bool {
        self.foot_parts.iter().any(|f| f == part_name)
    }

    /// Returns true if `surface_name` is part of the terrain.
    pub fn is_terrain(&self, surface_name: &str) -> bool {
        self.terrain_surfaces.iter().any(|s| s == surface_name)
    }
}

/// Terrain adversary action space and reward shaping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AdversaryConfig {
    /// Size of the discrete action space: 0 = hold, odd = raise, even = lower.
    pub action_count: usize,
    /// Height change of tier 1, in world units.
    pub unit_step: f64,
    /// Starting height of every segment; defaults to the terrain mid range.
    pub mid_height: f64,
    /// Flat hold writes performed before the walker's first tick.
    pub priming_segments: usize,
    /// Reward subtracted when an action pushes against the floor or ceiling.
    pub clamp_penalty: f64,
    /// Reward for every meter the walker crosses (segment-bonus strategy).
    pub meter_reward: f64,
    /// Upper bound of the walker reward window used for the terminal payoff.
    pub max_reward: f64,
    /// Strategy selected at every reset.
    pub strategy: AdversaryStrategy,
}

impl Default for AdversaryConfig {
    fn default() -> Self {
        Self {
            action_count: 7,
            unit_step: 0.1,
            mid_height: 5.0,
            priming_segments: 4,
            clamp_penalty: 1.0,
            meter_reward: 1.0,
            max_reward: 1000.0,
            strategy: AdversaryStrategy::SegmentBonus,
        }
    }
}

impl AdversaryConfig {
    /// Highest tier reachable with the configured action space.
    pub fn max_tier(&self) -> usize {
        self.action_count / 2
    }
}

/// Complete configuration of one episode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CourseConfig {
    pub terrain: TerrainConfig,
    pub walker: WalkerConfig,
    pub adversary: AdversaryConfig,
    /// Walker ticks before the episode is truncated. `0` means no limit.
    pub max_episode_steps: u32,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            walker: WalkerConfig::default(),
            adversary: AdversaryConfig::default(),
            max_episode_steps: 1000,
        }
    }
}

impl CourseConfig {
    /// Checks the invariants both agents rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.terrain;
        let a = &self.adversary;

        if !(t.min_height < t.max_height) {
            return Err(ConfigError::EmptyHeightRange {
                min: t.min_height,
                max: t.max_height,
            });
        }
        if !(t.min_height..=t.max_height).contains(&a.mid_height) {
            return Err(ConfigError::MidHeightOutOfRange {
                mid: a.mid_height,
                min: t.min_height,
                max: t.max_height,
            });
        }
        for (name, value) in [
            ("terrain.scale_y", t.scale_y),
            ("terrain.segment_length", t.segment_length),
            ("adversary.unit_step", a.unit_step),
            ("adversary.max_reward", a.max_reward),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive(name));
            }
        }
        if a.action_count == 0 {
            return Err(ConfigError::NoActions);
        }
        // Priming writes plus at least one decision must fit in the window.
        let required = a.priming_segments + 1;
        if t.course_length < required {
            return Err(ConfigError::CourseTooShort {
                required,
                actual: t.course_length,
            });
        }
        let w = &self.walker;
        for role in [&w.tracked_part, &w.torso_part] {
            if w.scene_name(role).is_none() {
                return Err(ConfigError::UnboundTrackedPart(role.clone()));
            }
        }
        Ok(())
    }

    /// Observation size of the adversary.
    pub fn adversary_observation_dim(&self) -> usize {
        Self::ADVERSARY_FEATURE_DIM
    }

    /// Steps since last meter, current height, last action reward.
    pub const ADVERSARY_FEATURE_DIM: usize = 3;
}
