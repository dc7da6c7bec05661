//! assault_course - adversarial terrain episodes for locomotion agents
//!
//! Two agents share one episode: a physically simulated walker trying to make
//! forward progress, and a terrain adversary that reshapes the ground ahead of
//! it one segment per meter traveled. The crate owns the coordination between
//! the two, the height-map state machine, and the pluggable
//! observation/reward/termination strategies. Physics and the policies that
//! choose actions live outside and plug in through [`physics::PhysicsOracle`]
//! and [`policy::TerrainPolicy`].

pub mod adversary;
pub mod config;
pub mod curriculum;
pub mod episode;
pub mod metrics;
pub mod physics;
pub mod policy;
pub mod reward;
pub mod strategy;
pub mod terrain;
pub mod units;
pub mod walker;

pub use adversary::{AdversaryError, AdversaryPhase, TerrainAdversary};
pub use config::{AdversaryConfig, ConfigError, CourseConfig, TerrainConfig, WalkerConfig};
pub use curriculum::{Curriculum, CurriculumError, MetaCurriculum};
pub use episode::{EpisodeCoordinator, EpisodeError, EpisodeOutcome, EpisodeSummary, StepReport};
pub use metrics::CourseMetrics;
pub use physics::{PhysicsOracle, ScriptedPhysics};
pub use policy::TerrainPolicy;
pub use reward::{RewardAccumulator, RewardError};
pub use strategy::{AdversaryStrategy, StrategySet, WalkerStrategy};
pub use terrain::{ClampResult, HeightField, TerrainError};
pub use walker::{WalkerAgent, WalkerError, WalkerPhase};

/// Identifier type used for episodes.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}

/// Flat observation vector handed to a policy.
pub type Observation = Vec<f64>;
