//! The terrain-shaping agent.

pub mod agent;
pub mod error;

pub use agent::{action_delta, ActionOutcome, AdversaryPhase, TerrainAdversary};
pub use error::AdversaryError;
