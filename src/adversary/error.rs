use thiserror::Error;

use super::agent::AdversaryPhase;
use crate::reward::RewardError;
use crate::terrain::TerrainError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdversaryError {
    #[error("Action {action} outside the action space of size {action_count}")]
    InvalidAction { action: usize, action_count: usize },

    #[error("A decision is already pending; supply an action before the next request")]
    DecisionPending,

    #[error("No decision was requested")]
    NoDecisionRequested,

    #[error("Adversary is not active (phase: {0:?})")]
    NotActive(AdversaryPhase),

    #[error("Cannot rebind strategies while an episode is in progress")]
    StrategyRebind,

    #[error("No writable terrain left: all {0} segments are written")]
    CourseExhausted(usize),

    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error(transparent)]
    Reward(#[from] RewardError),
}
