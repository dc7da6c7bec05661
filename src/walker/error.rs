use thiserror::Error;

use super::agent::WalkerPhase;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalkerError {
    #[error("Body part `{role}` (scene body `{scene_name}`) not found in the physics scene")]
    MissingBodyPart { role: String, scene_name: String },

    #[error("Body role `{0}` has no scene binding")]
    UnboundRole(String),

    #[error("Walker is not active (phase: {0:?})")]
    NotActive(WalkerPhase),

    #[error("Cannot rebind strategies while an episode is in progress")]
    StrategyRebind,

    #[error("Walker cannot finish from phase {0:?}; it must be terminating")]
    NotTerminating(WalkerPhase),

    #[error("Body part `{0}` reported a non-finite position")]
    NonFinitePosition(String),
}
