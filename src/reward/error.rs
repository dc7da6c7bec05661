use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RewardError {
    #[error("Reward ledger already drained this episode")]
    AlreadyDrained,

    #[error("Maximum reward must be finite and positive, got {0}")]
    InvalidMaxReward(f64),
}
