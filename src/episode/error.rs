use thiserror::Error;

use super::coordinator::EpisodePhase;
use crate::adversary::AdversaryError;
use crate::config::ConfigError;
use crate::walker::WalkerError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EpisodeError {
    #[error("Episode is not running (phase: {0:?})")]
    NotRunning(EpisodePhase),

    #[error("Invalid course configuration: {0}")]
    ConfigInvalid(#[from] ConfigError),

    #[error(transparent)]
    Walker(#[from] WalkerError),

    #[error(transparent)]
    Adversary(#[from] AdversaryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_running_display() {
        let e = EpisodeError::NotRunning(EpisodePhase::Finished);
        assert_eq!(e.to_string(), "Episode is not running (phase: Finished)");
    }

    #[test]
    fn config_error_display_is_prefixed() {
        let e = EpisodeError::from(ConfigError::NoActions);
        assert_eq!(
            e.to_string(),
            "Invalid course configuration: Adversary needs at least one action (hold)"
        );
    }

    #[test]
    fn agent_errors_are_transparent() {
        let e = EpisodeError::from(AdversaryError::DecisionPending);
        assert_eq!(e.to_string(), AdversaryError::DecisionPending.to_string());
        let e = EpisodeError::from(WalkerError::StrategyRebind);
        assert_eq!(e.to_string(), WalkerError::StrategyRebind.to_string());
    }
}
