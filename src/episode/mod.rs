//! Episode coordination between the walker and the terrain adversary.

pub mod coordinator;
pub mod error;

#[cfg(test)]
mod tests;

pub use coordinator::{EpisodeCoordinator, EpisodeOutcome, EpisodePhase, EpisodeSummary, StepReport};
pub use error::EpisodeError;
