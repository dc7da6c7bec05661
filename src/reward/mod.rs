//! Per-agent reward ledger.

pub mod accumulator;
pub mod error;

pub use accumulator::RewardAccumulator;
pub use error::RewardError;
