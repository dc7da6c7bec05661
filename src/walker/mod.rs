//! The locomoting agent.

pub mod agent;
pub mod error;

pub use agent::{ContactKind, TickOutcome, WalkerAgent, WalkerPhase};
pub use error::WalkerError;
