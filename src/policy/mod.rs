//! Policies that choose terrain actions for the adversary.

pub mod heuristic;
pub mod random;
pub mod scripted;
pub mod trait_;

pub use heuristic::PressureHeuristicPolicy;
pub use random::RandomTerrainPolicy;
pub use scripted::ScriptedTerrainPolicy;
pub use trait_::TerrainPolicy;
