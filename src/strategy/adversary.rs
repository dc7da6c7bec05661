//! Terrain adversary strategy catalogue.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::StrategySet;
use crate::config::AdversaryConfig;

/// Snapshot of the adversary handed to its strategy functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdversaryContext {
    /// Walker ticks between the last two meter crossings.
    pub steps_since_last_meter: u32,
    pub current_height: f64,
    /// Nominal size of the last action, zero if it was clamped.
    pub last_action_reward: f64,
    /// Next writable segment.
    pub height_index: usize,
    pub course_length: usize,
}

impl AdversaryContext {
    /// No writable segment is left ahead of the walker.
    pub fn course_exhausted(&self) -> bool {
        self.height_index >= self.course_length
    }
}

/// How the adversary is paid on each meter the walker crosses.
///
/// All variants receive the same inverse terminal payoff; they differ only in
/// the per-meter reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AdversaryStrategy {
    /// Meter bonus plus the pending action reward.
    SegmentBonus,
    /// Pending action reward only.
    ActionOnly,
    /// Nothing until the terminal payoff.
    TerminalOnly,
}

impl AdversaryStrategy {
    /// Builds the function set for this variant.
    ///
    /// The termination function reports an exhausted course; the coordinator
    /// reacts by ending the episode through its relay path.
    pub fn build(&self, config: &AdversaryConfig) -> StrategySet<AdversaryContext> {
        let reward: super::RewardFn<AdversaryContext> = match self {
            AdversaryStrategy::SegmentBonus => {
                let meter_reward = config.meter_reward;
                Box::new(move |c: &AdversaryContext| meter_reward + c.last_action_reward)
            }
            AdversaryStrategy::ActionOnly => {
                Box::new(|c: &AdversaryContext| c.last_action_reward)
            }
            AdversaryStrategy::TerminalOnly => Box::new(|_: &AdversaryContext| 0.0),
        };
        StrategySet {
            name: self.to_string(),
            observe: Box::new(|c: &AdversaryContext| {
                vec![
                    f64::from(c.steps_since_last_meter),
                    c.current_height,
                    c.last_action_reward,
                ]
            }),
            reward,
            terminate: Box::new(AdversaryContext::course_exhausted),
        }
    }
}

impl fmt::Display for AdversaryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdversaryStrategy::SegmentBonus => write!(f, "segment_bonus"),
            AdversaryStrategy::ActionOnly => write!(f, "action_only"),
            AdversaryStrategy::TerminalOnly => write!(f, "terminal_only"),
        }
    }
}
