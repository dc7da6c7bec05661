//! Terrain adversary state machine: `Uninitialized -> Priming -> Active -> Done`.
//!
//! The adversary writes one terrain segment per decision. Decisions are only
//! requested when the walker crosses a whole meter, so the adversary runs at
//! a far lower cadence than the walker.

use tracing::debug;

use super::error::AdversaryError;
use crate::config::{AdversaryConfig, TerrainConfig};
use crate::reward::RewardAccumulator;
use crate::strategy::{AdversaryContext, AdversaryStrategy, StrategySet};
use crate::terrain::HeightField;
use crate::Observation;

/// Lifecycle phase of the adversary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdversaryPhase {
    #[default]
    Uninitialized,
    /// Writing the flat lead-in segments.
    Priming,
    Active,
    Done,
}

/// Effect of one terrain write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionOutcome {
    pub action: usize,
    /// Segment that was written.
    pub segment: usize,
    pub requested_height: f64,
    pub written_height: f64,
    pub was_clamped: bool,
    /// Nominal action size; zero when clamped.
    pub action_reward: f64,
    /// Reward applied immediately (the clamp penalty, or zero).
    pub penalty: f64,
}

/// Height change of a discrete action.
///
/// `0` holds. Odd actions raise and even actions lower, by
/// `floor((action + 1) / 2) * unit_step`: `1 = +1 tier`, `2 = -1 tier`,
/// `3 = +2 tiers`, and so on.
pub fn action_delta(action: usize, unit_step: f64) -> f64 {
    if action == 0 {
        return 0.0;
    }
    let size = ((action + 1) / 2) as f64 * unit_step;
    if (action - 1) % 2 == 0 {
        size
    } else {
        -size
    }
}

/// The terrain-shaping agent. Sole owner and writer of the course's
/// [`HeightField`].
#[derive(Debug)]
pub struct TerrainAdversary {
    config: AdversaryConfig,
    terrain_config: TerrainConfig,
    strategies: StrategySet<AdversaryContext>,
    custom_strategies: bool,
    field: Option<HeightField>,
    phase: AdversaryPhase,
    ctx: AdversaryContext,
    rewards: RewardAccumulator,
    awaiting_decision: bool,
    last_meter_step: u32,
    decisions: u32,
    clamp_events: u32,
}

impl TerrainAdversary {
    pub fn new(config: AdversaryConfig, terrain_config: TerrainConfig) -> Self {
        let strategies = config.strategy.build(&config);
        Self {
            config,
            terrain_config,
            strategies,
            custom_strategies: false,
            field: None,
            phase: AdversaryPhase::Uninitialized,
            ctx: AdversaryContext::default(),
            rewards: RewardAccumulator::new(),
            awaiting_decision: false,
            last_meter_step: 0,
            decisions: 0,
            clamp_events: 0,
        }
    }

    /// Replaces the catalogue strategy with a custom set for all later episodes.
    ///
    /// Rejected while priming or active.
    pub fn bind_strategies(
        &mut self,
        set: StrategySet<AdversaryContext>,
    ) -> Result<(), AdversaryError> {
        if matches!(self.phase, AdversaryPhase::Priming | AdversaryPhase::Active) {
            return Err(AdversaryError::StrategyRebind);
        }
        self.strategies = set;
        self.custom_strategies = true;
        Ok(())
    }

    /// Allocates the course window around the walker's start, flattens it to
    /// mid height and writes the priming segments.
    ///
    /// Must run after the walker's reset so `walker_start_x` is resolved.
    pub fn reset(
        &mut self,
        walker_start_x: f64,
        walker_step_count: u32,
    ) -> Result<Observation, AdversaryError> {
        let mut field = HeightField::for_start(&self.terrain_config, walker_start_x)?;
        field.fill(self.config.mid_height)?;

        if !self.custom_strategies {
            self.strategies = self.config.strategy.build(&self.config);
        }
        self.ctx = AdversaryContext {
            current_height: self.config.mid_height,
            course_length: field.len(),
            ..AdversaryContext::default()
        };
        self.field = Some(field);
        self.rewards.reset();
        self.awaiting_decision = false;
        self.decisions = 0;
        self.clamp_events = 0;

        self.phase = AdversaryPhase::Priming;
        for _ in 0..self.config.priming_segments {
            self.write_segment(0)?;
        }
        self.ctx.last_action_reward = 0.0;
        self.last_meter_step = walker_step_count;
        self.phase = AdversaryPhase::Active;

        debug!(
            origin = self.field.as_ref().map(HeightField::origin_index),
            primed = self.ctx.height_index,
            "adversary reset"
        );
        Ok(self.strategies.observe(&self.ctx))
    }

    /// Handles a meter crossed by the walker and requests the next decision.
    ///
    /// Folds the pending action reward into the ledger according to the
    /// strategy, and returns the observation the policy must answer with
    /// exactly one [`apply_action`](Self::apply_action).
    pub fn on_meter_crossed(&mut self, walker_step_count: u32) -> Result<Observation, AdversaryError> {
        if self.phase != AdversaryPhase::Active {
            return Err(AdversaryError::NotActive(self.phase));
        }
        if self.awaiting_decision {
            return Err(AdversaryError::DecisionPending);
        }
        if self.course_exhausted() {
            return Err(AdversaryError::CourseExhausted(self.ctx.course_length));
        }
        self.ctx.steps_since_last_meter = walker_step_count.saturating_sub(self.last_meter_step);
        self.last_meter_step = walker_step_count;

        // Observed before the pending action reward is cleared, so the policy
        // sees what its previous decision earned.
        let observation = self.strategies.observe(&self.ctx);
        let reward = self.strategies.reward(&self.ctx);
        self.rewards.add(reward);
        self.ctx.last_action_reward = 0.0;
        self.awaiting_decision = true;
        Ok(observation)
    }

    /// Applies the policy's answer to the pending decision request.
    pub fn apply_action(&mut self, action: usize) -> Result<ActionOutcome, AdversaryError> {
        if self.phase != AdversaryPhase::Active {
            return Err(AdversaryError::NotActive(self.phase));
        }
        if !self.awaiting_decision {
            return Err(AdversaryError::NoDecisionRequested);
        }
        if action >= self.config.action_count {
            return Err(AdversaryError::InvalidAction {
                action,
                action_count: self.config.action_count,
            });
        }
        let outcome = self.write_segment(action)?;
        if outcome.penalty != 0.0 {
            self.rewards.add(outcome.penalty);
        }
        self.awaiting_decision = false;
        self.decisions += 1;
        debug!(
            action,
            segment = outcome.segment,
            height = outcome.written_height,
            clamped = outcome.was_clamped,
            "terrain segment written"
        );
        Ok(outcome)
    }

    /// Closes the episode with the walker's ledger.
    ///
    /// The walker's cumulative reward is drained into the inverse payoff
    /// `max_reward - clamp(cumulative, 0, max_reward)`, which is added to the
    /// adversary's own ledger. Returns `None` (and leaves everything untouched)
    /// if the adversary is already done.
    pub fn terminate(
        &mut self,
        walker_rewards: &mut RewardAccumulator,
    ) -> Result<Option<f64>, AdversaryError> {
        match self.phase {
            AdversaryPhase::Done => return Ok(None),
            AdversaryPhase::Uninitialized => return Err(AdversaryError::NotActive(self.phase)),
            AdversaryPhase::Priming | AdversaryPhase::Active => {}
        }
        let payoff = walker_rewards.drain_clamped(self.config.max_reward)?;
        self.rewards.add(payoff);
        self.awaiting_decision = false;
        self.phase = AdversaryPhase::Done;
        debug!(
            walker_reward = walker_rewards.cumulative(),
            payoff,
            "adversary terminated"
        );
        Ok(Some(payoff))
    }

    fn write_segment(&mut self, action: usize) -> Result<ActionOutcome, AdversaryError> {
        let field = self
            .field
            .as_mut()
            .ok_or(AdversaryError::NotActive(self.phase))?;
        let segment = self.ctx.height_index;
        let delta = action_delta(action, self.config.unit_step);
        let requested_height = self.ctx.current_height + delta;
        let result = field.write(segment, requested_height)?;

        self.ctx.current_height = result.written_height;
        self.ctx.height_index += 1;
        let (action_reward, penalty) = if result.was_clamped {
            self.clamp_events += 1;
            (0.0, -self.config.clamp_penalty)
        } else {
            (delta.abs(), 0.0)
        };
        self.ctx.last_action_reward = action_reward;

        Ok(ActionOutcome {
            action,
            segment,
            requested_height,
            written_height: result.written_height,
            was_clamped: result.was_clamped,
            action_reward,
            penalty,
        })
    }

    /// True when no writable segment is left, or a custom terminate
    /// function says the course is over.
    pub fn course_exhausted(&self) -> bool {
        self.ctx.course_exhausted() || self.strategies.should_terminate(&self.ctx)
    }

    /// Current observation for the policy.
    pub fn observe(&self) -> Observation {
        self.strategies.observe(&self.ctx)
    }

    pub fn phase(&self) -> AdversaryPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == AdversaryPhase::Done
    }

    pub fn awaiting_decision(&self) -> bool {
        self.awaiting_decision
    }

    pub fn height_index(&self) -> usize {
        self.ctx.height_index
    }

    pub fn current_height(&self) -> f64 {
        self.ctx.current_height
    }

    pub fn last_action_reward(&self) -> f64 {
        self.ctx.last_action_reward
    }

    pub fn steps_since_last_meter(&self) -> u32 {
        self.ctx.steps_since_last_meter
    }

    /// Decisions applied this episode.
    pub fn decisions(&self) -> u32 {
        self.decisions
    }

    pub fn clamp_events(&self) -> u32 {
        self.clamp_events
    }

    /// Read-only view of the course, for syncing into the simulator.
    pub fn terrain(&self) -> Option<&HeightField> {
        self.field.as_ref()
    }

    pub fn rewards(&self) -> &RewardAccumulator {
        &self.rewards
    }

    pub fn strategy(&self) -> AdversaryStrategy {
        self.config.strategy
    }

    /// Name of the bound set; differs from `strategy()` once a custom set is bound.
    pub fn strategy_name(&self) -> &str {
        self.strategies.name()
    }
}
