//! Walker state machine: `Uninitialized -> Active -> Terminating -> Done`.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::debug;

use super::error::WalkerError;
use crate::config::WalkerConfig;
use crate::physics::{BodyHandle, PhysicsOracle};
use crate::reward::RewardAccumulator;
use crate::strategy::{StrategySet, WalkerContext, WalkerStrategy};
use crate::units::{meters, whole_meter};
use crate::Observation;

/// Lifecycle phase of the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WalkerPhase {
    #[default]
    Uninitialized,
    Active,
    /// The termination function fired (or the episode was aborted); waiting
    /// for the coordinator to relay the final reward.
    Terminating,
    Done,
}

/// How a contact event was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Benign ground contact.
    Foot,
    /// Harmful contact: pain added, recovery mode entered.
    NonFoot,
    /// Not a terrain contact, or the walker is not active.
    Ignored,
}

/// Result of one [`WalkerAgent::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub observation: Observation,
    pub reward: f64,
    /// Whole meters reached for the first time this tick, ascending.
    /// Empty when no new meter was reached.
    pub meters_crossed: RangeInclusive<i64>,
    pub terminated: bool,
}

/// The locomoting agent.
///
/// Reads the simulator through a [`PhysicsOracle`] once per tick; contact
/// events are pushed in between ticks with [`on_contact`](Self::on_contact).
#[derive(Debug)]
pub struct WalkerAgent {
    config: WalkerConfig,
    strategy: WalkerStrategy,
    strategies: StrategySet<WalkerContext>,
    custom_strategies: bool,
    body_parts: HashMap<String, BodyHandle>,
    phase: WalkerPhase,
    ctx: WalkerContext,
    rewards: RewardAccumulator,
}

impl WalkerAgent {
    /// Creates an unbound walker using the strategy named in `config`.
    pub fn new(config: WalkerConfig) -> Self {
        let strategy = config.strategy;
        let strategies = strategy.build(&config);
        Self {
            config,
            strategy,
            strategies,
            custom_strategies: false,
            body_parts: HashMap::new(),
            phase: WalkerPhase::Uninitialized,
            ctx: WalkerContext::default(),
            rewards: RewardAccumulator::new(),
        }
    }

    /// Replaces the catalogue strategy with a custom set for all later episodes.
    ///
    /// Rejected while an episode is in progress.
    pub fn bind_strategies(&mut self, set: StrategySet<WalkerContext>) -> Result<(), WalkerError> {
        if matches!(self.phase, WalkerPhase::Active | WalkerPhase::Terminating) {
            return Err(WalkerError::StrategyRebind);
        }
        self.strategies = set;
        self.custom_strategies = true;
        Ok(())
    }

    /// Binds body parts, clears counters and starts a new episode.
    ///
    /// Returns the initial observation.
    pub fn reset(&mut self, physics: &dyn PhysicsOracle) -> Result<Observation, WalkerError> {
        let mut body_parts = HashMap::with_capacity(self.config.body_parts.len());
        for binding in &self.config.body_parts {
            let handle = physics.resolve_body(&binding.scene_name).ok_or_else(|| {
                WalkerError::MissingBodyPart {
                    role: binding.role.clone(),
                    scene_name: binding.scene_name.clone(),
                }
            })?;
            body_parts.insert(binding.role.clone(), handle);
        }
        for role in [&self.config.tracked_part, &self.config.torso_part] {
            if !body_parts.contains_key(role) {
                return Err(WalkerError::UnboundRole(role.clone()));
            }
        }
        self.body_parts = body_parts;

        if !self.custom_strategies {
            self.strategies = self.strategy.build(&self.config);
        }
        self.rewards.reset();
        self.ctx = WalkerContext::default();
        self.snapshot(physics);
        self.check_finite()?;
        self.ctx.last_whole_meter = whole_meter(meters(self.ctx.tracked.position[0]));
        self.ctx.target_velocity = self.config.target_velocity;
        self.phase = WalkerPhase::Active;

        debug!(
            strategy = self.strategies.name(),
            start_meter = self.ctx.last_whole_meter,
            "walker reset"
        );
        Ok(self.strategies.observe(&self.ctx))
    }

    /// Advances the walker by one simulation step.
    ///
    /// Order: meter tracking, reward, termination, observation. Pain and
    /// contact flags collected since the previous tick are visible to both
    /// the reward and the termination function, then cleared.
    pub fn tick(&mut self, physics: &dyn PhysicsOracle) -> Result<TickOutcome, WalkerError> {
        if self.phase != WalkerPhase::Active {
            return Err(WalkerError::NotActive(self.phase));
        }
        self.snapshot(physics);
        self.check_finite()?;
        self.ctx.step_count += 1;
        let switch = self.config.target_switch_steps;
        if switch > 0 && self.ctx.step_count % switch == 0 {
            self.ctx.target_velocity = -self.ctx.target_velocity;
        }

        // A range rather than a list: a simulator blow-up can jump by an
        // arbitrary number of meters in one tick.
        let last = self.ctx.last_whole_meter;
        let current = whole_meter(meters(self.ctx.tracked.position[0]));
        let meters_crossed = if current > last {
            self.ctx.last_whole_meter = current;
            last + 1..=current
        } else {
            RangeInclusive::new(1, 0)
        };

        let reward = self.strategies.reward(&self.ctx);
        self.rewards.add(reward);
        let terminated = self.strategies.should_terminate(&self.ctx);
        let observation = self.strategies.observe(&self.ctx);

        if self.ctx.recovery_mode && self.ctx.foot_contact && self.ctx.pain == 0.0 {
            self.ctx.recovery_mode = false;
        }
        self.ctx.pain = 0.0;
        self.ctx.non_foot_hit = false;
        self.ctx.foot_contact = false;

        if terminated {
            debug!(
                step = self.ctx.step_count,
                x = self.ctx.center_of_mass[0],
                "walker terminating"
            );
            self.phase = WalkerPhase::Terminating;
        }

        Ok(TickOutcome {
            observation,
            reward,
            meters_crossed,
            terminated,
        })
    }

    /// Classifies a contact-begin event reported by the simulator.
    ///
    /// Scene names not listed as feet count as non-foot, so unknown parts
    /// are penalized rather than ignored.
    pub fn on_contact(&mut self, part_name: &str, surface_name: &str) -> ContactKind {
        if self.phase != WalkerPhase::Active || !self.config.is_terrain(surface_name) {
            return ContactKind::Ignored;
        }
        if self.config.is_foot(part_name) {
            self.ctx.foot_contact = true;
            return ContactKind::Foot;
        }
        self.ctx.non_foot_hit = true;
        self.ctx.pain += self.config.pain_penalty;
        self.ctx.recovery_mode = true;
        debug!(part = part_name, pain = self.ctx.pain, "non-foot terrain contact");
        ContactKind::NonFoot
    }

    /// Forces an active walker into `Terminating` (external abort).
    ///
    /// Returns false if the walker was not active.
    pub fn request_termination(&mut self) -> bool {
        if self.phase != WalkerPhase::Active {
            return false;
        }
        self.phase = WalkerPhase::Terminating;
        true
    }

    /// `Terminating -> Done`. Hands out the ledger for the terminal relay.
    pub fn finish(&mut self) -> Result<&mut RewardAccumulator, WalkerError> {
        if self.phase != WalkerPhase::Terminating {
            return Err(WalkerError::NotTerminating(self.phase));
        }
        self.phase = WalkerPhase::Done;
        Ok(&mut self.rewards)
    }

    fn check_finite(&self) -> Result<(), WalkerError> {
        let finite = |p: [f64; 3]| p.iter().all(|v| v.is_finite());
        if !finite(self.ctx.tracked.position) {
            return Err(WalkerError::NonFinitePosition(
                self.config.tracked_part.clone(),
            ));
        }
        if !finite(self.ctx.torso.position) {
            return Err(WalkerError::NonFinitePosition(self.config.torso_part.clone()));
        }
        Ok(())
    }

    fn snapshot(&mut self, physics: &dyn PhysicsOracle) {
        if let Some(h) = self.body_parts.get(&self.config.torso_part) {
            self.ctx.torso = physics.kinematics(*h);
        }
        if let Some(h) = self.body_parts.get(&self.config.tracked_part) {
            self.ctx.tracked = physics.kinematics(*h);
        }
        self.ctx.center_of_mass = physics.center_of_mass();
        self.ctx.effort = physics.effort();
        self.ctx.joints_at_limit = physics.joints_at_limit();
        if self.custom_strategies || self.strategy.observation.needs_profile() {
            self.sample_profile(physics);
        }
    }

    /// Heights of the tracked part above the terrain, sampled from
    /// `profile_lookbehind` meters behind it. A point with no terrain under
    /// it reads as if the ground stood at `profile_ceiling`.
    fn sample_profile(&mut self, physics: &dyn PhysicsOracle) {
        let spacing = self.config.profile_spacing;
        let ceiling = self.config.profile_ceiling;
        let start = self.ctx.tracked.position[0] - self.config.profile_lookbehind;
        let y = self.ctx.tracked.position[1];
        self.ctx.profile_fraction = (start - (start / spacing).floor() * spacing) / spacing;
        self.ctx.terrain_profile = (0..self.config.profile_samples)
            .map(|i| {
                let x = start + i as f64 * spacing;
                y - physics.terrain_height(x).unwrap_or(ceiling)
            })
            .collect();
    }

    pub fn phase(&self) -> WalkerPhase {
        self.phase
    }

    /// Ticks taken this episode.
    pub fn step_count(&self) -> u32 {
        self.ctx.step_count
    }

    pub fn last_whole_meter(&self) -> i64 {
        self.ctx.last_whole_meter
    }

    pub fn pain(&self) -> f64 {
        self.ctx.pain
    }

    pub fn recovery_mode(&self) -> bool {
        self.ctx.recovery_mode
    }

    pub fn center_of_mass(&self) -> [f64; 3] {
        self.ctx.center_of_mass
    }

    /// World x of the tracked body part.
    pub fn tracked_x(&self) -> f64 {
        self.ctx.tracked.position[0]
    }

    pub fn body_part(&self, role: &str) -> Option<BodyHandle> {
        self.body_parts.get(role).copied()
    }

    pub fn rewards(&self) -> &RewardAccumulator {
        &self.rewards
    }

    pub fn context(&self) -> &WalkerContext {
        &self.ctx
    }

    pub fn strategy_name(&self) -> &str {
        self.strategies.name()
    }
}
