//! Episode coordinator.
//!
//! Owns one walker and one terrain adversary and is the only component that
//! crosses the boundary between them: it forwards meter crossings to the
//! adversary as decision requests, and it relays the walker's terminal
//! ledger to the adversary when the episode ends.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Span};

use super::error::EpisodeError;
use crate::adversary::{ActionOutcome, TerrainAdversary};
use crate::config::CourseConfig;
use crate::physics::PhysicsOracle;
use crate::policy::TerrainPolicy;
use crate::strategy::{AdversaryContext, StrategySet, WalkerContext};
use crate::terrain::HeightField;
use crate::walker::{ContactKind, WalkerAgent, WalkerPhase};
use crate::{generate_id, Id, Observation};

/// Lifecycle of the coordinator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EpisodePhase {
    /// No episode has been started.
    #[default]
    Idle,
    Running,
    /// The last episode went through the relay; call `reset` to start over.
    Finished,
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EpisodeOutcome {
    /// The walker's termination function fired.
    Fell,
    /// The step budget ran out.
    Truncated,
    /// The walker crossed a meter with no writable segment left.
    CourseExhausted,
    /// The driver aborted the episode, or an action failed.
    Aborted,
}

/// Final accounting of one episode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpisodeSummary {
    pub id: Id,
    /// Walker ticks taken.
    pub steps: u32,
    /// Whole meters gained over the start position.
    pub meters: i64,
    /// Walker cumulative reward (before the terminal drain).
    pub walker_reward: f64,
    /// Adversary cumulative reward, terminal payoff included.
    pub adversary_reward: f64,
    /// Inverse payoff the adversary received at termination.
    pub terminal_payoff: f64,
    /// Terrain decisions applied.
    pub decisions: u32,
    /// Decisions that hit the floor or ceiling.
    pub clamp_events: u32,
    pub outcome: EpisodeOutcome,
}

/// Result of one [`EpisodeCoordinator::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Walker tick number.
    pub step: u32,
    /// Walker observation after the tick.
    pub observation: Observation,
    /// Walker reward for the tick.
    pub reward: f64,
    /// Meters handled this tick, ascending. After a jump past the end of
    /// the course only the first unanswerable meter is listed.
    pub meters_crossed: Vec<i64>,
    /// Terrain writes performed for this tick's meter crossings.
    pub decisions: Vec<ActionOutcome>,
    /// Present iff the episode ended on this tick.
    pub summary: Option<EpisodeSummary>,
}

impl StepReport {
    pub fn is_done(&self) -> bool {
        self.summary.is_some()
    }
}

/// Drives one walker and one terrain adversary through episodes.
///
/// # Lifecycle
///
/// 1. Call [`EpisodeCoordinator::new`] with a validated [`CourseConfig`].
/// 2. Call [`EpisodeCoordinator::reset`] once the simulator holds the walker
///    at its start pose.
/// 3. After each simulator step, forward contact-begin events with
///    [`on_contact`](EpisodeCoordinator::on_contact), then call
///    [`step`](EpisodeCoordinator::step).
/// 4. Sync [`terrain`](EpisodeCoordinator::terrain) into the simulator after
///    every step that reports decisions.
/// 5. The step that ends the episode carries its [`EpisodeSummary`].
///
/// Every episode ends through a single relay: the walker goes
/// `Terminating -> Done`, then the adversary drains the walker's ledger.
/// Neither side can be terminated twice.
#[derive(Debug)]
pub struct EpisodeCoordinator {
    config: CourseConfig,
    walker: WalkerAgent,
    adversary: TerrainAdversary,
    phase: EpisodePhase,
    episode_id: Option<Id>,
    start_meter: i64,
    span: Span,
    last_summary: Option<EpisodeSummary>,
    episodes: u32,
}

impl EpisodeCoordinator {
    /// Builds both agents from `config` after validating it.
    pub fn new(config: CourseConfig) -> Result<Self, EpisodeError> {
        config.validate()?;
        let walker = WalkerAgent::new(config.walker.clone());
        let adversary = TerrainAdversary::new(config.adversary.clone(), config.terrain.clone());
        Ok(Self {
            config,
            walker,
            adversary,
            phase: EpisodePhase::Idle,
            episode_id: None,
            start_meter: 0,
            span: Span::none(),
            last_summary: None,
            episodes: 0,
        })
    }

    /// Replaces the walker's catalogue strategy with a custom set.
    ///
    /// Only allowed between episodes.
    pub fn bind_walker_strategies(
        &mut self,
        set: StrategySet<WalkerContext>,
    ) -> Result<(), EpisodeError> {
        self.walker.bind_strategies(set)?;
        Ok(())
    }

    /// Replaces the adversary's catalogue strategy with a custom set.
    ///
    /// Only allowed between episodes.
    pub fn bind_adversary_strategies(
        &mut self,
        set: StrategySet<AdversaryContext>,
    ) -> Result<(), EpisodeError> {
        self.adversary.bind_strategies(set)?;
        Ok(())
    }

    /// Starts a new episode: walker first, then the adversary, whose window
    /// is placed from the walker's resolved start position.
    ///
    /// An episode still running is aborted through the relay first.
    /// Returns the walker's initial observation.
    pub fn reset(&mut self, physics: &dyn PhysicsOracle) -> Result<Observation, EpisodeError> {
        if self.phase == EpisodePhase::Running {
            warn!("reset while running; aborting previous episode");
            self.abort()?;
        }

        let id = generate_id();
        self.span = info_span!("episode", id = %id);
        let span = self.span.clone();
        let _guard = span.enter();

        self.phase = EpisodePhase::Idle;
        self.episode_id = None;
        let observation = self.walker.reset(physics)?;
        self.adversary
            .reset(self.walker.tracked_x(), self.walker.step_count())?;

        self.start_meter = self.walker.last_whole_meter();
        self.episode_id = Some(id);
        self.phase = EpisodePhase::Running;
        self.episodes += 1;
        info!(
            start_x = self.walker.tracked_x(),
            walker_strategy = self.walker.strategy_name(),
            adversary_strategy = self.adversary.strategy_name(),
            "episode started"
        );
        Ok(observation)
    }

    /// Forwards a contact-begin event to the walker.
    pub fn on_contact(&mut self, part_name: &str, surface_name: &str) -> ContactKind {
        self.walker.on_contact(part_name, surface_name)
    }

    /// Advances the episode by one walker tick.
    ///
    /// Each meter crossed during the tick becomes one decision request,
    /// answered synchronously by `policy`, so terrain writes land before the
    /// next tick. Any error aborts the episode through the relay before it
    /// is returned.
    pub fn step(
        &mut self,
        physics: &dyn PhysicsOracle,
        policy: &mut dyn TerrainPolicy,
    ) -> Result<StepReport, EpisodeError> {
        if self.phase != EpisodePhase::Running {
            return Err(EpisodeError::NotRunning(self.phase));
        }
        let span = self.span.clone();
        let _guard = span.enter();

        match self.advance(physics, policy) {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!(error = %e, "step failed; aborting episode");
                if let Err(relay_err) = self.relay(EpisodeOutcome::Aborted) {
                    warn!(error = %relay_err, "relay after failed step did not complete");
                }
                Err(e)
            }
        }
    }

    fn advance(
        &mut self,
        physics: &dyn PhysicsOracle,
        policy: &mut dyn TerrainPolicy,
    ) -> Result<StepReport, EpisodeError> {
        let tick = self.walker.tick(physics)?;
        let step = self.walker.step_count();

        // Stops at the first meter the course cannot answer, so a huge jump
        // costs at most one iteration per remaining segment.
        let mut decisions = Vec::new();
        let mut meters_crossed = Vec::new();
        let mut outcome = None;
        for meter in tick.meters_crossed {
            meters_crossed.push(meter);
            if self.adversary.course_exhausted() {
                debug!(meter, "meter crossed with no terrain left");
                outcome = Some(EpisodeOutcome::CourseExhausted);
                break;
            }
            let observation = self.adversary.on_meter_crossed(step)?;
            let action = policy.select_action(&observation);
            debug!(meter, action, policy = policy.name(), "terrain decision");
            decisions.push(self.adversary.apply_action(action)?);
        }

        if tick.terminated {
            outcome = Some(EpisodeOutcome::Fell);
        } else if outcome.is_some() {
            self.walker.request_termination();
        } else if self.config.max_episode_steps > 0 && step >= self.config.max_episode_steps {
            self.walker.request_termination();
            outcome = Some(EpisodeOutcome::Truncated);
        }

        let summary = match outcome {
            Some(o) => Some(self.relay(o)?),
            None => None,
        };
        Ok(StepReport {
            step,
            observation: tick.observation,
            reward: tick.reward,
            meters_crossed,
            decisions,
            summary,
        })
    }

    /// Ends the running episode from outside (e.g. a wall-clock budget).
    ///
    /// Both agents still go through their terminal transition exactly once.
    pub fn abort(&mut self) -> Result<EpisodeSummary, EpisodeError> {
        if self.phase != EpisodePhase::Running {
            return Err(EpisodeError::NotRunning(self.phase));
        }
        let span = self.span.clone();
        let _guard = span.enter();
        warn!(step = self.walker.step_count(), "episode aborted");
        self.relay(EpisodeOutcome::Aborted)
    }

    /// The only path that ends an episode.
    fn relay(&mut self, outcome: EpisodeOutcome) -> Result<EpisodeSummary, EpisodeError> {
        if self.walker.phase() == WalkerPhase::Active {
            self.walker.request_termination();
        }
        // Whatever happens below, this episode cannot be relayed again.
        self.phase = EpisodePhase::Finished;

        let ledger = self.walker.finish()?;
        let walker_reward = ledger.cumulative();
        let terminal_payoff = self.adversary.terminate(ledger)?.unwrap_or(0.0);

        let summary = EpisodeSummary {
            id: self.episode_id.clone().unwrap_or_default(),
            steps: self.walker.step_count(),
            meters: self
                .walker
                .last_whole_meter()
                .saturating_sub(self.start_meter),
            walker_reward,
            adversary_reward: self.adversary.rewards().cumulative(),
            terminal_payoff,
            decisions: self.adversary.decisions(),
            clamp_events: self.adversary.clamp_events(),
            outcome,
        };
        info!(
            outcome = ?summary.outcome,
            steps = summary.steps,
            meters = summary.meters,
            walker_reward = summary.walker_reward,
            adversary_reward = summary.adversary_reward,
            "episode finished"
        );
        self.last_summary = Some(summary.clone());
        Ok(summary)
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == EpisodePhase::Running
    }

    /// Id of the current (or last started) episode.
    pub fn episode_id(&self) -> Option<&str> {
        self.episode_id.as_deref()
    }

    /// Episodes started since construction.
    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    pub fn last_summary(&self) -> Option<&EpisodeSummary> {
        self.last_summary.as_ref()
    }

    /// Read-only view of the course; `None` before the first reset.
    pub fn terrain(&self) -> Option<&HeightField> {
        self.adversary.terrain()
    }

    pub fn walker(&self) -> &WalkerAgent {
        &self.walker
    }

    pub fn adversary(&self) -> &TerrainAdversary {
        &self.adversary
    }

    pub fn config(&self) -> &CourseConfig {
        &self.config
    }
}
