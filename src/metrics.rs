//! Aggregated episode metrics.
//!
//! Summarizes a batch of [`EpisodeSummary`] values, e.g. one evaluation run
//! of a walker policy against a fixed terrain policy.

use std::fmt;

use crate::episode::{EpisodeOutcome, EpisodeSummary};

/// Aggregated metrics over multiple episodes.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseMetrics {
    /// Mean whole meters gained per episode.
    pub mean_meters: f64,
    /// Furthest any walker got.
    pub max_meters: i64,
    /// Mean walker ticks per episode.
    pub mean_steps: f64,
    /// Mean walker cumulative reward per episode.
    pub mean_walker_reward: f64,
    /// Mean adversary cumulative reward per episode.
    pub mean_adversary_reward: f64,
    /// Mean terrain decisions per episode.
    pub mean_decisions: f64,
    /// Share of decisions that hit the floor or ceiling, in percent.
    pub pct_clamped: f64,
    /// Episodes ended by the walker's termination function, in percent.
    pub pct_fell: f64,
    pub truncated: usize,
    pub course_exhausted: usize,
    pub aborted: usize,
    /// Number of episodes aggregated.
    pub n_episodes: usize,
}

impl CourseMetrics {
    /// Aggregates `summaries`. An empty slice gives all-zero metrics.
    pub fn from_summaries(summaries: &[EpisodeSummary]) -> Self {
        let n_episodes = summaries.len();
        if n_episodes == 0 {
            return Self::empty();
        }
        let n = n_episodes as f64;
        let mean = |f: fn(&EpisodeSummary) -> f64| summaries.iter().map(f).sum::<f64>() / n;
        let count = |o: EpisodeOutcome| summaries.iter().filter(|s| s.outcome == o).count();

        let decisions: u32 = summaries.iter().map(|s| s.decisions).sum();
        let clamps: u32 = summaries.iter().map(|s| s.clamp_events).sum();
        let pct_clamped = if decisions > 0 {
            f64::from(clamps) / f64::from(decisions) * 100.0
        } else {
            0.0
        };

        Self {
            mean_meters: mean(|s| s.meters as f64),
            max_meters: summaries.iter().map(|s| s.meters).max().unwrap_or(0),
            mean_steps: mean(|s| f64::from(s.steps)),
            mean_walker_reward: mean(|s| s.walker_reward),
            mean_adversary_reward: mean(|s| s.adversary_reward),
            mean_decisions: f64::from(decisions) / n,
            pct_clamped,
            pct_fell: count(EpisodeOutcome::Fell) as f64 / n * 100.0,
            truncated: count(EpisodeOutcome::Truncated),
            course_exhausted: count(EpisodeOutcome::CourseExhausted),
            aborted: count(EpisodeOutcome::Aborted),
            n_episodes,
        }
    }

    fn empty() -> Self {
        Self {
            mean_meters: 0.0,
            max_meters: 0,
            mean_steps: 0.0,
            mean_walker_reward: 0.0,
            mean_adversary_reward: 0.0,
            mean_decisions: 0.0,
            pct_clamped: 0.0,
            pct_fell: 0.0,
            truncated: 0,
            course_exhausted: 0,
            aborted: 0,
            n_episodes: 0,
        }
    }
}

impl fmt::Display for CourseMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Course Metrics ({} episodes) ===", self.n_episodes)?;
        writeln!(
            f,
            "  Mean meters:             {:.1} (max {})",
            self.mean_meters, self.max_meters
        )?;
        writeln!(f, "  Mean steps:              {:.1}", self.mean_steps)?;
        writeln!(
            f,
            "  Mean walker reward:      {:.2}",
            self.mean_walker_reward
        )?;
        writeln!(
            f,
            "  Mean adversary reward:   {:.2}",
            self.mean_adversary_reward
        )?;
        writeln!(
            f,
            "  Mean decisions:          {:.1} ({:.1}% clamped)",
            self.mean_decisions, self.pct_clamped
        )?;
        write!(
            f,
            "  Outcomes:                {:.1}% fell, {} truncated, {} exhausted, {} aborted",
            self.pct_fell, self.truncated, self.course_exhausted, self.aborted
        )
    }
}
