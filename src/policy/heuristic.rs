//! Pressure heuristic baseline.
//!
//! Reads the adversary observation and pushes harder when the walker is
//! coping, eases off when it struggles. Serves as a stronger baseline than
//! the random policy when evaluating walker policies.

use super::trait_::TerrainPolicy;
use crate::config::CourseConfig;

/// Raises the terrain after quick meters, lowers it after slow ones.
///
/// ```text
/// steps <= fast_steps  -> largest raise that stays under the ceiling
/// steps >= slow_steps  -> one-tier lower, if it stays above the floor
/// otherwise            -> hold
/// ```
///
/// Never picks an action that would clamp, so it never pays the clamp
/// penalty.
#[derive(Debug, Clone)]
pub struct PressureHeuristicPolicy {
    action_count: usize,
    unit_step: f64,
    min_height: f64,
    max_height: f64,
    /// A meter crossed in at most this many ticks counts as easy.
    pub fast_steps: f64,
    /// A meter taking at least this many ticks counts as a struggle.
    pub slow_steps: f64,
}

impl PressureHeuristicPolicy {
    pub fn new(config: &CourseConfig) -> Self {
        Self {
            action_count: config.adversary.action_count,
            unit_step: config.adversary.unit_step,
            min_height: config.terrain.min_height,
            max_height: config.terrain.max_height,
            fast_steps: 20.0,
            slow_steps: 60.0,
        }
    }

    /// Overrides the easy/struggle thresholds.
    pub fn with_thresholds(mut self, fast_steps: f64, slow_steps: f64) -> Self {
        self.fast_steps = fast_steps;
        self.slow_steps = slow_steps;
        self
    }

    fn max_raise_tier(&self) -> usize {
        self.action_count / 2
    }

    fn max_lower_tier(&self) -> usize {
        self.action_count.saturating_sub(1) / 2
    }
}

impl TerrainPolicy for PressureHeuristicPolicy {
    fn select_action(&mut self, observation: &[f64]) -> usize {
        let (steps, height) = match observation {
            [steps, height, ..] => (*steps, *height),
            _ => return 0,
        };
        let eps = 1e-9;

        if steps <= self.fast_steps {
            for tier in (1..=self.max_raise_tier()).rev() {
                if height + tier as f64 * self.unit_step <= self.max_height + eps {
                    return 2 * tier - 1;
                }
            }
            return 0;
        }
        if steps >= self.slow_steps
            && self.max_lower_tier() >= 1
            && height - self.unit_step >= self.min_height - eps
        {
            return 2;
        }
        0
    }

    fn name(&self) -> &str {
        "pressure_heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PressureHeuristicPolicy {
        PressureHeuristicPolicy::new(&CourseConfig::default())
    }

    #[test]
    fn quick_meter_raises_hardest() {
        let mut p = policy();
        assert_eq!(p.select_action(&[5.0, 5.0, 0.0]), 5);
    }

    #[test]
    fn raise_backs_off_near_ceiling() {
        let mut p = policy();
        // 9.85 + 0.2 would clamp, 9.85 + 0.1 fits
        assert_eq!(p.select_action(&[5.0, 9.85, 0.0]), 1);
        assert_eq!(p.select_action(&[5.0, 10.0, 0.0]), 0);
    }

    #[test]
    fn struggle_lowers_one_tier() {
        let mut p = policy();
        assert_eq!(p.select_action(&[80.0, 5.0, 0.0]), 2);
    }

    #[test]
    fn never_lowers_through_floor() {
        let mut p = policy();
        assert_eq!(p.select_action(&[80.0, 0.05, 0.0]), 0);
    }

    #[test]
    fn middling_pace_holds() {
        let mut p = policy();
        assert_eq!(p.select_action(&[40.0, 5.0, 0.0]), 0);
    }

    #[test]
    fn malformed_observation_holds() {
        let mut p = policy();
        assert_eq!(p.select_action(&[1.0]), 0);
    }

    #[test]
    fn chosen_actions_stay_in_range() {
        let cfg = CourseConfig::default();
        let mut p = PressureHeuristicPolicy::new(&cfg).with_thresholds(10.0, 30.0);
        for steps in [0.0, 10.0, 20.0, 30.0, 90.0] {
            for h in [0.0, 2.5, 5.0, 9.9, 10.0] {
                assert!(p.select_action(&[steps, h, 0.0]) < cfg.adversary.action_count);
            }
        }
    }
}
