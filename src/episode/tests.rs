//! Episode-level scenarios driving both agents through the coordinator.

use super::*;
use crate::adversary::AdversaryPhase;
use crate::config::CourseConfig;
use crate::physics::{BodyKinematics, PhysicsOracle, ScriptedPhysics};
use crate::policy::ScriptedTerrainPolicy;
use crate::strategy::{AdversaryContext, AdversaryStrategy, StrategySet, WalkerContext};
use crate::walker::{ContactKind, WalkerPhase};

/// Hopper-shaped body: torso above the foot, both at `x`.
fn hopper_at(x: f64) -> ScriptedPhysics {
    ScriptedPhysics::new()
        .with_body("torso", BodyKinematics::at([x, 1.2, 0.0]))
        .with_body("foot", BodyKinematics::at([x, 0.0, 0.0]))
}

fn move_to(physics: &mut ScriptedPhysics, x: f64) {
    for name in ["torso", "foot"] {
        if let Some(body) = physics.body_mut(name) {
            body.position[0] = x;
        }
    }
}

/// Course whose window can start next to the height-map origin.
fn course() -> CourseConfig {
    let mut config = CourseConfig::default();
    config.terrain.origin_x = -10.0;
    config
}

fn hold() -> ScriptedTerrainPolicy {
    ScriptedTerrainPolicy::new(vec![0])
}

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = course();
        config.adversary.action_count = 0;
        assert!(matches!(
            EpisodeCoordinator::new(config),
            Err(EpisodeError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = hopper_at(5.0);
        assert_eq!(
            coord.step(&p, &mut hold()),
            Err(EpisodeError::NotRunning(EpisodePhase::Idle))
        );
        assert!(coord.terrain().is_none());
    }

    #[test]
    fn test_reset_starts_both_agents() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = hopper_at(5.0);
        coord.reset(&p).unwrap();
        assert!(coord.is_running());
        assert_eq!(coord.walker().phase(), WalkerPhase::Active);
        assert_eq!(coord.adversary().phase(), AdversaryPhase::Active);
        assert_eq!(coord.adversary().height_index(), 4);
        assert!(coord.episode_id().is_some());
        assert_eq!(coord.episodes(), 1);
    }

    #[test]
    fn test_missing_body_part_fails_reset() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = ScriptedPhysics::new().with_body("foot", BodyKinematics::default());
        assert!(matches!(coord.reset(&p), Err(EpisodeError::Walker(_))));
        assert!(!coord.is_running());
    }

    #[test]
    fn test_window_outside_heightmap_fails_reset() {
        let mut coord = EpisodeCoordinator::new(CourseConfig::default()).unwrap();
        let p = hopper_at(0.2);
        assert!(matches!(coord.reset(&p), Err(EpisodeError::Adversary(_))));
        assert!(!coord.is_running());
    }

    #[test]
    fn test_contacts_are_forwarded() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = hopper_at(5.0);
        assert_eq!(coord.on_contact("torso", "terrain"), ContactKind::Ignored);
        coord.reset(&p).unwrap();
        assert_eq!(coord.on_contact("foot", "terrain"), ContactKind::Foot);
        assert_eq!(coord.on_contact("torso", "terrain"), ContactKind::NonFoot);
        assert_eq!(coord.walker().pain(), 5.0);
    }

    #[test]
    fn test_custom_walker_strategies_only_between_episodes() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let set: StrategySet<WalkerContext> = StrategySet::new(
            "stand_still",
            |_: &WalkerContext| vec![0.0],
            |_: &WalkerContext| 1.0,
            |c: &WalkerContext| c.step_count >= 2,
        );
        coord.bind_walker_strategies(set).unwrap();

        let p = hopper_at(5.0);
        coord.reset(&p).unwrap();
        let again: StrategySet<WalkerContext> = StrategySet::new(
            "again",
            |_: &WalkerContext| Vec::new(),
            |_: &WalkerContext| 0.0,
            |_: &WalkerContext| false,
        );
        assert!(matches!(
            coord.bind_walker_strategies(again),
            Err(EpisodeError::Walker(_))
        ));

        assert!(!coord.step(&p, &mut hold()).unwrap().is_done());
        let report = coord.step(&p, &mut hold()).unwrap();
        let summary = report.summary.unwrap();
        assert_eq!(summary.outcome, EpisodeOutcome::Fell);
        assert_eq!(summary.walker_reward, 2.0);
    }

    #[test]
    fn test_custom_adversary_reward_is_folded_at_each_meter() {
        let mut config = course();
        config.max_episode_steps = 0;
        let mut coord = EpisodeCoordinator::new(config).unwrap();
        let set: StrategySet<AdversaryContext> = StrategySet::new(
            "slow_walker_bonus",
            |c: &AdversaryContext| vec![f64::from(c.steps_since_last_meter)],
            |c: &AdversaryContext| f64::from(c.steps_since_last_meter) * 0.5,
            |c: &AdversaryContext| c.course_exhausted(),
        );
        coord.bind_adversary_strategies(set).unwrap();

        let mut p = hopper_at(5.5);
        coord.reset(&p).unwrap();
        assert_eq!(coord.adversary().strategy_name(), "slow_walker_bonus");
        let again = AdversaryStrategy::ActionOnly.build(&coord.config().adversary);
        assert_eq!(
            coord.bind_adversary_strategies(again),
            Err(EpisodeError::Adversary(crate::AdversaryError::StrategyRebind))
        );

        // four ticks to reach meter 6, then two more to reach meter 7
        for x in [5.6, 5.7, 5.8, 6.1, 6.5, 7.2] {
            move_to(&mut p, x);
            coord.step(&p, &mut hold()).unwrap();
        }
        assert_eq!(coord.adversary().decisions(), 2);
        assert!((coord.adversary().rewards().cumulative() - 3.0).abs() < 1e-9);

        let summary = coord.abort().unwrap();
        let expected = 3.0 + summary.terminal_payoff;
        assert!((summary.adversary_reward - expected).abs() < 1e-9);
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn test_three_meters_three_decisions() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let mut p = hopper_at(0.5);
        coord.reset(&p).unwrap();
        let start_index = coord.adversary().height_index();
        let mut policy = ScriptedTerrainPolicy::new(vec![1]);

        let path = [0.8, 1.1, 1.4, 1.7, 2.05, 2.3, 2.6, 2.9, 3.2, 3.5];
        let mut meters = Vec::new();
        let mut writes = 0;
        for x in path {
            move_to(&mut p, x);
            let report = coord.step(&p, &mut policy).unwrap();
            assert!(!report.is_done());
            assert_eq!(report.decisions.len(), report.meters_crossed.len());
            writes += report.decisions.len();
            meters.extend(report.meters_crossed);
        }

        assert_eq!(meters, vec![1, 2, 3]);
        assert_eq!(writes, 3);
        assert_eq!(policy.calls(), 3);
        assert_eq!(coord.adversary().height_index(), start_index + 3);
        assert_eq!(coord.walker().step_count(), 10);
    }

    #[test]
    fn test_decision_lands_before_next_tick() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let mut p = hopper_at(5.5);
        coord.reset(&p).unwrap();

        move_to(&mut p, 6.1);
        let report = coord.step(&p, &mut ScriptedTerrainPolicy::new(vec![3])).unwrap();
        let decision = report.decisions[0];
        assert!((decision.written_height - 5.2).abs() < 1e-9);

        let field = coord.terrain().unwrap();
        assert!((field.read(decision.segment).unwrap() - 5.2).abs() < 1e-9);
        p.sync_terrain(field, coord.config().terrain.origin_x, coord.config().terrain.segment_length);
        let x = coord.config().terrain.origin_x + (field.origin_index() + decision.segment) as f64;
        assert!((p.terrain_height(x + 0.5).unwrap() - 5.2).abs() < 1e-9);
    }

    #[test]
    fn test_raise_past_ceiling_clamps_and_penalizes() {
        let mut config = course();
        config.adversary.unit_step = 2.0;
        config.adversary.strategy = AdversaryStrategy::TerminalOnly;
        let mut coord = EpisodeCoordinator::new(config).unwrap();
        let mut p = hopper_at(5.5);
        coord.reset(&p).unwrap();

        move_to(&mut p, 6.2);
        let report = coord.step(&p, &mut ScriptedTerrainPolicy::new(vec![5])).unwrap();
        let decision = report.decisions[0];
        assert!(decision.was_clamped);
        assert_eq!(decision.written_height, 10.0);
        assert_eq!(coord.adversary().current_height(), 10.0);
        assert_eq!(coord.adversary().last_action_reward(), 0.0);
        assert_eq!(coord.adversary().rewards().cumulative(), -1.0);
        assert_eq!(coord.adversary().clamp_events(), 1);
    }

    #[test]
    fn test_near_fall_ends_episode_through_relay() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = hopper_at(1.5);
        coord.reset(&p).unwrap();

        assert_eq!(coord.on_contact("torso", "terrain"), ContactKind::NonFoot);
        assert_eq!(coord.walker().pain(), 5.0);
        assert!(coord.walker().recovery_mode());

        let report = coord.step(&p, &mut hold()).unwrap();
        let summary = report.summary.expect("episode should end");
        assert_eq!(summary.outcome, EpisodeOutcome::Fell);
        assert_eq!(coord.walker().phase(), WalkerPhase::Done);
        assert_eq!(coord.adversary().phase(), AdversaryPhase::Done);
        assert!(coord.walker().rewards().is_drained());

        let expected = 1000.0 - summary.walker_reward.clamp(0.0, 1000.0);
        assert_eq!(summary.walker_reward, -5.0);
        assert_eq!(summary.terminal_payoff, expected);
        assert_eq!(coord.adversary().rewards().cumulative(), expected);
        assert_eq!(coord.phase(), EpisodePhase::Finished);
    }

    #[test]
    fn test_single_hit_below_far_threshold_ends_episode() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = hopper_at(5.0);
        coord.reset(&p).unwrap();
        assert!(!coord.step(&p, &mut hold()).unwrap().is_done());

        coord.on_contact("torso", "terrain");
        assert_eq!(
            coord.step(&p, &mut hold()).unwrap().summary.map(|s| s.outcome),
            Some(EpisodeOutcome::Fell)
        );
    }

    #[test]
    fn test_single_hit_past_far_threshold_is_survivable() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = hopper_at(150.5);
        coord.reset(&p).unwrap();
        coord.on_contact("torso", "terrain");
        let report = coord.step(&p, &mut hold()).unwrap();
        assert!(!report.is_done());
        assert!(coord.walker().recovery_mode());
    }
}

#[cfg(test)]
mod termination {
    use super::*;

    #[test]
    fn test_step_budget_truncates() {
        let mut config = course();
        config.max_episode_steps = 3;
        let mut coord = EpisodeCoordinator::new(config).unwrap();
        let p = hopper_at(5.0);
        coord.reset(&p).unwrap();

        assert!(!coord.step(&p, &mut hold()).unwrap().is_done());
        assert!(!coord.step(&p, &mut hold()).unwrap().is_done());
        let summary = coord.step(&p, &mut hold()).unwrap().summary.unwrap();
        assert_eq!(summary.outcome, EpisodeOutcome::Truncated);
        assert_eq!(summary.steps, 3);
        assert_eq!(coord.walker().phase(), WalkerPhase::Done);
        assert_eq!(coord.adversary().phase(), AdversaryPhase::Done);
    }

    #[test]
    fn test_exhausted_course_ends_episode() {
        let mut config = course();
        config.terrain.course_length = 6;
        let mut coord = EpisodeCoordinator::new(config).unwrap();
        let mut p = hopper_at(5.5);
        coord.reset(&p).unwrap();

        let mut last = None;
        for x in [6.5, 7.5, 8.5] {
            move_to(&mut p, x);
            last = Some(coord.step(&p, &mut hold()).unwrap());
        }
        let report = last.unwrap();
        assert_eq!(report.decisions.len(), 0);
        let summary = report.summary.unwrap();
        assert_eq!(summary.outcome, EpisodeOutcome::CourseExhausted);
        assert_eq!(summary.decisions, 2);
        assert_eq!(summary.meters, 3);
    }

    #[test]
    fn test_huge_jump_exhausts_course_without_panicking() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let mut p = hopper_at(5.5);
        coord.reset(&p).unwrap();
        let writable = coord.config().terrain.course_length - coord.adversary().height_index();

        move_to(&mut p, 1e300);
        let report = coord.step(&p, &mut hold()).unwrap();
        assert_eq!(report.decisions.len(), writable);
        assert_eq!(report.meters_crossed.len(), writable + 1);
        let summary = report.summary.unwrap();
        assert_eq!(summary.outcome, EpisodeOutcome::CourseExhausted);
        assert_eq!(summary.meters, i64::MAX - 5);
        assert_eq!(coord.adversary().phase(), AdversaryPhase::Done);
    }

    #[test]
    fn test_non_finite_position_aborts_episode() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let mut p = hopper_at(5.5);
        coord.reset(&p).unwrap();

        move_to(&mut p, f64::NAN);
        assert_eq!(
            coord.step(&p, &mut hold()),
            Err(EpisodeError::Walker(crate::WalkerError::NonFinitePosition(
                "foot".into()
            )))
        );
        assert_eq!(coord.phase(), EpisodePhase::Finished);
        assert_eq!(
            coord.last_summary().map(|s| s.outcome),
            Some(EpisodeOutcome::Aborted)
        );
    }

    #[test]
    fn test_abort_relays_once() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = hopper_at(5.0);
        coord.reset(&p).unwrap();
        coord.step(&p, &mut hold()).unwrap();

        let summary = coord.abort().unwrap();
        assert_eq!(summary.outcome, EpisodeOutcome::Aborted);
        assert_eq!(coord.adversary().phase(), AdversaryPhase::Done);
        let adversary_total = coord.adversary().rewards().cumulative();

        assert_eq!(
            coord.abort(),
            Err(EpisodeError::NotRunning(EpisodePhase::Finished))
        );
        assert_eq!(
            coord.step(&p, &mut hold()),
            Err(EpisodeError::NotRunning(EpisodePhase::Finished))
        );
        assert_eq!(coord.adversary().rewards().cumulative(), adversary_total);
        assert_eq!(coord.last_summary(), Some(&summary));
    }

    #[test]
    fn test_invalid_action_aborts_episode() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let mut p = hopper_at(5.5);
        coord.reset(&p).unwrap();

        move_to(&mut p, 6.5);
        let err = coord
            .step(&p, &mut ScriptedTerrainPolicy::new(vec![99]))
            .unwrap_err();
        assert_eq!(
            err,
            EpisodeError::Adversary(crate::AdversaryError::InvalidAction {
                action: 99,
                action_count: 7
            })
        );
        assert_eq!(coord.phase(), EpisodePhase::Finished);
        assert_eq!(coord.walker().phase(), WalkerPhase::Done);
        assert_eq!(coord.adversary().phase(), AdversaryPhase::Done);
        assert_eq!(
            coord.last_summary().map(|s| s.outcome),
            Some(EpisodeOutcome::Aborted)
        );
    }

    #[test]
    fn test_reset_while_running_aborts_previous_episode() {
        let mut coord = EpisodeCoordinator::new(course()).unwrap();
        let p = hopper_at(5.0);
        coord.reset(&p).unwrap();
        let first_id = coord.episode_id().map(str::to_string);
        coord.step(&p, &mut hold()).unwrap();

        coord.reset(&p).unwrap();
        let previous = coord.last_summary().unwrap();
        assert_eq!(previous.outcome, EpisodeOutcome::Aborted);
        assert_eq!(Some(previous.id.clone()), first_id);
        assert_ne!(coord.episode_id().map(str::to_string), first_id);
        assert_eq!(coord.walker().step_count(), 0);
        assert_eq!(coord.adversary().phase(), AdversaryPhase::Active);
        assert_eq!(coord.episodes(), 2);
    }

    #[test]
    fn test_consecutive_episodes_start_clean() {
        let mut config = course();
        config.max_episode_steps = 1;
        let mut coord = EpisodeCoordinator::new(config).unwrap();
        let p = hopper_at(5.0);
        for _ in 0..3 {
            coord.reset(&p).unwrap();
            let summary = coord.step(&p, &mut hold()).unwrap().summary.unwrap();
            assert_eq!(summary.outcome, EpisodeOutcome::Truncated);
            assert_eq!(summary.decisions, 0);
            assert!(!coord.adversary().awaiting_decision());
        }
    }
}
