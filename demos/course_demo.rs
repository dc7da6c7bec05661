// Demonstration: drive a toy kinematic walker over an adversarial course.
//
// Build/run from this repo root:
//   cargo run --example course_demo -- --policy pressure --episodes 20 --seed 7

use std::env;

use assault_course::metrics::CourseMetrics;
use assault_course::physics::{BodyKinematics, PhysicsOracle, ScriptedPhysics};
use assault_course::policy::{
    PressureHeuristicPolicy, RandomTerrainPolicy, ScriptedTerrainPolicy, TerrainPolicy,
};
use assault_course::{CourseConfig, EpisodeCoordinator, EpisodeError, EpisodeSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DT: f64 = 0.1;
const START_X: f64 = 5.5;
const TORSO_HEIGHT: f64 = 1.2;

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("pressure");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let config = CourseConfig::default();
    let mut policy: Box<dyn TerrainPolicy> = match policy_name {
        "pressure" => Box::new(PressureHeuristicPolicy::new(&config)),
        "random" => Box::new(RandomTerrainPolicy::new(config.adversary.action_count, seed)),
        "flat" => Box::new(ScriptedTerrainPolicy::new(vec![0])),
        other => {
            eprintln!(
                "Unknown --policy '{}'; expected 'pressure', 'random' or 'flat'.",
                other
            );
            std::process::exit(2);
        }
    };

    let mut coord = match EpisodeCoordinator::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid course: {}", e);
            std::process::exit(1);
        }
    };
    let mut rng = StdRng::seed_from_u64(seed);

    let mut summaries = Vec::with_capacity(episodes);
    for _ in 0..episodes {
        match run_episode(&mut coord, policy.as_mut(), &mut rng) {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                eprintln!("Episode failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    println!("Terrain policy: {}", policy.name());
    println!("{}", CourseMetrics::from_summaries(&summaries));
}

/// Toy walker: walks at a steady pace, slows on climbs, and stumbles onto
/// its torso when the ground ahead changes too sharply.
fn run_episode(
    coord: &mut EpisodeCoordinator,
    policy: &mut dyn TerrainPolicy,
    rng: &mut StdRng,
) -> Result<EpisodeSummary, EpisodeError> {
    let mut physics = ScriptedPhysics::new()
        .with_body("torso", BodyKinematics::at([START_X, TORSO_HEIGHT, 0.0]))
        .with_body("foot", BodyKinematics::at([START_X, 0.0, 0.0]));
    coord.reset(&physics)?;
    sync(coord, &mut physics);

    loop {
        let x = physics.center_of_mass()[0];
        let here = physics.terrain_height(x).unwrap_or(0.0);
        let ahead = physics.terrain_height(x + 0.5).unwrap_or(here);
        let slope = ahead - here;

        let speed = (1.2 - 2.0 * slope.max(0.0) + rng.gen_range(-0.2..0.2)).max(0.1);
        physics.advance_x(speed * DT);
        physics.effort = speed * 0.5;
        if let Some(torso) = physics.body_mut("torso") {
            torso.velocity = [speed, 0.0, 0.0];
            torso.position[1] = here + TORSO_HEIGHT;
        }
        if let Some(foot) = physics.body_mut("foot") {
            foot.position[1] = here;
        }

        coord.on_contact("foot", "terrain");
        if slope.abs() > 0.15 && rng.gen_bool((slope.abs() * 0.5).min(1.0)) {
            coord.on_contact("torso", "terrain");
        }

        let report = coord.step(&physics, policy)?;
        if let Some(summary) = report.summary {
            return Ok(summary);
        }
        if !report.decisions.is_empty() {
            sync(coord, &mut physics);
        }
    }
}

fn sync(coord: &EpisodeCoordinator, physics: &mut ScriptedPhysics) {
    let terrain = &coord.config().terrain;
    if let Some(field) = coord.terrain() {
        physics.sync_terrain(field, terrain.origin_x, terrain.segment_length);
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
