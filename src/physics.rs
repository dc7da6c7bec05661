//! Boundary to the rigid-body simulator.
//!
//! The harness never integrates physics itself. Each simulation step the
//! driver advances its simulator, then lets the coordinator read kinematics
//! through [`PhysicsOracle`]. Queries must be read-only and idempotent.
//! Contact-begin events travel the other way, through
//! [`crate::EpisodeCoordinator::on_contact`].

use crate::terrain::HeightField;

/// Cartesian vector `[x, y, z]`; `x` is the course's forward axis, `y` is up.
pub type Vec3 = [f64; 3];

/// Opaque rigid-body handle issued by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub usize);

/// Kinematic state of one rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyKinematics {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit forward axis of the body.
    pub forward: Vec3,
    /// Unit up axis of the body.
    pub up: Vec3,
}

impl Default for BodyKinematics {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            velocity: [0.0; 3],
            forward: [1.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl BodyKinematics {
    /// Body at rest at `position`, upright and facing down the course.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Read-only view of the simulator.
pub trait PhysicsOracle {
    /// Resolves a scene body by name.
    fn resolve_body(&self, scene_name: &str) -> Option<BodyHandle>;

    /// Kinematics of a previously resolved body.
    fn kinematics(&self, body: BodyHandle) -> BodyKinematics;

    /// Center of mass of the whole walker.
    fn center_of_mass(&self) -> Vec3;

    /// Actuation effort spent during the last step.
    fn effort(&self) -> f64;

    /// Joints currently at their limits (may be fractional).
    fn joints_at_limit(&self) -> f64;

    /// Terrain surface height under world x, if the ray hits anything.
    fn terrain_height(&self, x: f64) -> Option<f64>;
}

/// Simulator stand-in whose state is set directly by the driver.
///
/// Useful for tests, replays and headless demos. Terrain heights are copied
/// from a [`HeightField`] with [`sync_terrain`](Self::sync_terrain), which is
/// how adversary writes become visible to height queries.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPhysics {
    bodies: Vec<(String, BodyKinematics)>,
    center_of_mass: Option<Vec3>,
    pub effort: f64,
    pub joints_at_limit: f64,
    terrain_origin_x: f64,
    segment_length: f64,
    terrain: Vec<f64>,
}

impl ScriptedPhysics {
    pub fn new() -> Self {
        Self {
            segment_length: 1.0,
            ..Self::default()
        }
    }

    /// Adds (or replaces) a named body.
    pub fn with_body(mut self, scene_name: &str, kinematics: BodyKinematics) -> Self {
        self.set_body(scene_name, kinematics);
        self
    }

    pub fn set_body(&mut self, scene_name: &str, kinematics: BodyKinematics) {
        match self.bodies.iter_mut().find(|(n, _)| n == scene_name) {
            Some((_, k)) => *k = kinematics,
            None => self.bodies.push((scene_name.to_string(), kinematics)),
        }
    }

    /// Mutable access to a named body.
    pub fn body_mut(&mut self, scene_name: &str) -> Option<&mut BodyKinematics> {
        self.bodies
            .iter_mut()
            .find(|(n, _)| n == scene_name)
            .map(|(_, k)| k)
    }

    /// Translates every body along the course axis.
    pub fn advance_x(&mut self, dx: f64) {
        for (_, k) in &mut self.bodies {
            k.position[0] += dx;
        }
        if let Some(com) = &mut self.center_of_mass {
            com[0] += dx;
        }
    }

    /// Overrides the center of mass; by default it is the mean body position.
    pub fn set_center_of_mass(&mut self, com: Vec3) {
        self.center_of_mass = Some(com);
    }

    /// Copies the field's world heights into the height-query table.
    pub fn sync_terrain(&mut self, field: &HeightField, origin_x: f64, segment_length: f64) {
        self.terrain_origin_x = origin_x + field.origin_index() as f64 * segment_length;
        self.segment_length = segment_length;
        self.terrain = field
            .samples()
            .iter()
            .map(|raw| raw * field.scale_y())
            .collect();
    }
}

impl PhysicsOracle for ScriptedPhysics {
    fn resolve_body(&self, scene_name: &str) -> Option<BodyHandle> {
        self.bodies
            .iter()
            .position(|(n, _)| n == scene_name)
            .map(BodyHandle)
    }

    fn kinematics(&self, body: BodyHandle) -> BodyKinematics {
        self.bodies
            .get(body.0)
            .map(|(_, k)| *k)
            .unwrap_or_default()
    }

    fn center_of_mass(&self) -> Vec3 {
        if let Some(com) = self.center_of_mass {
            return com;
        }
        if self.bodies.is_empty() {
            return [0.0; 3];
        }
        let n = self.bodies.len() as f64;
        let mut sum = [0.0; 3];
        for (_, k) in &self.bodies {
            for (s, p) in sum.iter_mut().zip(k.position) {
                *s += p;
            }
        }
        sum.map(|s| s / n)
    }

    fn effort(&self) -> f64 {
        self.effort
    }

    fn joints_at_limit(&self) -> f64 {
        self.joints_at_limit
    }

    fn terrain_height(&self, x: f64) -> Option<f64> {
        let cell = ((x - self.terrain_origin_x) / self.segment_length).floor();
        if cell < 0.0 {
            return None;
        }
        self.terrain.get(cell as usize).copied()
    }
}
