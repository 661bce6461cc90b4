//! The simulation world and its command surface
//!
//! `World` owns every body, the active force laws and the magnets. It only
//! changes inside [`tick`](super::tick::tick) or through a [`Command`], and
//! commands never run mid-tick: either call a command method directly between
//! steps, or [`submit`](World::submit) it to run at the start of the next step.

use std::collections::VecDeque;

use glam::DVec2;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId};
use super::error::{CommandError, ConfigError};
use super::force::{Accumulators, ForceLaw, ForceLawKind, Magnet};
use super::integrator::project_tethers;
use super::snapshot::Snapshot;
use super::tick::tick;
use crate::consts::{MAX_FRAME_TIME, MAX_SUBSTEPS};
use crate::scenario::Scenario;

/// A force law and whether it currently runs
#[derive(Debug, Clone, PartialEq)]
pub struct LawSlot {
    pub law: ForceLaw,
    pub active: bool,
}

/// A discrete user intent, applied between ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Reset,
    Spawn { body: Body },
    Clear,
    SetActiveForceLaws { kinds: Vec<ForceLawKind> },
    ToggleForceLaw { kind: ForceLawKind },
    ApplyImpulse { body: BodyId, impulse: DVec2 },
    SetWind { strength: f64 },
    Pause,
    Resume,
    ToggleMagnet { index: usize },
    FlipMagnets,
}

/// Outcome of an accepted command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Applied,
    Spawned(BodyId),
    /// New on/off state of a toggled law or magnet
    Toggled(bool),
}

/// Authoritative simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) scenario: Scenario,
    /// Validated bodies with ids assigned, restored on reset
    initial_bodies: Vec<Body>,
    pub(crate) bodies: Vec<Body>,
    pub(crate) laws: Vec<LawSlot>,
    pub(crate) magnets: Vec<Magnet>,
    pub(crate) acc: Accumulators,
    pub(crate) dt: f64,
    pub(crate) elapsed: f64,
    pub(crate) tick_count: u64,
    paused: bool,
    next_id: u32,
    queue: VecDeque<Command>,
    pub(crate) snapshot: Snapshot,
}

impl World {
    /// Validate `scenario`, expand its generators and publish the initial snapshot
    pub fn new(scenario: Scenario) -> Result<Self, ConfigError> {
        scenario.validate()?;

        let mut initial_bodies = scenario.build_bodies();
        for (i, body) in initial_bodies.iter_mut().enumerate() {
            body.validate(i)?;
            body.id = BodyId(i as u32 + 1);
        }
        project_tethers(&mut initial_bodies);

        let mut world = Self {
            dt: scenario.dt,
            scenario,
            initial_bodies,
            bodies: Vec::new(),
            laws: Vec::new(),
            magnets: Vec::new(),
            acc: Accumulators::default(),
            elapsed: 0.0,
            tick_count: 0,
            paused: false,
            next_id: 1,
            queue: VecDeque::new(),
            snapshot: Snapshot::capture(&[], 0, 0.0, None),
        };
        world.reset();

        info!(
            "World '{}' created: {} bodies, {} force laws, dt={}",
            world.scenario.name,
            world.bodies.len(),
            world.laws.len(),
            world.dt
        );
        Ok(world)
    }

    /// Restore the scenario's initial state; ids restart at 1
    ///
    /// Two resets in a row publish identical snapshots.
    pub fn reset(&mut self) {
        self.bodies = self.initial_bodies.clone();
        self.next_id = self.bodies.len() as u32 + 1;
        self.laws = self
            .scenario
            .laws
            .iter()
            .map(|law| LawSlot {
                law: law.clone(),
                active: true,
            })
            .collect();
        self.magnets = self.scenario.magnets.clone();
        self.elapsed = 0.0;
        self.tick_count = 0;
        self.publish();
        info!("World '{}' reset ({} bodies)", self.scenario.name, self.bodies.len());
    }

    /// Add a body; returns its new id
    pub fn spawn(&mut self, mut body: Body) -> Result<BodyId, CommandError> {
        body.validate(self.bodies.len()).map_err(CommandError::InvalidBody)?;
        let id = BodyId(self.next_id);
        self.next_id += 1;
        body.id = id;
        self.bodies.push(body);
        project_tethers(&mut self.bodies);
        self.publish();
        debug!("Spawned body {}", id);
        Ok(id)
    }

    /// Remove every body
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.publish();
        debug!("Cleared all bodies");
    }

    /// Activate exactly the laws whose kind is listed
    pub fn set_active_force_laws(&mut self, kinds: &[ForceLawKind]) -> Result<(), CommandError> {
        if let Some(&missing) = kinds.iter().find(|k| !self.laws.iter().any(|s| s.law.kind() == **k)) {
            return Err(CommandError::UnknownForceLaw(missing));
        }
        for slot in &mut self.laws {
            slot.active = kinds.contains(&slot.law.kind());
        }
        debug!("Active force laws: {:?}", kinds);
        Ok(())
    }

    /// Flip every law of `kind` on or off; returns the new state
    pub fn toggle_force_law(&mut self, kind: ForceLawKind) -> Result<bool, CommandError> {
        let active = self
            .laws
            .iter()
            .find(|s| s.law.kind() == kind)
            .map(|s| !s.active)
            .ok_or(CommandError::UnknownForceLaw(kind))?;
        for slot in self.laws.iter_mut().filter(|s| s.law.kind() == kind) {
            slot.active = active;
        }
        debug!("Force law {} {}", kind, if active { "on" } else { "off" });
        Ok(active)
    }

    /// Instant velocity change `impulse / mass`
    ///
    /// A tethered bob only keeps the part of the impulse along its swing
    /// direction. Pinned bodies ignore impulses.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: DVec2) -> Result<(), CommandError> {
        if !impulse.is_finite() {
            return Err(CommandError::NonFiniteImpulse);
        }
        let body = self
            .bodies
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(CommandError::UnknownBody(id))?;
        if body.pinned {
            return Ok(());
        }
        match (body.tether, body.angular.as_mut()) {
            (Some(tether), Some(angular)) => {
                let (sin, cos) = angular.angle.sin_cos();
                let tangent = DVec2::new(cos, -sin);
                angular.angular_vel += impulse.dot(tangent) / (body.mass * tether.length);
            }
            _ => body.vel += impulse / body.mass,
        }
        project_tethers(&mut self.bodies);
        debug!("Impulse {:?} applied to body {}", impulse, id);
        Ok(())
    }

    /// Set the strength of every wind law
    pub fn set_wind(&mut self, strength: f64) -> Result<(), CommandError> {
        if !strength.is_finite() {
            return Err(CommandError::NonFiniteWind);
        }
        let mut found = false;
        for slot in &mut self.laws {
            found |= slot.law.set_wind_strength(strength);
        }
        if !found {
            return Err(CommandError::UnknownForceLaw(ForceLawKind::Wind));
        }
        debug!("Wind strength set to {}", strength);
        Ok(())
    }

    /// Stop issuing ticks; the last snapshot stays valid
    pub fn pause(&mut self) {
        self.paused = true;
        debug!("Paused at tick {}", self.tick_count);
    }

    pub fn resume(&mut self) {
        self.paused = false;
        debug!("Resumed at tick {}", self.tick_count);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Enable or disable one magnet; returns the new state
    pub fn toggle_magnet(&mut self, index: usize) -> Result<bool, CommandError> {
        let magnet = self.magnets.get_mut(index).ok_or(CommandError::UnknownMagnet(index))?;
        magnet.enabled = !magnet.enabled;
        debug!("Magnet {} {}", index, if magnet.enabled { "on" } else { "off" });
        Ok(magnet.enabled)
    }

    /// Swap the poles of every magnet
    pub fn flip_magnets(&mut self) {
        for magnet in &mut self.magnets {
            magnet.flip();
        }
        debug!("Flipped {} magnets", self.magnets.len());
    }

    /// Run one command now
    pub fn execute(&mut self, command: Command) -> Result<CommandStatus, CommandError> {
        match command {
            Command::Reset => {
                self.reset();
                Ok(CommandStatus::Applied)
            }
            Command::Spawn { body } => self.spawn(body).map(CommandStatus::Spawned),
            Command::Clear => {
                self.clear();
                Ok(CommandStatus::Applied)
            }
            Command::SetActiveForceLaws { kinds } => {
                self.set_active_force_laws(&kinds).map(|()| CommandStatus::Applied)
            }
            Command::ToggleForceLaw { kind } => self.toggle_force_law(kind).map(CommandStatus::Toggled),
            Command::ApplyImpulse { body, impulse } => {
                self.apply_impulse(body, impulse).map(|()| CommandStatus::Applied)
            }
            Command::SetWind { strength } => self.set_wind(strength).map(|()| CommandStatus::Applied),
            Command::Pause => {
                self.pause();
                Ok(CommandStatus::Applied)
            }
            Command::Resume => {
                self.resume();
                Ok(CommandStatus::Applied)
            }
            Command::ToggleMagnet { index } => self.toggle_magnet(index).map(CommandStatus::Toggled),
            Command::FlipMagnets => {
                self.flip_magnets();
                Ok(CommandStatus::Applied)
            }
        }
    }

    /// Queue a command for the start of the next step
    pub fn submit(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Apply queued commands, then advance one tick unless paused
    pub fn step(&mut self) -> &Snapshot {
        while let Some(command) = self.queue.pop_front() {
            if let Err(e) = self.execute(command) {
                warn!("Command rejected: {}", e);
            }
        }
        if !self.paused {
            tick(self);
            trace!(
                "tick {} t={:.4} ke={:.4}",
                self.tick_count, self.elapsed, self.snapshot.telemetry.kinetic_energy
            );
        }
        &self.snapshot
    }

    /// Step `ticks` times
    pub fn run(&mut self, ticks: u64) -> &Snapshot {
        for _ in 0..ticks {
            self.step();
        }
        &self.snapshot
    }

    pub(crate) fn publish(&mut self) {
        self.snapshot = Snapshot::capture(&self.bodies, self.tick_count, self.elapsed, self.scenario.stability_base);
    }

    /// State as of the last tick or command
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn force_laws(&self) -> &[LawSlot] {
        &self.laws
    }

    pub fn magnets(&self) -> &[Magnet] {
        &self.magnets
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// Turns variable frame times into fixed ticks
#[derive(Debug, Clone, Default)]
pub struct Stepper {
    accumulator: f64,
}

impl Stepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `frame_time` seconds and step the world as many whole
    /// timesteps as fit, up to `MAX_SUBSTEPS`. Returns the number of steps.
    ///
    /// Whole timesteps left over once the cap is reached are dropped, so a
    /// slow frame never builds a backlog for later frames to work off.
    pub fn advance(&mut self, world: &mut World, frame_time: f64) -> u32 {
        if frame_time.is_finite() {
            self.accumulator += frame_time.clamp(0.0, MAX_FRAME_TIME);
        }

        let dt = world.dt();
        let mut substeps = 0;
        while self.accumulator >= dt && substeps < MAX_SUBSTEPS {
            world.step();
            self.accumulator -= dt;
            substeps += 1;
        }
        if self.accumulator >= dt {
            trace!("Dropping {:.4}s of simulation backlog", self.accumulator - self.accumulator % dt);
            self.accumulator %= dt;
        }
        substeps
    }

    /// Time accumulated but not yet simulated, always less than one timestep
    pub fn pending(&self) -> f64 {
        self.accumulator
    }

    /// Drop any leftover time, e.g. after a reset
    pub fn clear(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioKind;
    use crate::sim::body::{Angular, Pivot, Tether};
    use crate::sim::collision::{Boundary, CollisionConfig, CollisionPolicy};
    use crate::sim::force::BodyFilter;

    fn empty_world() -> World {
        World::new(Scenario::empty("test")).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_scenario() {
        let mut scenario = Scenario::empty("bad");
        scenario.bodies.push(Body::new(DVec2::ZERO, -1.0, 1.0));
        assert!(matches!(World::new(scenario), Err(ConfigError::InvalidMass { .. })));
    }

    #[test]
    fn test_ids_start_at_one_and_restart_on_reset() {
        let mut world = World::new(Scenario::preset(ScenarioKind::DoublePendulum)).unwrap();
        assert_eq!(world.bodies()[0].id, BodyId(1));
        assert_eq!(world.bodies()[1].id, BodyId(2));
        let spawned = world.spawn(Body::new(DVec2::ZERO, 1.0, 1.0)).unwrap();
        assert_eq!(spawned, BodyId(3));
        world.reset();
        assert_eq!(world.bodies().len(), 2);
        assert_eq!(world.spawn(Body::new(DVec2::ZERO, 1.0, 1.0)).unwrap(), BodyId(3));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut world = World::new(Scenario::preset(ScenarioKind::ElasticCollision).with_seed(42)).unwrap();
        world.run(50);
        world.reset();
        let first = world.snapshot().clone();
        world.reset();
        assert_eq!(world.snapshot(), &first);
        assert_eq!(first.tick, 0);
        assert_eq!(first.elapsed, 0.0);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let scenario = Scenario::preset(ScenarioKind::BouncingBalls).with_seed(3);
        let mut a = World::new(scenario.clone()).unwrap();
        let mut b = World::new(scenario).unwrap();
        assert_eq!(a.run(200), b.run(200));
    }

    #[test]
    fn test_spawn_rejects_invalid_body() {
        let mut world = empty_world();
        let err = world.spawn(Body::new(DVec2::ZERO, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, CommandError::InvalidBody(ConfigError::InvalidMass { .. })));
        assert!(world.bodies().is_empty());
    }

    #[test]
    fn test_unknown_body_is_a_no_op() {
        let mut world = empty_world();
        let id = world.spawn(Body::new(DVec2::ZERO, 2.0, 1.0)).unwrap();
        assert_eq!(
            world.apply_impulse(BodyId(99), DVec2::X),
            Err(CommandError::UnknownBody(BodyId(99)))
        );
        assert_eq!(world.body(id).unwrap().vel, DVec2::ZERO);
        assert_eq!(
            world.apply_impulse(id, DVec2::new(f64::NAN, 0.0)),
            Err(CommandError::NonFiniteImpulse)
        );
    }

    #[test]
    fn test_impulse_divides_by_mass() {
        let mut world = empty_world();
        let id = world.spawn(Body::new(DVec2::ZERO, 2.0, 1.0)).unwrap();
        world.apply_impulse(id, DVec2::new(4.0, -2.0)).unwrap();
        assert_eq!(world.body(id).unwrap().vel, DVec2::new(2.0, -1.0));
    }

    #[test]
    fn test_impulse_on_pendulum_bob_swings_it() {
        let mut world = empty_world();
        let id = world
            .spawn(
                Body::new(DVec2::ZERO, 2.0, 5.0)
                    .with_angular(Angular::at(0.0))
                    .with_tether(Tether {
                        pivot: Pivot::Fixed(DVec2::ZERO),
                        length: 10.0,
                    }),
            )
            .unwrap();
        world.apply_impulse(id, DVec2::new(20.0, 0.0)).unwrap();
        let bob = world.body(id).unwrap();
        assert!((bob.angular.unwrap().angular_vel - 1.0).abs() < 1e-12);
        assert!((bob.vel - DVec2::new(10.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_clear_removes_bodies() {
        let mut world = World::new(Scenario::preset(ScenarioKind::BouncingBalls)).unwrap();
        world.clear();
        assert!(world.bodies().is_empty());
        assert!(world.snapshot().bodies.is_empty());
    }

    #[test]
    fn test_toggle_and_select_force_laws() {
        let mut world = World::new(Scenario::preset(ScenarioKind::TowerCollapse)).unwrap();
        assert_eq!(world.toggle_force_law(ForceLawKind::UniformGravity), Ok(false));
        assert_eq!(world.toggle_force_law(ForceLawKind::UniformGravity), Ok(true));
        assert_eq!(
            world.toggle_force_law(ForceLawKind::Spring),
            Err(CommandError::UnknownForceLaw(ForceLawKind::Spring))
        );

        world.set_active_force_laws(&[ForceLawKind::Wind]).unwrap();
        let active: Vec<bool> = world.force_laws().iter().map(|s| s.active).collect();
        assert_eq!(active, vec![false, true]);
        assert!(world.set_active_force_laws(&[ForceLawKind::Pendulum]).is_err());
        // A rejected selection leaves the previous one in place
        let still: Vec<bool> = world.force_laws().iter().map(|s| s.active).collect();
        assert_eq!(still, vec![false, true]);
    }

    #[test]
    fn test_inactive_law_contributes_nothing() {
        let mut scenario = Scenario::empty("still");
        scenario.laws.push(ForceLaw::UniformGravity {
            g: 10.0,
            filter: BodyFilter::All,
        });
        scenario.bodies.push(Body::new(DVec2::ZERO, 1.0, 1.0));
        let mut world = World::new(scenario).unwrap();
        world.toggle_force_law(ForceLawKind::UniformGravity).unwrap();
        world.run(10);
        assert_eq!(world.bodies()[0].pos, DVec2::ZERO);
    }

    #[test]
    fn test_wind_pushes_tower() {
        let mut world = World::new(Scenario::preset(ScenarioKind::TowerCollapse)).unwrap();
        assert_eq!(world.set_wind(f64::INFINITY), Err(CommandError::NonFiniteWind));
        world.set_wind(500.0).unwrap();
        let before = world.snapshot().telemetry.center_of_mass.unwrap();
        world.run(30);
        let after = world.snapshot().telemetry.center_of_mass.unwrap();
        assert!(after.x > before.x);

        let mut calm = empty_world();
        assert_eq!(
            calm.set_wind(1.0),
            Err(CommandError::UnknownForceLaw(ForceLawKind::Wind))
        );
    }

    #[test]
    fn test_pause_keeps_snapshot() {
        let mut world = World::new(Scenario::preset(ScenarioKind::Pendulum)).unwrap();
        world.run(5);
        world.pause();
        let frozen = world.snapshot().clone();
        world.run(5);
        assert_eq!(world.snapshot(), &frozen);
        world.resume();
        world.step();
        assert_eq!(world.tick_count(), 6);
    }

    #[test]
    fn test_submitted_commands_run_before_next_tick() {
        let mut world = empty_world();
        world.submit(Command::Spawn {
            body: Body::new(DVec2::ZERO, 1.0, 1.0).with_velocity(DVec2::X),
        });
        world.submit(Command::ApplyImpulse {
            body: BodyId(7),
            impulse: DVec2::X,
        });
        assert!(world.bodies().is_empty());
        let dt = world.dt();
        let snapshot = world.step();
        assert_eq!(snapshot.bodies.len(), 1);
        assert_eq!(snapshot.tick, 1);
        assert!((snapshot.bodies[0].pos.x - dt).abs() < 1e-12);
    }

    #[test]
    fn test_execute_reports_status() {
        let mut world = World::new(Scenario::preset(ScenarioKind::MagneticFilings)).unwrap();
        assert_eq!(world.execute(Command::ToggleMagnet { index: 1 }), Ok(CommandStatus::Toggled(true)));
        assert_eq!(
            world.execute(Command::ToggleMagnet { index: 5 }),
            Err(CommandError::UnknownMagnet(5))
        );
        assert_eq!(world.execute(Command::FlipMagnets), Ok(CommandStatus::Applied));
        assert!(!world.magnets()[0].north_up);
        assert!(matches!(
            world.execute(Command::Spawn {
                body: Body::new(DVec2::ZERO, 1.0, 1.0)
            }),
            Ok(CommandStatus::Spawned(BodyId(1001)))
        ));
    }

    #[test]
    fn test_command_json_shape() {
        let command: Command = serde_json::from_str(r#"{"command":"apply_impulse","body":3,"impulse":[1.0,2.0]}"#).unwrap();
        assert_eq!(
            command,
            Command::ApplyImpulse {
                body: BodyId(3),
                impulse: DVec2::new(1.0, 2.0)
            }
        );
        let toggle: Command = serde_json::from_str(r#"{"command":"toggle_force_law","kind":"wind"}"#).unwrap();
        assert_eq!(toggle, Command::ToggleForceLaw { kind: ForceLawKind::Wind });
    }

    #[test]
    fn test_stepper_caps_substeps() {
        let mut world = World::new(Scenario {
            dt: 0.03125,
            ..Scenario::empty("coarse")
        })
        .unwrap();
        let mut stepper = Stepper::new();
        // Clamped to 0.1 s: three whole ticks, 0.00625 s left over
        assert_eq!(stepper.advance(&mut world, 5.0), 3);
        assert_eq!(stepper.advance(&mut world, 0.0), 0);
        assert_eq!(stepper.advance(&mut world, f64::NAN), 0);
        assert_eq!(stepper.advance(&mut world, 0.03), 1);
        assert_eq!(world.tick_count(), 4);

        let mut fine = World::new(Scenario {
            dt: 0.001,
            ..Scenario::empty("fine")
        })
        .unwrap();
        let mut stepper = Stepper::new();
        assert_eq!(stepper.advance(&mut fine, 0.1), MAX_SUBSTEPS);
    }

    #[test]
    fn test_stepper_drops_backlog_after_capped_frames() {
        let mut world = World::new(Scenario {
            dt: 0.001,
            ..Scenario::empty("fine")
        })
        .unwrap();
        let mut stepper = Stepper::new();
        for _ in 0..100 {
            assert_eq!(stepper.advance(&mut world, 0.1), MAX_SUBSTEPS);
            assert!(stepper.pending() < world.dt());
        }
        // Once frames stop arriving there is nothing left to catch up on
        assert_eq!(stepper.advance(&mut world, 0.0), 0);
        assert_eq!(world.tick_count(), 100 * MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_drop_rebounds_to_restitution_squared() {
        let mut scenario = Scenario::empty("drop");
        scenario.dt = 0.001;
        scenario.bounds = Some(Boundary::new(DVec2::new(-100.0, -100.0), DVec2::new(100.0, 50.0)));
        scenario.laws.push(ForceLaw::UniformGravity {
            g: 9.8,
            filter: BodyFilter::All,
        });
        scenario.bodies.push(Body::new(DVec2::ZERO, 1.0, 0.0).with_restitution(0.8));
        let mut world = World::new(scenario).unwrap();

        // Fall until the first bounce sends the body upward
        let mut steps = 0;
        while world.bodies()[0].vel.y >= 0.0 {
            world.step();
            steps += 1;
            assert!(steps < 20_000, "never reached the floor");
        }
        // Then follow it to the top of the rebound
        let mut peak = f64::INFINITY;
        while world.bodies()[0].vel.y < 0.0 {
            world.step();
            peak = peak.min(world.bodies()[0].pos.y);
        }
        let rebound = 50.0 - peak;
        assert!((rebound - 0.64 * 50.0).abs() < 1.0, "rebound height {rebound}");
    }

    #[test]
    fn test_mutual_gravity_accelerations_ratio() {
        let mut scenario = Scenario::empty("pair");
        scenario.dt = 0.01;
        scenario.laws.push(ForceLaw::MutualGravity {
            g_const: 1.0,
            sources: BodyFilter::All,
            filter: BodyFilter::All,
        });
        scenario.bodies.push(Body::new(DVec2::ZERO, 5.0, 0.0));
        scenario.bodies.push(Body::new(DVec2::new(10.0, 0.0), 10.0, 0.0));
        let mut world = World::new(scenario).unwrap();
        world.step();

        let a1 = world.bodies()[0].vel / 0.01;
        let a2 = world.bodies()[1].vel / 0.01;
        assert!(a1.x > 0.0 && a2.x < 0.0);
        assert!((a1.x - 0.1).abs() < 1e-9);
        assert!((a2.x + 0.05).abs() < 1e-9);
        assert!((a1.x / -a2.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_elastic_world_has_no_lasting_overlap() {
        let mut scenario = Scenario::empty("crowd");
        scenario.collisions = CollisionConfig::with_policy(CollisionPolicy::Elastic);
        for i in 0..3 {
            scenario
                .bodies
                .push(Body::new(DVec2::new(i as f64 * 3.0, (i % 2) as f64), 1.0, 2.5));
        }
        let mut world = World::new(scenario).unwrap();
        world.step();
        let bodies = world.bodies();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let reach = bodies[i].radius + bodies[j].radius;
                assert!(bodies[i].pos.distance(bodies[j].pos) >= reach - 1e-6);
            }
        }
    }
}
