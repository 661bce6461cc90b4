//! Fixed timestep simulation tick
//!
//! Advances the world deterministically: the next state is a pure function of
//! the current state. Phases run in a fixed order and each completes for every
//! body before the next begins.

use super::collision::{resolve_boundary, resolve_pairs};
use super::force::ForceContext;
use super::integrator::{project_tethers, step};
use super::world::World;

/// Advance `world` by one timestep of `world.dt()`
pub fn tick(world: &mut World) {
    let dt = world.dt;
    let n = world.bodies.len();

    // 1. Zero accumulators
    world.acc.reset(n);

    // 2. Active force laws, in declared order
    let ctx = ForceContext {
        bodies: &world.bodies,
        magnets: &world.magnets,
    };
    for slot in world.laws.iter().filter(|s| s.active) {
        slot.law.apply(&ctx, &mut world.acc);
    }

    // 3. Integrate, then put pendulum bobs back on their rods
    for (i, body) in world.bodies.iter_mut().enumerate() {
        step(body, world.acc.force[i], world.acc.torque[i], dt);
    }
    project_tethers(&mut world.bodies);

    // 4. Boundaries, then pairs
    if let Some(bounds) = &world.scenario.bounds {
        for body in world.bodies.iter_mut() {
            resolve_boundary(body, bounds);
        }
    }
    resolve_pairs(&mut world.bodies, &world.scenario.collisions, world.scenario.bounds.as_ref());

    // 5. Settling runs after every collision is resolved
    if let Some(bounds) = &world.scenario.bounds {
        world.scenario.settling.apply(&mut world.bodies, bounds);
    }

    // 6. Advance the clock
    world.elapsed += dt;
    world.tick_count += 1;

    // 7. Publish
    world.publish();
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::scenario::{Scenario, ScenarioKind};
    use crate::sim::body::Body;
    use crate::sim::collision::{Boundary, CollisionConfig, CollisionPolicy, pair_contact};
    use crate::sim::force::{BodyFilter, ForceLaw};
    use crate::sim::integrator::SettlingConfig;

    #[test]
    fn test_tick_advances_clock_and_publishes() {
        let mut world = World::new(Scenario::preset(ScenarioKind::SpringMass)).unwrap();
        tick(&mut world);
        tick(&mut world);
        assert_eq!(world.tick_count(), 2);
        assert_eq!(world.elapsed(), 2.0);
        assert_eq!(world.snapshot().tick, 2);
        assert_eq!(world.snapshot().bodies[0].pos, world.bodies()[0].pos);
    }

    #[test]
    fn test_spring_step_matches_frame_update() {
        // v += (-k·x + m·g) / m; v *= 1 - damping; x += v
        let mut world = World::new(Scenario::preset(ScenarioKind::SpringMass)).unwrap();
        let (k, m, g, damping) = (0.05, 2.0, 9.8, 0.02);
        let mut stretch: f64 = 50.0;
        let mut velocity: f64 = 0.0;
        for _ in 0..100 {
            velocity += (-k * stretch + m * g) / m;
            velocity *= 1.0 - damping;
            stretch += velocity;
            tick(&mut world);
        }
        let body = &world.bodies()[0];
        assert!((body.pos.y - (200.0 + stretch)).abs() < 1e-6);
        assert_eq!(body.pos.x, 400.0);
    }

    #[test]
    fn test_pendulum_swings_and_loses_energy() {
        let mut world = World::new(Scenario::preset(ScenarioKind::Pendulum)).unwrap();
        let start = world.bodies()[0].pos;
        assert!((start - DVec2::new(400.0 + 200.0 * (0.5f64).sqrt(), 100.0 + 200.0 * (0.5f64).sqrt())).length() < 1e-9);
        for _ in 0..400 {
            tick(&mut world);
            let bob = &world.bodies()[0];
            assert!((bob.pos.distance(DVec2::new(400.0, 100.0)) - 200.0).abs() < 1e-9);
        }
        let angle = world.bodies()[0].angular.unwrap().angle;
        assert!(angle.abs() < std::f64::consts::FRAC_PI_4);
    }

    #[test]
    fn test_double_pendulum_stays_connected() {
        let mut world = World::new(Scenario::preset(ScenarioKind::DoublePendulum)).unwrap();
        for _ in 0..200 {
            tick(&mut world);
        }
        let bodies = world.bodies();
        assert!((bodies[0].pos.distance(DVec2::new(400.0, 200.0)) - 150.0).abs() < 1e-9);
        assert!((bodies[1].pos.distance(bodies[0].pos) - 150.0).abs() < 1e-9);
        assert!(bodies.iter().all(|b| b.pos.is_finite()));
    }

    #[test]
    fn test_orbit_keeps_radius() {
        let mut world = World::new(Scenario::preset(ScenarioKind::OrbitingPlanets)).unwrap();
        // About 91 days of one-hour steps: Mercury's orbit stays near 5.79e10 m
        for _ in 0..(24 * 91) {
            tick(&mut world);
        }
        let sun = &world.bodies()[0];
        assert_eq!(sun.pos, DVec2::ZERO);
        let mercury = world.bodies()[1].pos.length();
        assert!((mercury / 5.79e10 - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_settling_stops_jitter_on_floor() {
        let mut scenario = Scenario::empty("rest");
        scenario.bounds = Some(Boundary::new(DVec2::ZERO, DVec2::new(200.0, 100.0)));
        scenario.settling = SettlingConfig::enabled();
        scenario.laws.push(ForceLaw::UniformGravity {
            g: 9.8,
            filter: BodyFilter::All,
        });
        scenario
            .bodies
            .push(Body::new(DVec2::new(100.0, 90.0), 1.0, 10.0).with_velocity(DVec2::new(3.0, 0.0)));
        let mut world = World::new(scenario).unwrap();
        world.run(100);
        let body = &world.bodies()[0];
        assert_eq!(body.pos.y, 90.0);
        assert_eq!(body.vel.y, 0.0);
        assert!(body.vel.x.abs() < 3.0 * 0.95f64.powi(90));
    }

    #[test]
    fn test_tower_collapse_keeps_blocks_apart_and_above_floor() {
        let mut world = World::new(Scenario::preset(ScenarioKind::TowerCollapse)).unwrap();
        let floor = world.scenario().bounds.as_ref().unwrap().max.y;
        for _ in 0..300 {
            tick(&mut world);
            let bodies = world.bodies();
            let mut worst: f64 = 0.0;
            for i in 0..bodies.len() {
                assert!(
                    bodies[i].pos.y + bodies[i].radius <= floor + 1e-9,
                    "tick {}: body {i} below the floor",
                    world.tick_count()
                );
                for j in (i + 1)..bodies.len() {
                    if let Some(contact) = pair_contact(&bodies[i], &bodies[j]) {
                        worst = worst.max(contact.penetration);
                    }
                }
            }
            // A tenth of the 15 px block radius
            assert!(worst < 1.5, "tick {}: overlap {worst}", world.tick_count());
        }
    }

    #[test]
    fn test_velocity_exchange_in_world() {
        let mut scenario = Scenario::empty("swap");
        scenario.collisions = CollisionConfig::with_policy(CollisionPolicy::VelocityExchange);
        scenario
            .bodies
            .push(Body::new(DVec2::new(0.0, 0.0), 1.0, 1.0).with_velocity(DVec2::new(1.0, 0.0)));
        scenario
            .bodies
            .push(Body::new(DVec2::new(2.5, 0.0), 1.0, 1.0).with_velocity(DVec2::new(-1.0, 0.0)));
        let mut world = World::new(scenario).unwrap();
        world.run(30);
        assert!(world.bodies()[0].vel.x < 0.0);
        assert!(world.bodies()[1].vel.x > 0.0);
    }

    #[test]
    fn test_filings_stay_finite_and_normalized() {
        let mut world = World::new(Scenario::preset(ScenarioKind::MagneticFilings).with_seed(1)).unwrap();
        world.toggle_magnet(1).unwrap();
        world.run(60);
        for body in world.bodies() {
            assert!(body.pos.is_finite() && body.vel.is_finite());
            let angle = body.dipole.map(|d| d.angle).unwrap_or(0.0);
            assert!((-std::f64::consts::PI..std::f64::consts::PI).contains(&angle));
        }
    }
}
