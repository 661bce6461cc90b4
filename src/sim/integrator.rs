//! Semi-implicit Euler integration
//!
//! Velocity is updated from the accumulated force first, then position from
//! the updated velocity. Angular state follows the same order.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::{AxisLock, Body, Pivot};
use super::collision::Boundary;
use crate::consts::{SETTLE_HORIZONTAL_DECAY, SETTLE_SPEED};
use crate::normalize_angle;

/// Velocity factor for `damping` (fraction lost per unit time) over `dt`
#[inline]
fn retention(damping: f64, dt: f64) -> f64 {
    if damping <= 0.0 { 1.0 } else { (1.0 - damping).powf(dt) }
}

/// Advance one body by `dt` given its accumulated force and torque
pub fn step(body: &mut Body, force: DVec2, torque: f64, dt: f64) {
    if body.pinned {
        return;
    }
    let keep = retention(body.damping, dt);

    // Tethered bodies get their position from the pendulum angle
    if body.tether.is_none() {
        body.vel += force / body.mass * dt;
        match body.axis_lock {
            AxisLock::Free => {}
            AxisLock::Vertical => body.vel.x = 0.0,
            AxisLock::Horizontal => body.vel.y = 0.0,
        }
        body.vel *= keep;
        body.pos += body.vel * dt;
    }

    if let Some(angular) = body.angular.as_mut() {
        angular.angular_vel += torque / angular.inertia * dt;
        angular.angular_vel *= keep;
        angular.angle += angular.angular_vel * dt;

        if let Some(dipole) = body.dipole.as_mut() {
            dipole.angle = normalize_angle(dipole.angle + angular.angular_vel * dipole.relaxation * dt);
        }
    }
}

/// Place every tethered body on its rod and derive its linear velocity
///
/// Bodies are visited in order, so a bob hanging from another bob must come
/// after it.
pub fn project_tethers(bodies: &mut [Body]) {
    for i in 0..bodies.len() {
        let (Some(tether), Some(angular)) = (bodies[i].tether, bodies[i].angular) else {
            continue;
        };
        let (pivot_pos, pivot_vel) = match tether.pivot {
            Pivot::Fixed(p) => (p, DVec2::ZERO),
            Pivot::Body(id) => match bodies.iter().find(|b| b.id == id) {
                Some(parent) => (parent.pos, parent.vel),
                None => continue,
            },
        };
        let (sin, cos) = angular.angle.sin_cos();
        let body = &mut bodies[i];
        body.pos = pivot_pos + DVec2::new(sin, cos) * tether.length;
        body.vel = pivot_vel + DVec2::new(cos, -sin) * (tether.length * angular.angular_vel);
    }
}

/// Snap jitter out of bodies resting on the floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlingConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Vertical speed below which a floor-resting body settles
    #[serde(default = "default_speed_threshold")]
    pub speed_threshold: f64,
    /// Per-tick horizontal velocity factor once settled
    #[serde(default = "default_horizontal_decay")]
    pub horizontal_decay: f64,
}

fn default_speed_threshold() -> f64 {
    SETTLE_SPEED
}

fn default_horizontal_decay() -> f64 {
    SETTLE_HORIZONTAL_DECAY
}

impl Default for SettlingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            speed_threshold: SETTLE_SPEED,
            horizontal_decay: SETTLE_HORIZONTAL_DECAY,
        }
    }
}

impl SettlingConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Run after collision resolution; returns how many bodies settled
    pub fn apply(&self, bodies: &mut [Body], boundary: &Boundary) -> usize {
        if !self.enabled {
            return 0;
        }
        let mut settled = 0;
        for body in bodies.iter_mut() {
            if body.pinned || body.tether.is_some() {
                continue;
            }
            if body.vel.y.abs() < self.speed_threshold && boundary.on_floor(body) {
                body.vel.y = 0.0;
                body.vel.x *= self.horizontal_decay;
                settled += 1;
            }
        }
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{Angular, Dipole, Tether};
    use crate::sim::BodyId;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_velocity_updates_before_position() {
        let mut body = Body::new(DVec2::ZERO, 2.0, 1.0);
        step(&mut body, DVec2::new(4.0, 0.0), 0.0, 0.5);
        // v = 0 + (4/2)·0.5 = 1, x = 0 + 1·0.5
        assert_eq!(body.vel, DVec2::new(1.0, 0.0));
        assert_eq!(body.pos, DVec2::new(0.5, 0.0));
    }

    #[test]
    fn test_pinned_body_does_not_move() {
        let mut body = Body::new(DVec2::new(3.0, 3.0), 1.0, 1.0).pinned();
        step(&mut body, DVec2::new(100.0, 100.0), 0.0, 1.0);
        assert_eq!(body.pos, DVec2::new(3.0, 3.0));
        assert_eq!(body.vel, DVec2::ZERO);
    }

    #[test]
    fn test_damping_per_unit_time() {
        let mut body = Body::new(DVec2::ZERO, 1.0, 0.0)
            .with_velocity(DVec2::new(10.0, 0.0))
            .with_damping(0.02);
        step(&mut body, DVec2::ZERO, 0.0, 1.0);
        assert!((body.vel.x - 9.8).abs() < 1e-12);
        assert!((body.pos.x - 9.8).abs() < 1e-12);
    }

    #[test]
    fn test_axis_lock_discards_other_component() {
        let mut body = Body::new(DVec2::ZERO, 1.0, 0.0).with_axis_lock(AxisLock::Vertical);
        step(&mut body, DVec2::new(5.0, 2.0), 0.0, 1.0);
        assert_eq!(body.vel, DVec2::new(0.0, 2.0));
        assert_eq!(body.pos.x, 0.0);
    }

    #[test]
    fn test_angular_and_dipole_advance() {
        let mut body = Body::new(DVec2::ZERO, 1.0, 1.0)
            .with_angular(Angular::at(0.0))
            .with_dipole(Dipole {
                angle: 0.0,
                strength: 1.0,
                relaxation: 2.0,
            });
        step(&mut body, DVec2::ZERO, 0.5, 0.1);
        let angular = body.angular.unwrap();
        assert!((angular.angular_vel - 0.05).abs() < 1e-12);
        assert!((angular.angle - 0.005).abs() < 1e-12);
        assert!((body.dipole.unwrap().angle - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_damping_applies_to_new_spin_before_dipole_turns() {
        let mut body = Body::new(DVec2::ZERO, 1.0, 1.0)
            .with_damping(0.5)
            .with_angular(Angular::at(0.0))
            .with_dipole(Dipole {
                angle: 0.0,
                strength: 1.0,
                relaxation: 1.0,
            });
        step(&mut body, DVec2::ZERO, 2.0, 1.0);
        // ω = (0 + 2·1)·0.5, and the dipole turns by the damped ω
        assert!((body.angular.unwrap().angular_vel - 1.0).abs() < 1e-12);
        assert!((body.dipole.unwrap().angle - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tether_projection_places_bob_on_rod() {
        let pivot = DVec2::new(400.0, 100.0);
        let mut bodies = vec![
            Body::new(DVec2::ZERO, 10.0, 15.0)
                .with_angular(Angular {
                    angle: FRAC_PI_2,
                    angular_vel: 0.1,
                    inertia: 1.0,
                })
                .with_tether(Tether {
                    pivot: Pivot::Fixed(pivot),
                    length: 200.0,
                }),
        ];
        project_tethers(&mut bodies);
        assert!((bodies[0].pos - DVec2::new(600.0, 100.0)).length() < 1e-9);
        // Swinging up and to the right of the pivot: velocity points up (-y)
        assert!((bodies[0].vel - DVec2::new(0.0, -20.0)).length() < 1e-9);
    }

    #[test]
    fn test_chained_tethers_follow_parent() {
        let mut upper = Body::new(DVec2::ZERO, 5.0, 10.0)
            .with_angular(Angular::at(0.0))
            .with_tether(Tether {
                pivot: Pivot::Fixed(DVec2::new(400.0, 200.0)),
                length: 150.0,
            });
        upper.id = BodyId(1);
        let lower = Body::new(DVec2::ZERO, 10.0, 10.0)
            .with_angular(Angular::at(0.0))
            .with_tether(Tether {
                pivot: Pivot::Body(BodyId(1)),
                length: 150.0,
            });
        let mut bodies = vec![upper, lower];
        project_tethers(&mut bodies);
        assert!((bodies[1].pos - DVec2::new(400.0, 500.0)).length() < 1e-9);
    }

    #[test]
    fn test_settling_after_floor_contact() {
        let floor = Boundary::new(DVec2::ZERO, DVec2::new(100.0, 100.0));
        let mut bodies = vec![
            Body::new(DVec2::new(50.0, 90.0), 1.0, 10.0).with_velocity(DVec2::new(2.0, -0.3)),
            Body::new(DVec2::new(50.0, 40.0), 1.0, 10.0).with_velocity(DVec2::new(2.0, 0.1)),
        ];
        let settled = SettlingConfig::enabled().apply(&mut bodies, &floor);
        assert_eq!(settled, 1);
        assert_eq!(bodies[0].vel.y, 0.0);
        assert!((bodies[0].vel.x - 1.9).abs() < 1e-12);
        // Airborne body is untouched
        assert_eq!(bodies[1].vel, DVec2::new(2.0, 0.1));
    }

    #[test]
    fn test_settling_disabled_by_default() {
        let floor = Boundary::new(DVec2::ZERO, DVec2::new(100.0, 100.0));
        let mut bodies = vec![Body::new(DVec2::new(50.0, 90.0), 1.0, 10.0).with_velocity(DVec2::new(2.0, -0.3))];
        assert_eq!(SettlingConfig::default().apply(&mut bodies, &floor), 0);
        assert_eq!(bodies[0].vel.y, -0.3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn force_free_motion_is_linear(
                x in -1e3f64..1e3, y in -1e3f64..1e3,
                vx in -1e2f64..1e2, vy in -1e2f64..1e2,
                dt in 1e-4f64..1.0,
            ) {
                let mut body = Body::new(DVec2::new(x, y), 1.0, 1.0).with_velocity(DVec2::new(vx, vy));
                step(&mut body, DVec2::ZERO, 0.0, dt);
                prop_assert_eq!(body.vel, DVec2::new(vx, vy));
                prop_assert_eq!(body.pos, DVec2::new(x, y) + DVec2::new(vx, vy) * dt);
            }
        }
    }
}
