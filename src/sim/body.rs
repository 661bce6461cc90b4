//! Simulated bodies
//!
//! A body is a point (radius 0) or a circle with optional rotational state,
//! magnetic dipole and pendulum tether.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Stable body handle, assigned by the world. Ids restart at 1 on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Group label used by force laws to select the bodies they act on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyTag(pub u32);

/// Restricts linear motion to one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisLock {
    #[default]
    Free,
    /// Only y changes (spring-mass bob)
    Vertical,
    /// Only x changes
    Horizontal,
}

/// Rotational state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Angular {
    /// Radians
    pub angle: f64,
    /// Radians per unit time
    pub angular_vel: f64,
    /// Moment of inertia; torque is divided by this
    #[serde(default = "default_inertia")]
    pub inertia: f64,
}

fn default_inertia() -> f64 {
    1.0
}

impl Angular {
    pub fn at(angle: f64) -> Self {
        Self {
            angle,
            angular_vel: 0.0,
            inertia: 1.0,
        }
    }
}

/// Local magnetic moment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dipole {
    /// Moment direction (radians)
    pub angle: f64,
    pub strength: f64,
    /// Dipole angle advances by `angular_vel * relaxation * dt` per tick
    #[serde(default = "default_relaxation")]
    pub relaxation: f64,
}

fn default_relaxation() -> f64 {
    6.0
}

/// What a pendulum rod hangs from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pivot {
    Fixed(DVec2),
    Body(BodyId),
}

/// Rigid rod from a pivot; the body's position follows its angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tether {
    pub pivot: Pivot,
    pub length: f64,
}

/// A simulated body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Assigned by the world on spawn; ignored in scenario files
    #[serde(default)]
    pub id: BodyId,
    pub pos: DVec2,
    #[serde(default)]
    pub vel: DVec2,
    pub mass: f64,
    /// 0 = point body
    #[serde(default)]
    pub radius: f64,
    /// Bounciness against boundaries, in [0, 1]
    #[serde(default = "default_restitution")]
    pub restitution: f64,
    /// Fraction of velocity lost per unit time, in [0, 1]
    #[serde(default)]
    pub damping: f64,
    #[serde(default)]
    pub tag: BodyTag,
    /// 0xRRGGBB, passed through to snapshots
    #[serde(default = "default_color")]
    pub color: u32,
    /// Immovable (infinite mass)
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub axis_lock: AxisLock,
    #[serde(default)]
    pub angular: Option<Angular>,
    #[serde(default)]
    pub dipole: Option<Dipole>,
    #[serde(default)]
    pub tether: Option<Tether>,
}

fn default_restitution() -> f64 {
    1.0
}

fn default_color() -> u32 {
    0xFFFFFF
}

impl Body {
    /// Circle at `pos` with the given mass and radius; everything else default
    pub fn new(pos: DVec2, mass: f64, radius: f64) -> Self {
        Self {
            id: BodyId::default(),
            pos,
            vel: DVec2::ZERO,
            mass,
            radius,
            restitution: default_restitution(),
            damping: 0.0,
            tag: BodyTag::default(),
            color: default_color(),
            pinned: false,
            axis_lock: AxisLock::Free,
            angular: None,
            dipole: None,
            tether: None,
        }
    }

    pub fn with_velocity(mut self, vel: DVec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_tag(mut self, tag: BodyTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn with_axis_lock(mut self, lock: AxisLock) -> Self {
        self.axis_lock = lock;
        self
    }

    pub fn with_angular(mut self, angular: Angular) -> Self {
        self.angular = Some(angular);
        self
    }

    pub fn with_dipole(mut self, dipole: Dipole) -> Self {
        self.dipole = Some(dipole);
        self
    }

    pub fn with_tether(mut self, tether: Tether) -> Self {
        self.tether = Some(tether);
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self.vel = DVec2::ZERO;
        self
    }

    /// `1 / mass`, or 0 for pinned bodies
    #[inline]
    pub fn inv_mass(&self) -> f64 {
        if self.pinned { 0.0 } else { 1.0 / self.mass }
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        if self.pinned {
            return 0.0;
        }
        let linear = 0.5 * self.mass * self.vel.length_squared();
        let rotational = self
            .angular
            .map_or(0.0, |a| 0.5 * a.inertia * a.angular_vel * a.angular_vel);
        linear + rotational
    }

    /// Check construction invariants. `index` is only used in the error.
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(ConfigError::InvalidMass {
                index,
                mass: self.mass,
            });
        }
        if !(self.radius >= 0.0 && self.radius.is_finite()) {
            return Err(ConfigError::InvalidRadius {
                index,
                radius: self.radius,
            });
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(ConfigError::InvalidRestitution {
                index,
                restitution: self.restitution,
            });
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ConfigError::InvalidDamping {
                index,
                damping: self.damping,
            });
        }
        if !self.pos.is_finite() {
            return Err(ConfigError::NonFiniteState { index, what: "position" });
        }
        if !self.vel.is_finite() {
            return Err(ConfigError::NonFiniteState { index, what: "velocity" });
        }
        if let Some(angular) = &self.angular {
            if !(angular.angle.is_finite() && angular.angular_vel.is_finite()) {
                return Err(ConfigError::NonFiniteState { index, what: "angle" });
            }
            if !(angular.inertia > 0.0 && angular.inertia.is_finite()) {
                return Err(ConfigError::InvalidInertia {
                    index,
                    inertia: angular.inertia,
                });
            }
        }
        if let Some(dipole) = &self.dipole {
            if !(dipole.angle.is_finite() && dipole.strength.is_finite() && dipole.relaxation.is_finite()) {
                return Err(ConfigError::NonFiniteState { index, what: "dipole" });
            }
        }
        if let Some(tether) = &self.tether {
            if !(tether.length > 0.0 && tether.length.is_finite()) {
                return Err(ConfigError::InvalidTether {
                    index,
                    length: tether.length,
                });
            }
            // The swing angle is what moves a tethered body
            if self.angular.is_none() {
                return Err(ConfigError::TetherWithoutAngle { index });
            }
        }
        Ok(())
    }
}
