//! Force laws
//!
//! Every law is a pure function of the current body set (and the world's
//! magnets) that adds into per-body force/torque accumulators. Laws never move
//! bodies, never remove them and never draw random numbers, so a tick is
//! reproducible from the state it starts with.
//!
//! Interactions that would divide by a zero distance or normalize a zero vector
//! are skipped for that tick.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyTag, Pivot};
use super::error::ConfigError;
use super::spatial::pairs_within;
use super::vector::{separation, unit, with_magnitude};
use crate::consts::FIELD_MIN_DISTANCE_SQ;
use crate::{angle_of, normalize_angle, unit_from_angle};

/// Which bodies a law acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFilter {
    #[default]
    All,
    Tag(BodyTag),
}

impl BodyFilter {
    #[inline]
    pub fn matches(&self, body: &Body) -> bool {
        match self {
            BodyFilter::All => true,
            BodyFilter::Tag(tag) => body.tag == *tag,
        }
    }
}

/// A fixed bar magnet acting as a field source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magnet {
    pub pos: DVec2,
    pub strength: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_true")]
    pub north_up: bool,
    /// Disabled magnets contribute no field
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Magnet {
    pub fn new(pos: DVec2, strength: f64, width: f64, height: f64, north_up: bool) -> Self {
        Self {
            pos,
            strength,
            width,
            height,
            north_up,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Swap the poles
    pub fn flip(&mut self) {
        self.north_up = !self.north_up;
    }

    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if !(self.pos.is_finite() && self.strength.is_finite()) {
            return Err(ConfigError::InvalidMagnet {
                index,
                reason: "position and strength must be finite",
            });
        }
        if !(self.width >= 0.0 && self.height >= 0.0 && self.width.is_finite() && self.height.is_finite()) {
            return Err(ConfigError::InvalidMagnet {
                index,
                reason: "size must be non-negative",
            });
        }
        Ok(())
    }

    /// Field vector at `p`
    ///
    /// Magnitude falls off as `strength / r²` (r² clamped to at least 1).
    /// Inside the magnet's footprint the field is vertical; outside, a
    /// simplified dipole curve picks the direction and the vector is rescaled
    /// to that magnitude.
    pub fn field_at(&self, p: DVec2) -> DVec2 {
        if !self.enabled {
            return DVec2::ZERO;
        }
        let d = p - self.pos;
        let r_sq = d.length_squared().max(FIELD_MIN_DISTANCE_SQ);
        let magnitude = self.strength / r_sq;
        let sign = if self.north_up { 1.0 } else { -1.0 };

        if d.x.abs() < self.width / 2.0 && d.y.abs() < self.height / 2.0 {
            return DVec2::new(0.0, sign * magnitude);
        }

        let r = r_sq.sqrt();
        let r3 = r_sq * r;
        let r5 = r3 * r_sq;
        let curve = DVec2::new(
            3.0 * d.x * d.y * magnitude / r5 * sign,
            magnitude * (3.0 * d.y * d.y / r5 - 1.0 / r3) * sign,
        );
        with_magnitude(curve, magnitude)
    }
}

/// Sum of every enabled magnet's field at `p`
pub fn total_field(magnets: &[Magnet], p: DVec2) -> DVec2 {
    magnets.iter().map(|m| m.field_at(p)).sum()
}

/// Variant names, used to toggle laws by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceLawKind {
    UniformGravity,
    MutualGravity,
    Spring,
    MagneticField,
    AlignTorque,
    DipoleDipole,
    Wind,
    Pendulum,
    DoublePendulum,
}

impl ForceLawKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForceLawKind::UniformGravity => "uniform_gravity",
            ForceLawKind::MutualGravity => "mutual_gravity",
            ForceLawKind::Spring => "spring",
            ForceLawKind::MagneticField => "magnetic_field",
            ForceLawKind::AlignTorque => "align_torque",
            ForceLawKind::DipoleDipole => "dipole_dipole",
            ForceLawKind::Wind => "wind",
            ForceLawKind::Pendulum => "pendulum",
            ForceLawKind::DoublePendulum => "double_pendulum",
        }
    }
}

impl fmt::Display for ForceLawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A force/torque contributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForceLaw {
    /// `F = (0, m·g)` (screen coordinates: +y is down)
    UniformGravity {
        g: f64,
        #[serde(default)]
        filter: BodyFilter,
    },
    /// Inverse-square attraction `G·m_i·m_j / r²`
    ///
    /// With `sources: All` every matching pair is evaluated once and both
    /// bodies are updated. With `sources: Tag(..)` only tagged bodies attract,
    /// and only the bodies matching `filter` are pulled.
    MutualGravity {
        g_const: f64,
        #[serde(default)]
        sources: BodyFilter,
        #[serde(default)]
        filter: BodyFilter,
    },
    /// Hooke spring to a fixed anchor: `F = -k·(length - rest_length)` along the spring axis
    Spring {
        anchor: DVec2,
        k: f64,
        #[serde(default)]
        rest_length: f64,
        #[serde(default)]
        filter: BodyFilter,
    },
    /// Pull of the magnets' field on dipole bodies: `F = B·|B|·force_scale`
    MagneticField {
        force_scale: f64,
        #[serde(default)]
        filter: BodyFilter,
    },
    /// Torque turning dipoles toward the local field:
    /// `τ = strength · sin(field_angle - dipole_angle) · gain`
    AlignTorque {
        gain: f64,
        #[serde(default)]
        filter: BodyFilter,
    },
    /// Dipole-dipole force between nearby dipole bodies:
    /// `(3·dot1·dot2 - cos(Δangle)) / r³ · s_i · s_j · coupling` along the separation
    DipoleDipole {
        cutoff: f64,
        coupling: f64,
        #[serde(default)]
        filter: BodyFilter,
    },
    /// Constant push proportional to the body's cross-section: `(2r)² / 1000`
    Wind {
        strength: f64,
        #[serde(default = "default_wind_direction")]
        direction: DVec2,
        #[serde(default)]
        filter: BodyFilter,
    },
    /// Tethered bob: `α = -(g / L)·sin θ - drag·ω`
    Pendulum {
        gravity: f64,
        #[serde(default)]
        drag: f64,
        #[serde(default)]
        filter: BodyFilter,
    },
    /// Two bobs in series, upper one hanging from a fixed pivot
    DoublePendulum {
        gravity: f64,
        upper: BodyTag,
        lower: BodyTag,
    },
}

fn default_wind_direction() -> DVec2 {
    DVec2::X
}

/// Per-body force and torque sums for one tick
#[derive(Debug, Clone, Default)]
pub struct Accumulators {
    pub force: Vec<DVec2>,
    pub torque: Vec<f64>,
}

impl Accumulators {
    /// Zero the buffers and size them for `n` bodies
    pub fn reset(&mut self, n: usize) {
        self.force.clear();
        self.force.resize(n, DVec2::ZERO);
        self.torque.clear();
        self.torque.resize(n, 0.0);
    }
}

/// Read-only world state a law evaluates against
#[derive(Debug, Clone, Copy)]
pub struct ForceContext<'a> {
    pub bodies: &'a [Body],
    pub magnets: &'a [Magnet],
}

impl ForceLaw {
    pub fn kind(&self) -> ForceLawKind {
        match self {
            ForceLaw::UniformGravity { .. } => ForceLawKind::UniformGravity,
            ForceLaw::MutualGravity { .. } => ForceLawKind::MutualGravity,
            ForceLaw::Spring { .. } => ForceLawKind::Spring,
            ForceLaw::MagneticField { .. } => ForceLawKind::MagneticField,
            ForceLaw::AlignTorque { .. } => ForceLawKind::AlignTorque,
            ForceLaw::DipoleDipole { .. } => ForceLawKind::DipoleDipole,
            ForceLaw::Wind { .. } => ForceLawKind::Wind,
            ForceLaw::Pendulum { .. } => ForceLawKind::Pendulum,
            ForceLaw::DoublePendulum { .. } => ForceLawKind::DoublePendulum,
        }
    }

    /// Check the law's constants
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let fail = |reason| ConfigError::InvalidForceLaw {
            index,
            kind: self.kind(),
            reason,
        };
        match self {
            ForceLaw::UniformGravity { g, .. } if !g.is_finite() => Err(fail("g must be finite")),
            ForceLaw::MutualGravity { g_const, .. } if !g_const.is_finite() => {
                Err(fail("gravitational constant must be finite"))
            }
            ForceLaw::Spring {
                anchor,
                k,
                rest_length,
                ..
            } => {
                if !(*k >= 0.0 && k.is_finite()) {
                    Err(fail("spring constant must be non-negative"))
                } else if !(*rest_length >= 0.0 && rest_length.is_finite()) {
                    Err(fail("rest length must be non-negative"))
                } else if !anchor.is_finite() {
                    Err(fail("anchor must be finite"))
                } else {
                    Ok(())
                }
            }
            ForceLaw::MagneticField { force_scale, .. } if !force_scale.is_finite() => {
                Err(fail("force scale must be finite"))
            }
            ForceLaw::AlignTorque { gain, .. } if !gain.is_finite() => Err(fail("gain must be finite")),
            ForceLaw::DipoleDipole { cutoff, coupling, .. } => {
                if !(*cutoff > 0.0 && cutoff.is_finite()) {
                    Err(fail("cutoff must be positive"))
                } else if !coupling.is_finite() {
                    Err(fail("coupling must be finite"))
                } else {
                    Ok(())
                }
            }
            ForceLaw::Wind {
                strength, direction, ..
            } => {
                if !strength.is_finite() {
                    Err(fail("strength must be finite"))
                } else if unit(*direction).is_none() {
                    Err(fail("direction must be a non-zero vector"))
                } else {
                    Ok(())
                }
            }
            ForceLaw::Pendulum { gravity, drag, .. } => {
                if !gravity.is_finite() {
                    Err(fail("gravity must be finite"))
                } else if !(*drag >= 0.0 && drag.is_finite()) {
                    Err(fail("drag must be non-negative"))
                } else {
                    Ok(())
                }
            }
            ForceLaw::DoublePendulum { gravity, upper, lower } => {
                if !gravity.is_finite() {
                    Err(fail("gravity must be finite"))
                } else if upper == lower {
                    Err(fail("upper and lower tags must differ"))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Set the strength of a wind law; returns false for other variants
    pub fn set_wind_strength(&mut self, value: f64) -> bool {
        match self {
            ForceLaw::Wind { strength, .. } => {
                *strength = value;
                true
            }
            _ => false,
        }
    }

    /// Add this law's contribution into `acc`
    pub fn apply(&self, ctx: &ForceContext<'_>, acc: &mut Accumulators) {
        let bodies = ctx.bodies;
        match self {
            ForceLaw::UniformGravity { g, filter } => {
                for (i, body) in bodies.iter().enumerate() {
                    if filter.matches(body) {
                        acc.force[i].y += body.mass * g;
                    }
                }
            }

            ForceLaw::MutualGravity {
                g_const,
                sources,
                filter,
            } => match sources {
                BodyFilter::All => {
                    for i in 0..bodies.len() {
                        if !filter.matches(&bodies[i]) {
                            continue;
                        }
                        for j in (i + 1)..bodies.len() {
                            if !filter.matches(&bodies[j]) {
                                continue;
                            }
                            if let Some(f) = gravity_between(&bodies[i], &bodies[j], *g_const) {
                                acc.force[i] += f;
                                acc.force[j] -= f;
                            }
                        }
                    }
                }
                BodyFilter::Tag(_) => {
                    for (s, source) in bodies.iter().enumerate() {
                        if !sources.matches(source) {
                            continue;
                        }
                        for (i, target) in bodies.iter().enumerate() {
                            if i == s || !filter.matches(target) {
                                continue;
                            }
                            if let Some(f) = gravity_between(target, source, *g_const) {
                                acc.force[i] += f;
                            }
                        }
                    }
                }
            },

            ForceLaw::Spring {
                anchor,
                k,
                rest_length,
                filter,
            } => {
                for (i, body) in bodies.iter().enumerate() {
                    if !filter.matches(body) {
                        continue;
                    }
                    // Body sitting on the anchor has no spring axis
                    let Some(sep) = separation(*anchor, body.pos) else {
                        continue;
                    };
                    acc.force[i] += sep.normal * (-k * (sep.distance - rest_length));
                }
            }

            ForceLaw::MagneticField {
                force_scale,
                filter,
            } => {
                for (i, body) in bodies.iter().enumerate() {
                    if body.dipole.is_none() || !filter.matches(body) {
                        continue;
                    }
                    let field = total_field(ctx.magnets, body.pos);
                    acc.force[i] += field * (field.length() * force_scale);
                }
            }

            ForceLaw::AlignTorque { gain, filter } => {
                for (i, body) in bodies.iter().enumerate() {
                    let Some(dipole) = body.dipole else { continue };
                    if !filter.matches(body) {
                        continue;
                    }
                    let field = total_field(ctx.magnets, body.pos);
                    if unit(field).is_none() {
                        continue;
                    }
                    let diff = normalize_angle(angle_of(field) - dipole.angle);
                    acc.torque[i] += dipole.strength * diff.sin() * gain;
                }
            }

            ForceLaw::DipoleDipole {
                cutoff,
                coupling,
                filter,
            } => {
                let members: Vec<usize> = bodies
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.dipole.is_some() && filter.matches(b))
                    .map(|(i, _)| i)
                    .collect();
                let points: Vec<DVec2> = members.iter().map(|&i| bodies[i].pos).collect();

                for (a, b) in pairs_within(&points, *cutoff) {
                    let (i, j) = (members[a], members[b]);
                    let (Some(di), Some(dj)) = (bodies[i].dipole, bodies[j].dipole) else {
                        continue;
                    };
                    let Some(sep) = separation(bodies[i].pos, bodies[j].pos) else {
                        continue;
                    };
                    if sep.distance_sq < FIELD_MIN_DISTANCE_SQ {
                        continue;
                    }
                    let dot1 = sep.normal.dot(unit_from_angle(di.angle));
                    let dot2 = sep.normal.dot(unit_from_angle(dj.angle));
                    let strength = (3.0 * dot1 * dot2 - (di.angle - dj.angle).cos())
                        / (sep.distance_sq * sep.distance)
                        * di.strength
                        * dj.strength
                        * coupling;
                    let f = sep.normal * strength;
                    acc.force[i] += f;
                    acc.force[j] -= f;
                }
            }

            ForceLaw::Wind {
                strength,
                direction,
                filter,
            } => {
                let Some(dir) = unit(*direction) else { return };
                for (i, body) in bodies.iter().enumerate() {
                    if filter.matches(body) {
                        let width = 2.0 * body.radius;
                        acc.force[i] += dir * (strength * width * width / 1000.0);
                    }
                }
            }

            ForceLaw::Pendulum {
                gravity,
                drag,
                filter,
            } => {
                for (i, body) in bodies.iter().enumerate() {
                    let (Some(angular), Some(tether)) = (body.angular, body.tether) else {
                        continue;
                    };
                    if !filter.matches(body) {
                        continue;
                    }
                    let alpha = -gravity / tether.length * angular.angle.sin() - drag * angular.angular_vel;
                    acc.torque[i] += angular.inertia * alpha;
                }
            }

            ForceLaw::DoublePendulum {
                gravity,
                upper,
                lower,
            } => {
                let Some(i) = bodies.iter().position(|b| b.tag == *upper) else {
                    return;
                };
                let Some(j) = bodies.iter().position(|b| b.tag == *lower) else {
                    return;
                };
                if let Some((alpha1, alpha2)) = double_pendulum_accel(&bodies[i], &bodies[j], *gravity) {
                    if let Some(a) = bodies[i].angular {
                        acc.torque[i] += a.inertia * alpha1;
                    }
                    if let Some(a) = bodies[j].angular {
                        acc.torque[j] += a.inertia * alpha2;
                    }
                }
            }
        }
    }
}

/// Force on `a` from `b`, or `None` when the circles overlap or coincide
#[inline]
fn gravity_between(a: &Body, b: &Body, g_const: f64) -> Option<DVec2> {
    let sep = separation(a.pos, b.pos)?;
    // Overlapping bodies are the collision resolver's business
    if sep.distance < a.radius + b.radius {
        return None;
    }
    Some(sep.normal * (g_const * a.mass * b.mass / sep.distance_sq))
}

/// Angular accelerations of a double pendulum (upper, lower)
fn double_pendulum_accel(upper: &Body, lower: &Body, g: f64) -> Option<(f64, f64)> {
    let (a1, t1) = (upper.angular?, upper.tether?);
    let (a2, t2) = (lower.angular?, lower.tether?);
    if !matches!(t2.pivot, Pivot::Body(id) if id == upper.id) {
        return None;
    }
    let (m1, m2) = (upper.mass, lower.mass);
    let (l1, l2) = (t1.length, t2.length);
    let (th1, th2) = (a1.angle, a2.angle);
    let (w1, w2) = (a1.angular_vel, a2.angular_vel);

    let common = 2.0 * m1 + m2 - m2 * (2.0 * th1 - 2.0 * th2).cos();
    let den1 = l1 * common;
    let den2 = l2 * common;
    if den1.abs() < f64::EPSILON || den2.abs() < f64::EPSILON {
        return None;
    }

    let delta = th1 - th2;
    let alpha1 = (-g * (2.0 * m1 + m2) * th1.sin()
        - m2 * g * (th1 - 2.0 * th2).sin()
        - 2.0 * delta.sin() * m2 * (w2 * w2 * l2 + w1 * w1 * l1 * delta.cos()))
        / den1;
    let alpha2 = 2.0
        * delta.sin()
        * (w1 * w1 * l1 * (m1 + m2) + g * (m1 + m2) * th1.cos() + w2 * w2 * l2 * m2 * delta.cos())
        / den2;
    Some((alpha1, alpha2))
}
