//! Collision detection and response
//!
//! Two independent checks per tick, neither keeping contact state between ticks:
//! - bodies against the axis-aligned world boundary (clamp, then reflect the
//!   normal velocity component scaled by restitution)
//! - circle against circle, resolved in ascending `(i, j)` order with one of
//!   the selectable [`CollisionPolicy`] strategies
//!
//! A body resting against a wall is immovable toward that wall during pair
//! resolution, so stacks push their weight into the floor instead of through it.

use glam::DVec2;
use log::trace;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::error::ConfigError;
use super::spatial::pairs_within;
use super::vector::separation;

use crate::consts::{OVERLAP_SLOP, POSITION_ITERATIONS, WALL_CONTACT_SLOP};

/// Axis-aligned world bounds (screen coordinates: the floor is `max.y`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub min: DVec2,
    pub max: DVec2,
    /// Per-axis reflection coefficient, multiplied with the body's restitution
    #[serde(default = "default_reflect")]
    pub reflect: DVec2,
    /// Whether `min.y` is a wall too
    #[serde(default)]
    pub ceiling: bool,
}

fn default_reflect() -> DVec2 {
    DVec2::ONE
}

impl Boundary {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self {
            min,
            max,
            reflect: DVec2::ONE,
            ceiling: false,
        }
    }

    pub fn with_ceiling(mut self) -> Self {
        self.ceiling = true;
        self
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = (self.width(), self.height());
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(ConfigError::ZeroSizeBoundary { width, height });
        }
        for r in [self.reflect.x, self.reflect.y] {
            if !(0.0..=1.0).contains(&r) {
                return Err(ConfigError::InvalidReflection(r));
            }
        }
        Ok(())
    }

    /// True when the body's lower edge touches or passes the floor
    #[inline]
    pub fn on_floor(&self, body: &Body) -> bool {
        body.pos.y + body.radius >= self.max.y
    }

    /// Whether moving `body` along `dir` would push it into a wall it already touches
    pub fn blocks(&self, body: &Body, dir: DVec2) -> bool {
        let r = body.radius;
        (dir.y > 0.0 && body.pos.y + r >= self.max.y - WALL_CONTACT_SLOP)
            || (self.ceiling && dir.y < 0.0 && body.pos.y - r <= self.min.y + WALL_CONTACT_SLOP)
            || (dir.x < 0.0 && body.pos.x - r <= self.min.x + WALL_CONTACT_SLOP)
            || (dir.x > 0.0 && body.pos.x + r >= self.max.x - WALL_CONTACT_SLOP)
    }

    /// Move `body` back inside without touching its velocity
    pub fn clamp(&self, body: &mut Body) {
        if body.pinned || body.tether.is_some() {
            return;
        }
        let r = body.radius;
        if body.pos.y + r > self.max.y {
            body.pos.y = self.max.y - r;
        } else if self.ceiling && body.pos.y - r < self.min.y {
            body.pos.y = self.min.y + r;
        }
        if body.pos.x - r < self.min.x {
            body.pos.x = self.min.x + r;
        } else if body.pos.x + r > self.max.x {
            body.pos.x = self.max.x - r;
        }
    }
}

/// Walls a body touched during boundary resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallHits {
    pub floor: bool,
    pub ceiling: bool,
    pub left: bool,
    pub right: bool,
}

impl WallHits {
    pub fn any(&self) -> bool {
        self.floor || self.ceiling || self.left || self.right
    }
}

/// Reflect one velocity component off a wall whose inward normal sign is `into`
///
/// Only a component moving into the wall is reflected, so a body that stays
/// clamped against a wall is not bounced again every tick.
#[inline]
fn reflect_component(v: f64, into_wall: f64, coefficient: f64) -> f64 {
    if v * into_wall > 0.0 { -v * coefficient } else { v }
}

/// Clamp `body` inside `boundary` and reflect its velocity off any wall it crossed
///
/// Floor, ceiling and side walls are independent checks; a corner hit fires two.
pub fn resolve_boundary(body: &mut Body, boundary: &Boundary) -> WallHits {
    let mut hits = WallHits::default();
    if body.pinned || body.tether.is_some() {
        return hits;
    }
    let r = body.radius;
    let ex = body.restitution * boundary.reflect.x;
    let ey = body.restitution * boundary.reflect.y;

    if body.pos.y + r >= boundary.max.y {
        body.pos.y = boundary.max.y - r;
        body.vel.y = reflect_component(body.vel.y, 1.0, ey);
        hits.floor = true;
    } else if boundary.ceiling && body.pos.y - r <= boundary.min.y {
        body.pos.y = boundary.min.y + r;
        body.vel.y = reflect_component(body.vel.y, -1.0, ey);
        hits.ceiling = true;
    }

    if body.pos.x - r <= boundary.min.x {
        body.pos.x = boundary.min.x + r;
        body.vel.x = reflect_component(body.vel.x, -1.0, ex);
        hits.left = true;
    } else if body.pos.x + r >= boundary.max.x {
        body.pos.x = boundary.max.x - r;
        body.vel.x = reflect_component(body.vel.x, 1.0, ex);
        hits.right = true;
    }

    hits
}

/// How overlapping circle pairs are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Bodies pass through each other
    #[default]
    None,
    /// Equal-mass exchange of the normal velocity components; no position correction
    VelocityExchange,
    /// Mass-weighted exchange of normal components, then the pair is pushed
    /// apart by half the overlap each
    Elastic,
}

/// Pairwise collision settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionConfig {
    #[serde(default)]
    pub policy: CollisionPolicy,
    /// Restitution between two circles, in [0, 1]
    #[serde(default = "default_pair_restitution")]
    pub pair_restitution: f64,
    /// Upper bound on correction passes after the first; passes stop as soon
    /// as every overlap is within `OVERLAP_SLOP`
    #[serde(default = "default_position_iterations")]
    pub position_iterations: usize,
}

fn default_pair_restitution() -> f64 {
    1.0
}

fn default_position_iterations() -> usize {
    POSITION_ITERATIONS
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            policy: CollisionPolicy::None,
            pair_restitution: default_pair_restitution(),
            position_iterations: default_position_iterations(),
        }
    }
}

impl CollisionConfig {
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.pair_restitution) {
            return Err(ConfigError::InvalidPairRestitution(self.pair_restitution));
        }
        Ok(())
    }
}

/// Overlap between two circles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector from the first body's center toward the second's
    pub normal: DVec2,
    /// `r_a + r_b - distance`, positive while overlapping
    pub penetration: f64,
}

#[inline]
fn collides(body: &Body) -> bool {
    body.radius > 0.0 && body.tether.is_none()
}

/// Overlap of `a` and `b`, if any
///
/// Coincident centers are reported as no contact: there is no normal to push
/// along, and the pair is left for a later tick to separate.
pub fn pair_contact(a: &Body, b: &Body) -> Option<Contact> {
    if !collides(a) || !collides(b) || (a.pinned && b.pinned) {
        return None;
    }
    let reach = a.radius + b.radius;
    if a.pos.distance_squared(b.pos) >= reach * reach {
        return None;
    }
    let sep = separation(a.pos, b.pos)?;
    Some(Contact {
        normal: sep.normal,
        penetration: reach - sep.distance,
    })
}

/// Weight of `body` in a pair response that would move it along `push`
///
/// Pinned bodies and bodies pressed against a wall in that direction don't move.
#[inline]
fn mobility(body: &Body, push: DVec2, bounds: Option<&Boundary>, free: f64) -> f64 {
    if body.pinned || bounds.is_some_and(|b| b.blocks(body, push)) {
        0.0
    } else {
        free
    }
}

/// Share of a pair response taken by each body
///
/// `free_a`/`free_b` are the weights of unconstrained bodies. When both bodies
/// are against walls the walls are ignored and the boundary clamp settles it.
fn shares(a: &Body, b: &Body, normal: DVec2, bounds: Option<&Boundary>, free_a: f64, free_b: f64) -> (f64, f64) {
    let (mut wa, mut wb) = (mobility(a, -normal, bounds, free_a), mobility(b, normal, bounds, free_b));
    if wa + wb <= 0.0 {
        wa = mobility(a, -normal, None, free_a);
        wb = mobility(b, normal, None, free_b);
    }
    let total = wa + wb;
    if total > 0.0 { (wa / total, wb / total) } else { (0.0, 0.0) }
}

/// Exchange normal velocity between an approaching pair
fn exchange_velocity(
    bodies: &mut [Body],
    (i, j): (usize, usize),
    contact: &Contact,
    config: &CollisionConfig,
    bounds: Option<&Boundary>,
) {
    let closing = (bodies[i].vel - bodies[j].vel).dot(contact.normal);
    if closing <= 0.0 {
        return;
    }
    let (free_a, free_b) = match config.policy {
        CollisionPolicy::Elastic => (bodies[i].inv_mass(), bodies[j].inv_mass()),
        _ => (1.0, 1.0),
    };
    let (wa, wb) = shares(&bodies[i], &bodies[j], contact.normal, bounds, free_a, free_b);
    let delta = (1.0 + config.pair_restitution) * closing;
    bodies[i].vel -= contact.normal * (delta * wa);
    bodies[j].vel += contact.normal * (delta * wb);
}

/// Push an overlapping pair apart along the normal, then keep both inside the bounds
fn separate(bodies: &mut [Body], (i, j): (usize, usize), contact: &Contact, bounds: Option<&Boundary>) {
    let (wa, wb) = shares(&bodies[i], &bodies[j], contact.normal, bounds, 1.0, 1.0);
    bodies[i].pos -= contact.normal * (contact.penetration * wa);
    bodies[j].pos += contact.normal * (contact.penetration * wb);
    if let Some(bounds) = bounds {
        bounds.clamp(&mut bodies[i]);
        bounds.clamp(&mut bodies[j]);
    }
}

fn overlapping_pairs(bodies: &[Body]) -> Vec<(usize, usize)> {
    let max_radius = bodies
        .iter()
        .filter(|b| collides(b))
        .map(|b| b.radius)
        .fold(0.0, f64::max);
    let points: Vec<DVec2> = bodies.iter().map(|b| b.pos).collect();
    // Any overlapping pair is closer than twice the largest radius
    pairs_within(&points, 2.0 * max_radius)
}

/// Resolve every overlapping circle pair; returns the number of contacts found
/// in the first pass
///
/// With `Elastic`, correction passes repeat the velocity exchange and the
/// push-apart until no overlap exceeds `OVERLAP_SLOP`, up to
/// `config.position_iterations` passes. Bodies never leave `bounds`.
pub fn resolve_pairs(bodies: &mut [Body], config: &CollisionConfig, bounds: Option<&Boundary>) -> usize {
    if config.policy == CollisionPolicy::None {
        return 0;
    }

    let mut contacts = 0;
    for pair in overlapping_pairs(bodies) {
        let Some(contact) = pair_contact(&bodies[pair.0], &bodies[pair.1]) else {
            continue;
        };
        contacts += 1;
        exchange_velocity(bodies, pair, &contact, config, bounds);
        if config.policy == CollisionPolicy::Elastic {
            separate(bodies, pair, &contact, bounds);
        }
    }

    if config.policy == CollisionPolicy::Elastic && contacts > 0 {
        let mut passes = 0;
        let mut converged = false;
        while passes < config.position_iterations {
            passes += 1;
            let mut corrected = false;
            for pair in overlapping_pairs(bodies) {
                let Some(contact) = pair_contact(&bodies[pair.0], &bodies[pair.1]) else {
                    continue;
                };
                if contact.penetration > OVERLAP_SLOP {
                    exchange_velocity(bodies, pair, &contact, config, bounds);
                    separate(bodies, pair, &contact, bounds);
                    corrected = true;
                }
            }
            if !corrected {
                converged = true;
                break;
            }
        }
        if !converged {
            trace!("Overlap correction stopped after {} passes", passes);
        }
    }

    contacts
}
