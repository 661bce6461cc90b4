//! Read-only world state for the presentation layer

use bytemuck::{Pod, Zeroable};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, BodyTag};

/// One body as the presentation layer sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyView {
    pub id: BodyId,
    pub pos: DVec2,
    pub radius: f64,
    /// Dipole orientation for dipole bodies, else the rotation angle if any
    pub angle: Option<f64>,
    pub tag: BodyTag,
    pub color: u32,
}

impl From<&Body> for BodyView {
    fn from(body: &Body) -> Self {
        let angle = body
            .dipole
            .map(|d| d.angle)
            .or_else(|| body.angular.map(|a| a.angle));
        Self {
            id: body.id,
            pos: body.pos,
            radius: body.radius,
            angle,
            tag: body.tag,
            color: body.color,
        }
    }
}

/// Scalar readouts computed once per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub elapsed: f64,
    pub kinetic_energy: f64,
    /// Mass-weighted centre of all bodies; `None` for an empty world
    pub center_of_mass: Option<DVec2>,
    /// How centred the centre of mass is over the lowest bodies, in [0, 1]
    pub stability: Option<f64>,
}

impl Telemetry {
    /// `stability_base` is how many of the lowest bodies form the base
    pub fn measure(bodies: &[Body], elapsed: f64, stability_base: Option<usize>) -> Self {
        let center_of_mass = center_of_mass(bodies);
        let stability = stability_base.map(|n| match center_of_mass {
            Some(com) => stability_index(bodies, com, n),
            None => 1.0,
        });
        Self {
            elapsed,
            kinetic_energy: bodies.iter().map(Body::kinetic_energy).sum(),
            center_of_mass,
            stability,
        }
    }
}

pub fn center_of_mass(bodies: &[Body]) -> Option<DVec2> {
    let total: f64 = bodies.iter().map(|b| b.mass).sum();
    if bodies.is_empty() || total <= 0.0 {
        return None;
    }
    let weighted: DVec2 = bodies.iter().map(|b| b.pos * b.mass).sum();
    Some(weighted / total)
}

/// `max(0, 1 - 2·|com_x - base_center| / base_width)` over the `base` bodies
/// with the largest y (screen coordinates: lowest on screen)
///
/// An empty body set is perfectly stable; a zero-width base is not.
pub fn stability_index(bodies: &[Body], com: DVec2, base: usize) -> f64 {
    if bodies.is_empty() {
        return 1.0;
    }
    let mut order: Vec<&Body> = bodies.iter().collect();
    order.sort_by(|a, b| b.pos.y.total_cmp(&a.pos.y));
    let lowest = &order[..base.min(order.len())];
    if lowest.is_empty() {
        return 0.0;
    }

    let left = lowest.iter().map(|b| b.pos.x - b.radius).fold(f64::INFINITY, f64::min);
    let right = lowest.iter().map(|b| b.pos.x + b.radius).fold(f64::NEG_INFINITY, f64::max);
    let width = right - left;
    if !(width > 0.0) {
        return 0.0;
    }
    let center = (left + right) / 2.0;
    (1.0 - 2.0 * (com.x - center).abs() / width).max(0.0)
}

/// Immutable state published at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub elapsed: f64,
    pub bodies: Vec<BodyView>,
    pub telemetry: Telemetry,
}

impl Snapshot {
    pub fn capture(bodies: &[Body], tick: u64, elapsed: f64, stability_base: Option<usize>) -> Self {
        Self {
            tick,
            elapsed,
            bodies: bodies.iter().map(BodyView::from).collect(),
            telemetry: Telemetry::measure(bodies, elapsed, stability_base),
        }
    }

    pub fn body(&self, id: BodyId) -> Option<&BodyView> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// GPU-ready per-body instance data, in body order
    pub fn instances(&self) -> Vec<BodyInstance> {
        self.bodies.iter().map(BodyInstance::from).collect()
    }
}

/// Per-instance vertex data for drawing bodies as circles
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BodyInstance {
    pub pos: [f32; 2],
    pub radius: f32,
    pub angle: f32,
    pub color: [f32; 4],
}

/// 0xRRGGBB to RGBA floats with alpha 1
pub fn color_to_rgba(color: u32) -> [f32; 4] {
    let channel = |shift: u32| ((color >> shift) & 0xFF) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

impl From<&BodyView> for BodyInstance {
    fn from(view: &BodyView) -> Self {
        Self {
            pos: view.pos.as_vec2().to_array(),
            radius: view.radius as f32,
            angle: view.angle.unwrap_or(0.0) as f32,
            color: color_to_rgba(view.color),
        }
    }
}
