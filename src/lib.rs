//! Physics Toybox - a deterministic 2D particle/force simulation core
//!
//! Core modules:
//! - `sim`: Fixed-timestep simulation (force laws, integration, collisions, world)
//! - `scenario`: Declarative scenario bundles and the built-in demo presets
//!
//! Rendering, windowing and input live outside this crate: a presentation layer
//! calls [`sim::World::step`], reads [`sim::Snapshot`]s and forwards user intents
//! as [`sim::Command`]s between ticks.

pub mod scenario;
pub mod sim;

pub use scenario::{Scenario, ScenarioKind};
pub use sim::{Body, BodyId, Command, ForceLaw, Snapshot, World};

use glam::DVec2;

/// Tuned defaults shared by scenarios and the simulation core
pub mod consts {
    /// Default fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum ticks issued per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame time the stepper accepts (seconds)
    pub const MAX_FRAME_TIME: f64 = 0.1;

    /// Vertical speed below which a floor-resting body settles
    pub const SETTLE_SPEED: f64 = 0.5;
    /// Per-tick horizontal velocity factor for settled bodies
    pub const SETTLE_HORIZONTAL_DECAY: f64 = 0.95;

    /// Dipole-dipole interaction cutoff distance (cutoff² = 100 in the filings demo)
    pub const DIPOLE_CUTOFF: f64 = 10.0;
    /// Dipole-dipole coupling scale
    pub const DIPOLE_COUPLING: f64 = 0.01;
    /// Field strength is evaluated with r² clamped to at least this value
    pub const FIELD_MIN_DISTANCE_SQ: f64 = 1.0;

    /// Distances below this are treated as coincident
    pub const DEGENERATE_DISTANCE: f64 = 1e-9;

    /// Cap on correction passes for overlapping circles
    pub const POSITION_ITERATIONS: usize = 256;
    /// Overlap below this counts as resolved
    pub const OVERLAP_SLOP: f64 = 1e-9;
    /// A body this close to a wall counts as resting against it
    pub const WALL_CONTACT_SLOP: f64 = 1e-9;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    angle = angle.rem_euclid(TAU);
    if angle >= PI {
        angle -= TAU;
    }
    angle
}

/// Unit vector at angle `theta` (radians, measured from +x toward +y)
#[inline]
pub fn unit_from_angle(theta: f64) -> DVec2 {
    DVec2::new(theta.cos(), theta.sin())
}

/// Angle of a vector (radians, atan2 convention)
#[inline]
pub fn angle_of(v: DVec2) -> f64 {
    v.y.atan2(v.x)
}
