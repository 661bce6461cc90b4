//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Randomness only at scenario setup, never inside a tick
//! - Stable iteration order (body order, ascending index pairs)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod error;
pub mod force;
pub mod integrator;
pub mod snapshot;
pub mod spatial;
pub mod tick;
pub mod vector;
pub mod world;

pub use body::{Angular, AxisLock, Body, BodyId, BodyTag, Dipole, Pivot, Tether};
pub use collision::{Boundary, CollisionConfig, CollisionPolicy, resolve_boundary, resolve_pairs};
pub use error::{CommandError, ConfigError};
pub use force::{Accumulators, BodyFilter, ForceLaw, ForceLawKind, Magnet};
pub use integrator::SettlingConfig;
pub use snapshot::{BodyInstance, BodyView, Snapshot, Telemetry};
pub use tick::tick;
pub use world::{Command, CommandStatus, LawSlot, Stepper, World};
