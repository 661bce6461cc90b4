//! Error types for scenario construction and world commands

use thiserror::Error;

use super::body::BodyId;
use super::force::ForceLawKind;

/// Invalid scenario or body parameters. Fatal: the world is never created.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("timestep must be positive and finite (got {0})")]
    InvalidTimestep(f64),
    #[error("body {index}: mass must be positive and finite (got {mass})")]
    InvalidMass { index: usize, mass: f64 },
    #[error("body {index}: radius must be non-negative and finite (got {radius})")]
    InvalidRadius { index: usize, radius: f64 },
    #[error("body {index}: restitution {restitution} must be between 0.0 and 1.0")]
    InvalidRestitution { index: usize, restitution: f64 },
    #[error("body {index}: damping {damping} must be between 0.0 and 1.0")]
    InvalidDamping { index: usize, damping: f64 },
    #[error("body {index}: {what} must be finite")]
    NonFiniteState { index: usize, what: &'static str },
    #[error("body {index}: moment of inertia must be positive (got {inertia})")]
    InvalidInertia { index: usize, inertia: f64 },
    #[error("body {index}: tether length must be positive (got {length})")]
    InvalidTether { index: usize, length: f64 },
    #[error("body {index}: a tethered body needs angular state")]
    TetherWithoutAngle { index: usize },
    #[error("boundary must have positive width and height (got {width} x {height})")]
    ZeroSizeBoundary { width: f64, height: f64 },
    #[error("boundary reflection {0} must be between 0.0 and 1.0")]
    InvalidReflection(f64),
    #[error("pair restitution {0} must be between 0.0 and 1.0")]
    InvalidPairRestitution(f64),
    #[error("force law {index} ({kind}): {reason}")]
    InvalidForceLaw {
        index: usize,
        kind: ForceLawKind,
        reason: &'static str,
    },
    #[error("magnet {index}: {reason}")]
    InvalidMagnet { index: usize, reason: &'static str },
    #[error("settling: {0}")]
    InvalidSettling(&'static str),
    #[error("generator {index}: {reason}")]
    InvalidGenerator { index: usize, reason: &'static str },
    #[error("unknown scenario preset `{0}`")]
    UnknownPreset(String),
    #[error("scenario parse error: {0}")]
    Parse(String),
}

/// A command that could not be applied. The world is left unchanged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandError {
    #[error("no body with id {0}")]
    UnknownBody(BodyId),
    #[error("no {0} force law in this world")]
    UnknownForceLaw(ForceLawKind),
    #[error("no magnet at index {0}")]
    UnknownMagnet(usize),
    #[error("rejected body: {0}")]
    InvalidBody(ConfigError),
    #[error("impulse must be finite")]
    NonFiniteImpulse,
    #[error("wind strength must be finite")]
    NonFiniteWind,
}
