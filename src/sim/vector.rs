//! 2D vector helpers with degenerate-case guards
//!
//! `glam::DVec2` does the arithmetic; these helpers add the checks the force
//! laws and collision code need before dividing by a length.

use glam::DVec2;

use crate::consts::DEGENERATE_DISTANCE;

/// Separation between two points, with its length and unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    /// `to - from`
    pub delta: DVec2,
    /// Squared length of `delta`
    pub distance_sq: f64,
    /// Length of `delta`
    pub distance: f64,
    /// `delta / distance`
    pub normal: DVec2,
}

/// Separation from `from` to `to`, or `None` when the points coincide
#[inline]
pub fn separation(from: DVec2, to: DVec2) -> Option<Separation> {
    let delta = to - from;
    let distance_sq = delta.length_squared();
    let distance = distance_sq.sqrt();
    if !(distance > DEGENERATE_DISTANCE) {
        return None;
    }
    Some(Separation {
        delta,
        distance_sq,
        distance,
        normal: delta / distance,
    })
}

/// Unit vector along `v`, or `None` for zero-length (or non-finite) input
#[inline]
pub fn unit(v: DVec2) -> Option<DVec2> {
    let len = v.length();
    if len > DEGENERATE_DISTANCE && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Rescale `v` to `magnitude`, keeping its direction (zero stays zero)
#[inline]
pub fn with_magnitude(v: DVec2, magnitude: f64) -> DVec2 {
    unit(v).map_or(DVec2::ZERO, |n| n * magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separation_coincident_points() {
        assert!(separation(DVec2::new(3.0, 4.0), DVec2::new(3.0, 4.0)).is_none());
    }

    #[test]
    fn test_separation_values() {
        let sep = separation(DVec2::ZERO, DVec2::new(3.0, 4.0)).unwrap();
        assert_eq!(sep.distance_sq, 25.0);
        assert!((sep.distance - 5.0).abs() < 1e-12);
        assert!((sep.normal - DVec2::new(0.6, 0.8)).length() < 1e-12);
    }

    #[test]
    fn test_unit_guards_zero() {
        assert!(unit(DVec2::ZERO).is_none());
        assert!(unit(DVec2::new(f64::NAN, 1.0)).is_none());
        assert_eq!(with_magnitude(DVec2::ZERO, 5.0), DVec2::ZERO);
        assert!((with_magnitude(DVec2::new(0.0, 2.0), 5.0) - DVec2::new(0.0, 5.0)).length() < 1e-12);
    }
}
