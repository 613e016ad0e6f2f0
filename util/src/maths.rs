//! Utility maths functions

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Degrees in one full turn.
pub const FULL_TURN_DEG: f64 = 360.0;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Wrap an angle in degrees into the range [0, 360).
///
/// The angle is brought into range by repeatedly adding or subtracting a full turn, so an angle
/// several turns out of range takes several steps. Callers must keep the angle within a bounded
/// number of turns. Non-finite angles wrap to 0.
pub fn wrap_deg_360(angle_deg: f64) -> f64 {
    if !angle_deg.is_finite() {
        return 0.0;
    }

    let mut wrapped = angle_deg;

    while wrapped >= FULL_TURN_DEG {
        wrapped -= FULL_TURN_DEG;
    }
    while wrapped < 0.0 {
        wrapped += FULL_TURN_DEG;
    }

    // A tiny negative value plus a full turn can round up to exactly 360
    if wrapped >= FULL_TURN_DEG {
        wrapped = 0.0;
    }

    wrapped
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wrap_deg_360() {
        assert_eq!(wrap_deg_360(0.0), 0.0);
        assert_eq!(wrap_deg_360(360.0), 0.0);
        assert_eq!(wrap_deg_360(370.0), 10.0);
        assert_eq!(wrap_deg_360(-10.0), 350.0);
        assert_eq!(wrap_deg_360(-360.0), 0.0);
        assert_eq!(wrap_deg_360(1090.0), 10.0);
        assert_eq!(wrap_deg_360(-1090.0), 350.0);
        assert_eq!(wrap_deg_360(359.5), 359.5);
        assert_eq!(wrap_deg_360(f64::NAN), 0.0);
        assert_eq!(wrap_deg_360(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_wrap_always_in_range() {
        let angles = [
            -36_359.5, -36_000.0, -721.25, -1.0e-20, 0.0, 1.0e-20, 719.75, 36_000.0, 36_359.5,
        ];

        for a in angles.iter() {
            let w = wrap_deg_360(*a);
            assert!(w >= 0.0 && w < FULL_TURN_DEG, "{} wrapped to {}", a, w);
        }
    }
}
