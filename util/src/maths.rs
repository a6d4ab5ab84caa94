//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::AddAssign
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Wrap an angle in radians into the range [-pi, pi].
///
/// Subtracting a heading from an atan2 bearing can leave the principal
/// range. Wrapping brings a goal just clockwise of the heading back to a
/// small negative angle rather than a near-2pi positive one.
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float + std::ops::Rem
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(angle + pi_t, tau_t) - pi_t
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
/// This result is not an element of the function's codomain, but it is the
/// closest floating point number in the real numbers and thus fulfills the
/// property `self == self.div_euclid(rhs) * rhs + self.rem_euclid(rhs)`
/// approximatively.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::Sub + std::ops::Rem
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_wrap_to_pi() {
        assert!((wrap_to_pi(0f64)).abs() < 1e-12);
        assert!((wrap_to_pi(PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_to_pi(-PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_to_pi(TAU - 0.1) + 0.1).abs() < 1e-12);
        assert!((wrap_to_pi(-TAU + 0.1) - 0.1).abs() < 1e-12);
        assert!((wrap_to_pi(2.5 * PI) - 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 1f64), (0f64, 10f64), 0.5), 5f64);
        assert_eq!(lin_map((-1f64, 1f64), (0f64, 1f64), 0f64), 0.5);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&1.5f64, &0f64, &1f64), 1f64);
        assert_eq!(clamp(&-0.5f64, &0f64, &1f64), 0f64);
        assert_eq!(clamp(&0.5f64, &0f64, &1f64), 0.5f64);
    }
}
