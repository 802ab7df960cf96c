use uom::si::angle::radian;
use uom::si::f64::Angle;

#[cfg(any(test, feature = "approx"))]
use approx::AbsDiffEq;

/// An angle that is only ever observed in a single turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BoundedAngle {
    angle: Angle,
}

impl BoundedAngle {
    pub(crate) fn new(angle: impl Into<Angle>) -> Self {
        Self {
            // NOTE: uom may store the value differently-normalized, so we normalize on output too.
            angle: Angle::new::<radian>(Self::into_bounds(angle.into())),
        }
    }

    /// Returns the angle in [0°, 360°) in radians.
    pub(crate) fn get_bounded(self) -> f64 {
        Self::into_bounds(self.angle)
    }

    fn into_bounds(angle: Angle) -> f64 {
        angle
            .get::<radian>()
            .rem_euclid(Angle::FULL_TURN.get::<radian>())
    }

    /// Returns the angle in [-180°, 180°) in radians.
    pub(crate) fn to_signed_range(self) -> f64 {
        let angle = self.get_bounded();
        if angle < Angle::HALF_TURN.get::<radian>() {
            angle
        } else {
            angle - Angle::FULL_TURN.get::<radian>()
        }
    }
}

impl<U: Into<Angle>> From<U> for BoundedAngle {
    fn from(value: U) -> Self {
        BoundedAngle::new(value)
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for BoundedAngle {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // radians; about 6mm on the ground
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        Self::new(self.angle - other.angle).to_signed_range().abs() <= epsilon
    }
}

/// Splits an unsigned angle in decimal degrees into whole degrees, whole minutes, and seconds.
///
/// Seconds that would round up to 60 at the given precision are carried into the minutes (and
/// degrees) so the result never prints as `59' 60"`.
pub(crate) fn degrees_minutes_seconds(degrees: f64, precision: usize) -> (u32, u32, f64) {
    let degrees = degrees.abs();
    let mut whole_degrees = degrees.trunc();
    let minutes = (degrees - whole_degrees) * 60.;
    let mut whole_minutes = minutes.trunc();
    let mut seconds = (minutes - whole_minutes) * 60.;

    let unit = 10f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    if (seconds * unit).round() / unit >= 60. {
        seconds = 0.;
        whole_minutes += 1.;
    }
    if whole_minutes >= 60. {
        whole_minutes = 0.;
        whole_degrees += 1.;
    }

    // truncated and non-negative, so the casts are lossless for any sensible angle
    (whole_degrees as u32, whole_minutes as u32, seconds)
}
