use uom::si::f64::Length;
use uom::si::length::meter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A reference ellipsoid of revolution, defined by its two semi-axes.
///
/// Everything else (eccentricity, flattening, radii of curvature) is derived from `a` and `b` on
/// demand so that the published axis lengths remain the single source of truth.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ellipsoid {
    #[doc(alias = "equatorial radius")]
    pub(crate) a: f64,
    #[doc(alias = "polar radius")]
    pub(crate) b: f64,
}

/// The [Airy 1830] ellipsoid that OSGB36 (and thus the British National Grid) is defined on.
///
/// [Airy 1830]: https://www.ordnancesurvey.co.uk/documents/resources/guide-coordinate-systems-great-britain.pdf
pub const AIRY_1830: Ellipsoid = Ellipsoid::new(6_377_563.396, 6_356_256.909);

/// The WGS84 ellipsoid.
///
/// The semi-minor axis is the one derived from `1/f = 298.257223563`, truncated to the precision
/// the Ordnance Survey publishes it at.
// https://nsgreg.nga.mil/doc/view?i=4085 table 3.1
pub const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 6_356_752.314_245);

impl Ellipsoid {
    /// Defines an ellipsoid from its semi-major and semi-minor axes, in meters.
    #[must_use]
    pub const fn new(semi_major_axis: f64, semi_minor_axis: f64) -> Self {
        Self {
            a: semi_major_axis,
            b: semi_minor_axis,
        }
    }

    #[must_use]
    pub fn semi_major_axis(&self) -> Length {
        Length::new::<meter>(self.a)
    }

    #[must_use]
    pub fn semi_minor_axis(&self) -> Length {
        Length::new::<meter>(self.b)
    }

    /// `f = (a - b) / a`
    #[must_use]
    pub fn flattening(&self) -> f64 {
        (self.a - self.b) / self.a
    }

    /// `e² = 1 - b²/a²`
    #[doc(alias = "e^2")]
    #[must_use]
    pub fn eccentricity_sq(&self) -> f64 {
        1. - self.b.powi(2) / self.a.powi(2)
    }

    /// `n = (a - b) / (a + b)`, the parameter the meridional arc series is expanded in.
    #[doc(alias = "n")]
    #[must_use]
    pub fn third_flattening(&self) -> f64 {
        (self.a - self.b) / (self.a + self.b)
    }

    /// Radius of curvature in the prime vertical (ν) at the given latitude, in meters.
    ///
    /// `scale` multiplies the semi-major axis; it is the central meridian scale factor when working
    /// in a projection and `1.0` otherwise.
    pub(crate) fn transverse_radius(&self, scale: f64, lat_phi: f64) -> f64 {
        let sin_phi = lat_phi.sin();
        self.a * scale / (1. - self.eccentricity_sq() * sin_phi.powi(2)).sqrt()
    }

    /// Meridional radius of curvature (ρ) at the given latitude, in meters.
    pub(crate) fn meridional_radius(&self, scale: f64, lat_phi: f64) -> f64 {
        let e2 = self.eccentricity_sq();
        let sin_phi = lat_phi.sin();
        self.a * scale * (1. - e2) / (1. - e2 * sin_phi.powi(2)).powf(1.5)
    }

    /// Length of the meridian arc between `from_phi` and `to_phi` (radians), scaled by `scale`.
    ///
    /// This is the truncated series in `n` from the Ordnance Survey's guide; it is exact to well
    /// below a millimeter over the extent of Great Britain.
    pub(crate) fn meridional_arc(&self, scale: f64, from_phi: f64, to_phi: f64) -> f64 {
        let n = self.third_flattening();
        let n2 = n * n;
        let n3 = n2 * n;
        let diff = to_phi - from_phi;
        let sum = to_phi + from_phi;

        self.b
            * scale
            * ((1. + n + 5. / 4. * n2 + 5. / 4. * n3) * diff
                - (3. * n + 3. * n2 + 21. / 8. * n3) * diff.sin() * sum.cos()
                + (15. / 8. * n2 + 15. / 8. * n3) * (2. * diff).sin() * (2. * sum).cos()
                - 35. / 24. * n3 * (3. * diff).sin() * (3. * sum).cos())
    }
}
