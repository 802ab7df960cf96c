use crate::datum::Datum;
use crate::error::{ConvergenceError, Solve};
use crate::geodetic::Geographic;
use crate::transform::Tolerances;
use crate::Point3;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use uom::si::angle::radian;
use uom::si::f64::Length;
use uom::si::length::meter;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in the Earth-centred, Earth-fixed Cartesian frame of datum `In`.
///
/// The axes follow the usual [ECEF] convention relative to the datum's ellipsoid:
///
/// - Positive Z is towards the North pole.
/// - Positive X is towards the prime meridian on the equator.
/// - Positive Y is towards 90°E on the equator.
///
/// Note that the _same_ physical point has different coordinates in different datums, since
/// each datum's ellipsoid sits slightly differently relative to the Earth. Moving between them
/// is what a [`Helmert`](crate::Helmert) transform is for.
///
/// <div class="warning">
///
/// This type implements `Deserialize`, but the datum of the deserialized value is _not_
/// checked, so this is a foot-gun to be mindful of.
///
/// </div>
///
/// [ECEF]: https://en.wikipedia.org/wiki/Earth-centered,_Earth-fixed_coordinate_system
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// don't require In: Serialize/Deserialize since we skip it anyway
#[cfg_attr(feature = "serde", serde(bound = ""))]
// no need for the "point": indirection
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Cartesian<In> {
    /// X, Y, Z in meters
    pub(crate) point: Point3,
    #[cfg_attr(feature = "serde", serde(skip))]
    datum: PhantomData<In>,
}

// manual impls of Clone and Copy to avoid requiring In: Copy + Clone
impl<In> Clone for Cartesian<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for Cartesian<In> {}

impl<In> PartialEq<Self> for Cartesian<In> {
    fn eq(&self, other: &Self) -> bool {
        self.point.eq(&other.point)
    }
}

impl<In> Cartesian<In> {
    pub(crate) fn from_nalgebra_point(p: Point3) -> Self {
        Self {
            point: p,
            datum: PhantomData,
        }
    }

    /// Constructs a point at the given (x, y, z) in the Earth-centred frame of `In`.
    pub fn from_cartesian(
        x: impl Into<Length>,
        y: impl Into<Length>,
        z: impl Into<Length>,
    ) -> Self {
        Self::from_nalgebra_point(Point3::new(
            x.into().get::<meter>(),
            y.into().get::<meter>(),
            z.into().get::<meter>(),
        ))
    }

    #[must_use]
    pub fn x(&self) -> Length {
        Length::new::<meter>(self.point.x)
    }

    #[must_use]
    pub fn y(&self) -> Length {
        Length::new::<meter>(self.point.y)
    }

    #[must_use]
    pub fn z(&self) -> Length {
        Length::new::<meter>(self.point.z)
    }

    /// Straight-line (chord) distance between two points in the same frame.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> Length {
        Length::new::<meter>(nalgebra::distance(&self.point, &other.point))
    }
}

impl<In> Cartesian<In>
where
    In: Datum,
{
    /// Converts latitude, longitude, and height above the ellipsoid of `In` into its Earth-centred
    /// Cartesian frame.
    ///
    /// See:
    /// <https://en.wikipedia.org/wiki/Geographic_coordinate_conversion#From_geodetic_to_ECEF_coordinates>
    #[must_use]
    pub fn from_geographic(location: &Geographic<In>, height: impl Into<Length>) -> Self {
        let ellipsoid = In::ELLIPSOID;
        let height_h = height.into().get::<meter>();
        let (lat_phi, lon_lambda) = location.radians();

        let nu = ellipsoid.transverse_radius(1., lat_phi);
        let x = (nu + height_h) * lat_phi.cos() * lon_lambda.cos();
        let y = (nu + height_h) * lat_phi.cos() * lon_lambda.sin();
        let z = ((1. - ellipsoid.eccentricity_sq()) * nu + height_h) * lat_phi.sin();

        Self::from_nalgebra_point(Point3::new(x, y, z))
    }

    /// Converts this point into latitude and longitude on the ellipsoid of `In`.
    ///
    /// Longitude falls straight out of `atan2(y, x)`. Latitude does not have a (well-behaved)
    /// closed form, so it is found by fixed-point iteration from the seed `atan2(z, p(1 - e²))`,
    /// with `p` the distance from the polar axis: each step re-evaluates the prime vertical
    /// radius of curvature ν at the current estimate and sets `φ = atan2(z + e²ν sin φ, p)`.
    /// That is exact at the true latitude for _any_ height, and contracts by roughly `e²` per
    /// step, so it settles to 1e-9 radians in two or three iterations for points anywhere near
    /// the surface.
    ///
    /// The iteration is capped at [`Tolerances::max_iterations`]; points for which it does not
    /// settle (in practice, non-finite coordinates) produce a [`ConvergenceError`].
    pub fn to_geographic(
        &self,
        tolerances: &Tolerances,
    ) -> Result<Geographic<In>, ConvergenceError> {
        let ellipsoid = In::ELLIPSOID;
        let e2 = ellipsoid.eccentricity_sq();
        let (x, y, z) = (self.point.x, self.point.y, self.point.z);
        let p = x.hypot(y);
        let tolerance = tolerances.latitude_tolerance.get::<radian>();

        let mut lat_phi = z.atan2(p * (1. - e2));
        for iteration in 1..=tolerances.max_iterations {
            let previous = lat_phi;
            let nu = ellipsoid.transverse_radius(1., lat_phi);
            lat_phi = (z + e2 * nu * lat_phi.sin()).atan2(p);

            // NOTE: written so that a NaN difference keeps iterating (and so eventually errors)
            // rather than passing as converged
            if (lat_phi - previous).abs() < tolerance {
                tracing::trace!(
                    iterations = iteration,
                    datum = In::NAME,
                    "geodetic latitude converged"
                );
                return Ok(Geographic::from_radians_unchecked(lat_phi, y.atan2(x)));
            }
        }

        tracing::debug!(
            x,
            y,
            z,
            datum = In::NAME,
            "geodetic latitude did not converge"
        );
        Err(ConvergenceError {
            solve: Solve::GeodeticLatitude,
            iterations: tolerances.max_iterations,
        })
    }

    /// Height of this point above the ellipsoid of `In`, measured along the normal through
    /// `location`.
    ///
    /// `location` should be this point's own [`to_geographic`](Self::to_geographic); this is the
    /// `p cos φ + z sin φ - a²/ν` form, which is insensitive to small latitude errors and
    /// well-behaved at the poles.
    #[must_use]
    pub fn ellipsoidal_height(&self, location: &Geographic<In>) -> Length {
        let ellipsoid = In::ELLIPSOID;
        let (lat_phi, _) = location.radians();
        let p = self.point.x.hypot(self.point.y);
        let nu = ellipsoid.transverse_radius(1., lat_phi);

        Length::new::<meter>(
            p * lat_phi.cos() + self.point.z * lat_phi.sin() - ellipsoid.a.powi(2) / nu,
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> AbsDiffEq<Self> for Cartesian<In> {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        // NOTE: in meters; the datum shift itself is only good to a few meters
        Length::new::<meter>(0.01)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        // NOTE: this checks each axis separately, not the magnitude of the difference
        self.point.abs_diff_eq(&other.point, epsilon.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> RelativeEq for Cartesian<In> {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(Point3::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.point.relative_eq(
            &other.point,
            epsilon.get::<meter>(),
            max_relative.get::<meter>(),
        )
    }
}

impl<In> Display for Cartesian<In>
where
    In: Datum,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(3);
        write!(
            f,
            "({:.precision$}, {:.precision$}, {:.precision$}) m in {}",
            self.point.x,
            self.point.y,
            self.point.z,
            In::NAME
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Cartesian;
    use crate::datum::{Osgb36, Wgs84};
    use crate::error::Solve;
    use crate::geodetic::Geographic;
    use crate::transform::Tolerances;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::{quickcheck, Arbitrary};
    use rstest::rstest;
    use uom::si::f64::Length;
    use uom::si::length::meter;

    fn m(meters: f64) -> Length {
        Length::new::<meter>(meters)
    }

    /// A location somewhere on (or a little above or below) the WGS84 ellipsoid.
    #[derive(Debug, Clone, Copy)]
    struct Surface {
        location: Geographic<Wgs84>,
        height: f64,
    }

    impl Arbitrary for Surface {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            // quickcheck will give us awkward f64 values -- we ignore those
            let mut finite = || loop {
                let f = <f64 as Arbitrary>::arbitrary(g);
                if f == 0. || f.is_normal() {
                    break f;
                }
            };
            let (latitude, longitude, height) = (finite(), finite(), finite());
            Self {
                // stay a hair off the poles, where longitude stops meaning anything
                location: Geographic::from_degrees(
                    latitude.rem_euclid(179.8) - 89.9,
                    longitude.rem_euclid(360.) - 180.,
                )
                .expect("latitude is in [-90, 90]"),
                height: height.rem_euclid(50_000.) - 10_000.,
            }
        }
    }

    fn try_geographic_cartesian_roundtrip(Surface { location, height }: Surface) {
        let cartesian = Cartesian::<Wgs84>::from_geographic(&location, m(height));

        // check against an independent implementation
        let expected = nav_types::ECEF::from(nav_types::WGS84::from_degrees_and_meters(
            location.latitude_degrees(),
            location.longitude_degrees(),
            height,
        ));
        assert_relative_eq!(
            cartesian,
            Cartesian::from_cartesian(m(expected.x()), m(expected.y()), m(expected.z())),
            epsilon = m(0.001)
        );

        let back = cartesian
            .to_geographic(&Tolerances::default())
            .expect("converges near the surface");
        assert_relative_eq!(back, location);
        assert_abs_diff_eq!(
            cartesian.ellipsoidal_height(&back).get::<meter>(),
            height,
            epsilon = 0.001
        );
    }

    quickcheck! {
        fn geographic_cartesian_roundtrip(surface: Surface) -> () {
            try_geographic_cartesian_roundtrip(surface);
        }
    }

    // also, stress test known problematic things
    #[rstest]
    #[case(0., 0., 0.)]
    #[case(0., 180., 1000.)]
    #[case(0., -90., -1000.)]
    #[case(89.9, 0., 0.)]
    #[case(-89.9, 179.9, 0.)]
    #[case(55.948_6, -3.199_9, 130.)]
    fn hard_geographic_to_cartesian(#[case] lat: f64, #[case] lon: f64, #[case] height: f64) {
        try_geographic_cartesian_roundtrip(Surface {
            location: Geographic::from_degrees(lat, lon).expect("lat in [-90,90]"),
            height,
        });
    }

    #[test]
    fn poles_and_centre_do_not_hang() {
        let tolerances = Tolerances::default();
        let north = Cartesian::<Wgs84>::from_cartesian(m(0.), m(0.), m(6_356_752.314_245));
        let location = north.to_geographic(&tolerances).unwrap();
        assert_relative_eq!(location.latitude_degrees(), 90., epsilon = 1e-9);
        assert_abs_diff_eq!(north.ellipsoidal_height(&location).get::<meter>(), 0., epsilon = 1e-6);

        let centre = Cartesian::<Wgs84>::from_cartesian(m(0.), m(0.), m(0.));
        assert!(centre.to_geographic(&tolerances).is_ok());
    }

    #[test]
    fn non_finite_points_fail_to_converge() {
        let nowhere = Cartesian::<Osgb36>::from_cartesian(m(f64::NAN), m(1.), m(1.));
        let err = nowhere
            .to_geographic(&Tolerances::default())
            .expect_err("NaN never converges");
        assert_eq!(err.solve(), Solve::GeodeticLatitude);
        assert_eq!(err.iterations(), Tolerances::default().max_iterations);
    }

    #[test]
    fn known_wgs84_to_cartesian() {
        for (wgs, xyz) in [
            ((0., 0., 0.), (6_378_137., 0., 0.)),
            (
                // Mt. Fuji
                (35.3619, 138.7280, 2294.0),
                (-3_915_138.118_709_466, 3_436_144.354_064_903, 3_672_011.028_417_511),
            ),
        ] {
            let (lat, lon, height) = wgs;
            let (x, y, z) = xyz;
            let location = Geographic::<Wgs84>::from_degrees(lat, lon).unwrap();
            assert_relative_eq!(
                Cartesian::<Wgs84>::from_geographic(&location, m(height)),
                Cartesian::from_cartesian(m(x), m(y), m(z)),
            );
        }
    }

    #[test]
    fn display() {
        let point = Cartesian::<Osgb36>::from_cartesian(
            m(3_874_938.849),
            m(116_218.624),
            m(5_047_168.208),
        );
        insta::assert_snapshot!(point, @"(3874938.849, 116218.624, 5047168.208) m in Osgb36");
        insta::assert_snapshot!(format!("{point:.0}"), @"(3874939, 116219, 5047168) m in Osgb36");
    }
}
