//! Transverse Mercator grids and the maths to get on and off them.
//!
//! A [`ProjectionOrigin`] pins a Transverse Mercator projection to the ellipsoid of a
//! [`Datum`]: which meridian runs straight up the grid, where the false origin sits, and how much
//! the central meridian is scaled. [`ProjectionOrigin::unproject`] takes grid eastings and
//! northings back to latitude and longitude on that ellipsoid, and [`ProjectionOrigin::project`]
//! goes the other way. Both use the series published by the Ordnance Survey in _A Guide to
//! Coordinate Systems in Great Britain_ (annexe C), which are good to well below a millimeter
//! anywhere on the British National Grid.

use crate::datum::{Datum, Osgb36};
use crate::error::{ConvergenceError, Solve};
use crate::geodetic::Geographic;
use crate::grid::GridCoordinate;
use crate::transform::Tolerances;
use std::fmt;
use std::marker::PhantomData;
use uom::si::angle::{degree, radian};
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The parameters of a Transverse Mercator grid on the ellipsoid of datum `In`.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// don't require In: Serialize/Deserialize since we skip it anyway
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct ProjectionOrigin<In> {
    /// φ0, radians
    origin_lat: f64,
    /// λ0, radians
    origin_lon: f64,
    /// F0
    scale_factor: f64,
    /// E0, meters
    false_easting: f64,
    /// N0, meters
    false_northing: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    datum: PhantomData<In>,
}

/// The Ordnance Survey's [British National Grid]: true origin at 49°N 2°W on Airy 1830, shifted so
/// that all of Great Britain has positive eastings and northings.
///
/// [British National Grid]: https://en.wikipedia.org/wiki/Ordnance_Survey_National_Grid
pub const BRITISH_NATIONAL_GRID: ProjectionOrigin<Osgb36> = ProjectionOrigin {
    origin_lat: 49. * std::f64::consts::PI / 180.,
    origin_lon: -2. * std::f64::consts::PI / 180.,
    scale_factor: 0.999_601_271_7,
    false_easting: 400_000.,
    false_northing: -100_000.,
    datum: PhantomData,
};

// manual impls of Clone and Copy to avoid requiring In: Copy + Clone
impl<In> Clone for ProjectionOrigin<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for ProjectionOrigin<In> {}

impl<In> PartialEq<Self> for ProjectionOrigin<In> {
    fn eq(&self, other: &Self) -> bool {
        self.origin_lat == other.origin_lat
            && self.origin_lon == other.origin_lon
            && self.scale_factor == other.scale_factor
            && self.false_easting == other.false_easting
            && self.false_northing == other.false_northing
    }
}

impl Default for ProjectionOrigin<Osgb36> {
    fn default() -> Self {
        BRITISH_NATIONAL_GRID
    }
}

impl<In> fmt::Display for ProjectionOrigin<In>
where
    In: Datum,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transverse Mercator on {}: origin {:.6}°, {:.6}°; scale {}; false origin {} m E, {} m N",
            In::NAME,
            self.origin_lat.to_degrees(),
            self.origin_lon.to_degrees(),
            self.scale_factor,
            self.false_easting,
            self.false_northing,
        )
    }
}

impl<In> ProjectionOrigin<In> {
    /// Defines a Transverse Mercator grid.
    ///
    /// Returns `None` if the origin latitude is not within [-90°, 90°], or if the scale factor is
    /// not a positive finite number.
    #[must_use]
    pub fn build(
        Components {
            origin_latitude,
            origin_longitude,
            scale_factor,
            false_easting,
            false_northing,
        }: Components,
    ) -> Option<Self> {
        // NOTE: not using Geographic::build here, which would accept 450° as a latitude
        let origin_lat = origin_latitude.get::<radian>();
        if !(-std::f64::consts::FRAC_PI_2..=std::f64::consts::FRAC_PI_2).contains(&origin_lat) {
            return None;
        }
        if !(scale_factor.is_finite() && scale_factor > 0.) {
            return None;
        }
        Some(Self {
            origin_lat,
            origin_lon: origin_longitude.get::<radian>(),
            scale_factor,
            false_easting: false_easting.get::<meter>(),
            false_northing: false_northing.get::<meter>(),
            datum: PhantomData,
        })
    }

    /// The latitude and longitude of the true origin.
    #[must_use]
    pub fn origin(&self) -> Geographic<In> {
        Geographic::from_radians_unchecked(self.origin_lat, self.origin_lon)
    }

    /// The central meridian scale factor, F0.
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// The grid coordinate of the true origin, ie, (E0, N0).
    #[must_use]
    pub fn false_origin(&self) -> GridCoordinate {
        GridCoordinate::from_meters(self.false_easting, self.false_northing)
    }
}

impl<In> ProjectionOrigin<In>
where
    In: Datum,
{
    /// Finds the latitude and longitude on the ellipsoid of `In` that projects to `grid`.
    ///
    /// This first solves iteratively for the _foot-point_ latitude φ', the latitude on the central
    /// meridian whose meridional arc from the origin equals the northing, and then corrects for
    /// the distance off the central meridian with Redfearn's series.
    ///
    /// The solve stops once the meridional arc is within `tolerances.arc_length_tolerance` of the
    /// northing. If that takes more than `tolerances.max_iterations` steps, or the arc ever
    /// becomes non-finite (eg, for a `NaN` input), this returns an error instead. So does a
    /// solution that lands past either pole, or that the series turns non-finite, which is what
    /// northings thousands of kilometers off the grid produce.
    ///
    /// Grid coordinates merely far outside the area the grid was defined for (hundreds of
    /// kilometers off the central meridian) will still produce _an_ answer, just not a
    /// meaningful one.
    pub fn unproject(
        &self,
        grid: GridCoordinate,
        tolerances: &Tolerances,
    ) -> Result<Geographic<In>, ConvergenceError> {
        let ellipsoid = In::ELLIPSOID;
        let f0 = self.scale_factor;
        let af0 = ellipsoid.a * f0;
        let arc_target = grid.northing - self.false_northing;
        let tolerance = tolerances.arc_length_tolerance.get::<meter>();

        let mut phi = arc_target / af0 + self.origin_lat;
        let mut residual = arc_target - ellipsoid.meridional_arc(f0, self.origin_lat, phi);
        let mut iterations = 0;
        // NOTE: written this way round so that a NaN residual does not count as converged
        while !(residual.abs() < tolerance) {
            if iterations >= tolerances.max_iterations || !residual.is_finite() {
                tracing::debug!(
                    iterations,
                    residual,
                    "foot-point latitude solve did not converge"
                );
                return Err(ConvergenceError {
                    solve: Solve::FootPointLatitude,
                    iterations,
                });
            }
            phi += residual / af0;
            residual = arc_target - ellipsoid.meridional_arc(f0, self.origin_lat, phi);
            iterations += 1;
        }
        tracing::trace!(iterations, foot_point = phi, "foot-point latitude solved");

        let nu = ellipsoid.transverse_radius(f0, phi);
        let rho = ellipsoid.meridional_radius(f0, phi);
        let eta_sq = nu / rho - 1.;
        let tan_phi = phi.tan();
        let (t2, t4, t6) = (tan_phi.powi(2), tan_phi.powi(4), tan_phi.powi(6));
        let sec_phi = phi.cos().recip();

        let vii = tan_phi / (2. * rho * nu);
        let viii = tan_phi / (24. * rho * nu.powi(3)) * (5. + 3. * t2 + eta_sq - 9. * t2 * eta_sq);
        let ix = tan_phi / (720. * rho * nu.powi(5)) * (61. + 90. * t2 + 45. * t4);
        let x = sec_phi / nu;
        let xi = sec_phi / (6. * nu.powi(3)) * (nu / rho + 2. * t2);
        let xii = sec_phi / (120. * nu.powi(5)) * (5. + 28. * t2 + 24. * t4);
        let xiia = sec_phi / (5040. * nu.powi(7)) * (61. + 662. * t2 + 1320. * t4 + 720. * t6);

        let de = grid.easting - self.false_easting;
        let lat_phi = phi - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
        let lon_lambda =
            self.origin_lon + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);

        let in_range = |lat: f64| lat.abs() <= std::f64::consts::FRAC_PI_2;
        if !(in_range(phi) && in_range(lat_phi) && lon_lambda.is_finite()) {
            tracing::debug!(
                iterations,
                foot_point = phi,
                latitude = lat_phi,
                longitude = lon_lambda,
                "unprojected position is not on the ellipsoid"
            );
            return Err(ConvergenceError {
                solve: Solve::FootPointLatitude,
                iterations,
            });
        }

        Ok(Geographic::from_radians_unchecked(lat_phi, lon_lambda))
    }

    /// Projects a latitude and longitude on the ellipsoid of `In` onto the grid.
    ///
    /// This is the inverse of [`ProjectionOrigin::unproject`] to within a millimeter or so across
    /// the extent of the British National Grid.
    #[must_use]
    pub fn project(&self, location: &Geographic<In>) -> GridCoordinate {
        let ellipsoid = In::ELLIPSOID;
        let f0 = self.scale_factor;
        let (phi, lambda) = location.radians();

        let nu = ellipsoid.transverse_radius(f0, phi);
        let rho = ellipsoid.meridional_radius(f0, phi);
        let eta_sq = nu / rho - 1.;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();
        let (t2, t4) = (tan_phi.powi(2), tan_phi.powi(4));

        let i = ellipsoid.meridional_arc(f0, self.origin_lat, phi) + self.false_northing;
        let ii = nu / 2. * sin_phi * cos_phi;
        let iii = nu / 24. * sin_phi * cos_phi.powi(3) * (5. - t2 + 9. * eta_sq);
        let iiia = nu / 720. * sin_phi * cos_phi.powi(5) * (61. - 58. * t2 + t4);
        let iv = nu * cos_phi;
        let v = nu / 6. * cos_phi.powi(3) * (nu / rho - t2);
        let vi = nu / 120.
            * cos_phi.powi(5)
            * (5. - 18. * t2 + t4 + 14. * eta_sq - 58. * t2 * eta_sq);

        let dl = lambda - self.origin_lon;
        GridCoordinate::from_meters(
            self.false_easting + iv * dl + v * dl.powi(3) + vi * dl.powi(5),
            i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6),
        )
    }
}

/// Argument type for [`ProjectionOrigin::build`].
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct Components {
    /// φ0, the latitude of the true origin.
    pub origin_latitude: Angle,

    /// λ0, the longitude of the true origin and of the grid's central meridian.
    pub origin_longitude: Angle,

    /// F0, the scale factor on the central meridian.
    pub scale_factor: f64,

    /// E0, the easting of the true origin.
    pub false_easting: Length,

    /// N0, the northing of the true origin.
    pub false_northing: Length,
}

impl Default for Components {
    fn default() -> Self {
        Self {
            origin_latitude: Angle::new::<degree>(0.),
            origin_longitude: Angle::new::<degree>(0.),
            scale_factor: 1.,
            false_easting: Length::new::<meter>(0.),
            false_northing: Length::new::<meter>(0.),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Components, ProjectionOrigin, BRITISH_NATIONAL_GRID};
    use crate::datum::{Osgb36, Wgs84};
    use crate::error::Solve;
    use crate::geodetic::Geographic;
    use crate::grid::GridCoordinate;
    use crate::transform::Tolerances;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rstest::rstest;
    use uom::si::angle::degree;
    use uom::si::f64::{Angle, Length};
    use uom::si::length::meter;

    #[test]
    fn british_national_grid_constants() {
        let origin = BRITISH_NATIONAL_GRID.origin();
        assert_abs_diff_eq!(origin.latitude_degrees(), 49., epsilon = 1e-12);
        assert_abs_diff_eq!(origin.longitude_degrees(), -2., epsilon = 1e-12);
        assert_eq!(
            BRITISH_NATIONAL_GRID.false_origin(),
            GridCoordinate::from_meters(400_000., -100_000.)
        );
        assert_eq!(ProjectionOrigin::default(), BRITISH_NATIONAL_GRID);
    }

    #[test]
    fn build_matches_constant() {
        let built = ProjectionOrigin::<Osgb36>::build(Components {
            origin_latitude: Angle::new::<degree>(49.),
            origin_longitude: Angle::new::<degree>(-2.),
            scale_factor: 0.999_601_271_7,
            false_easting: Length::new::<meter>(400_000.),
            false_northing: Length::new::<meter>(-100_000.),
        })
        .expect("valid grid");
        assert_relative_eq!(
            built.origin_lat,
            BRITISH_NATIONAL_GRID.origin_lat,
            epsilon = 1e-15
        );
        assert_eq!(built.scale_factor(), BRITISH_NATIONAL_GRID.scale_factor());
    }

    #[rstest]
    #[case::latitude_too_far_north(Components { origin_latitude: Angle::new::<degree>(91.), ..Components::default() })]
    #[case::zero_scale(Components { scale_factor: 0., ..Components::default() })]
    #[case::negative_scale(Components { scale_factor: -1., ..Components::default() })]
    #[case::nan_scale(Components { scale_factor: f64::NAN, ..Components::default() })]
    fn build_rejects(#[case] components: Components) {
        assert_eq!(ProjectionOrigin::<Wgs84>::build(components), None);
    }

    #[test]
    fn unproject_true_origin() {
        let origin = BRITISH_NATIONAL_GRID
            .unproject(
                GridCoordinate::from_meters(400_000., -100_000.),
                &Tolerances::default(),
            )
            .unwrap();
        assert_abs_diff_eq!(origin.latitude_degrees(), 49., epsilon = 1e-12);
        assert_abs_diff_eq!(origin.longitude_degrees(), -2., epsilon = 1e-12);
    }

    #[test]
    fn unproject_os_worked_example() {
        // A Guide to Coordinate Systems in Great Britain, annexe C.2
        let caister = BRITISH_NATIONAL_GRID
            .unproject(
                GridCoordinate::from_meters(651_409.903, 313_177.270),
                &Tolerances::default(),
            )
            .unwrap();
        insta::assert_snapshot!(format!("{caister:#.4}"), @"52°39'27.2531\"N, 1°43'4.5177\"E");
        assert_abs_diff_eq!(caister.latitude_degrees(), 52.657_570_301_9, epsilon = 1e-9);
        assert_abs_diff_eq!(caister.longitude_degrees(), 1.717_921_580_6, epsilon = 1e-9);
    }

    #[test]
    fn project_os_worked_example() {
        let caister = Geographic::<Osgb36>::from_degrees(
            52. + 39. / 60. + 27.2531 / 3600.,
            1. + 43. / 60. + 4.5177 / 3600.,
        )
        .unwrap();
        assert_relative_eq!(
            BRITISH_NATIONAL_GRID.project(&caister),
            GridCoordinate::from_meters(651_409.903, 313_177.270),
        );
    }

    #[rstest]
    #[case::south_west_corner(0., 0.)]
    #[case::edinburgh(325_482., 673_143.)]
    #[case::trafalgar_square(530_034., 180_381.)]
    #[case::caister(651_409.903, 313_177.270)]
    #[case::hebrides(100_000., 1_000_000.)]
    #[case::shetland(450_000., 1_150_000.)]
    #[case::north_east_corner(700_000., 1_200_000.)]
    fn roundtrip(#[case] easting: f64, #[case] northing: f64) {
        let grid = GridCoordinate::from_meters(easting, northing);
        let location = BRITISH_NATIONAL_GRID
            .unproject(grid, &Tolerances::default())
            .unwrap();
        assert_relative_eq!(
            BRITISH_NATIONAL_GRID.project(&location),
            grid,
            epsilon = Length::new::<meter>(0.005)
        );
    }

    #[test]
    fn iteration_cap_is_respected() {
        let tolerances = Tolerances {
            max_iterations: 0,
            ..Tolerances::default()
        };
        let err = BRITISH_NATIONAL_GRID
            .unproject(GridCoordinate::from_meters(651_409.903, 313_177.270), &tolerances)
            .unwrap_err();
        assert_eq!(err.solve(), Solve::FootPointLatitude);
        assert_eq!(err.iterations(), 0);
    }

    #[test]
    fn nan_northing_does_not_converge() {
        let err = BRITISH_NATIONAL_GRID
            .unproject(
                GridCoordinate::from_meters(400_000., f64::NAN),
                &Tolerances::default(),
            )
            .unwrap_err();
        assert_eq!(err.solve(), Solve::FootPointLatitude);
    }

    #[rstest]
    #[case::past_the_north_pole(400_000., 6e6)]
    #[case::well_past_the_north_pole(400_000., 1.2e7)]
    #[case::past_the_south_pole(400_000., -2e7)]
    #[case::nan_easting(f64::NAN, 400_000.)]
    #[case::infinite_easting(f64::INFINITY, 400_000.)]
    fn off_the_ellipsoid_is_an_error(#[case] easting: f64, #[case] northing: f64) {
        let err = BRITISH_NATIONAL_GRID
            .unproject(
                GridCoordinate::from_meters(easting, northing),
                &Tolerances::default(),
            )
            .unwrap_err();
        assert_eq!(err.solve(), Solve::FootPointLatitude);
        assert!(err.iterations() <= Tolerances::default().max_iterations);
    }

    #[test]
    fn display() {
        insta::assert_snapshot!(
            BRITISH_NATIONAL_GRID,
            @"Transverse Mercator on Osgb36: origin 49.000000°, -2.000000°; scale 0.9996012717; false origin 400000 m E, -100000 m N"
        );
    }
}
