//! The full grid-to-geographic pipeline.
//!
//! Getting from a British National Grid reference to a latitude and longitude a web map will
//! accept takes four steps, each of which is available on its own elsewhere in the crate:
//!
//! 1. [unproject](ProjectionOrigin::unproject) the grid reference onto the Airy 1830 ellipsoid,
//!    giving an OSGB36 [`Geographic`];
//! 2. lift that onto the Earth-centred OSGB36 [`Cartesian`] frame (at zero height);
//! 3. move it into the WGS84 Cartesian frame with a [`Helmert`] transform;
//! 4. drop it back onto the WGS84 ellipsoid.
//!
//! [`GridTransform`] bundles these together. Its [`Default`] is the British National Grid to
//! WGS84, which is also what the free function [`transform()`] uses.

use crate::cartesian::Cartesian;
use crate::datum::{Datum, Osgb36, Wgs84};
use crate::error::{ConvergenceError, DecodeError};
use crate::geodetic::{Geographic, LonLat};
use crate::geometry::Geometry;
use crate::grid::GridCoordinate;
use crate::helmert::Helmert;
use crate::projection::{ProjectionOrigin, BRITISH_NATIONAL_GRID};
use crate::wkt;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stopping rules for the iterative solves in the pipeline.
///
/// With the `serde` feature, missing fields deserialize to their defaults, so a host application
/// can override just the one it cares about:
///
/// ```rust
/// # #[cfg(feature = "serde")] {
/// use natgrid::Tolerances;
///
/// let tolerances: Tolerances = serde_json::from_str(r#"{ "max_iterations": 10 }"#).unwrap();
/// assert_eq!(tolerances.max_iterations, 10);
/// assert_eq!(
///     tolerances.arc_length_tolerance,
///     Tolerances::default().arc_length_tolerance
/// );
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Tolerances {
    /// The most steps any one solve may take before giving up with a [`ConvergenceError`].
    pub max_iterations: usize,

    /// How close the meridional arc must get to the northing for the foot-point latitude solve to
    /// stop.
    pub arc_length_tolerance: Length,

    /// How little the latitude estimate must change between steps for the Cartesian to geodetic
    /// solve to stop.
    pub latitude_tolerance: Angle,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            // 0.01 mm
            arc_length_tolerance: Length::new::<meter>(1e-5),
            // ~6 µm on the ground
            latitude_tolerance: Angle::new::<radian>(1e-9),
        }
    }
}

/// Converts grid coordinates on a projection of datum `From` to geographic coordinates in datum
/// `To`.
///
/// ```rust
/// use natgrid::{GridCoordinate, GridTransform};
///
/// let bng: GridTransform = GridTransform::default();
/// let edinburgh_castle = bng
///     .transform(GridCoordinate::from_meters(325_482., 673_143.))
///     .expect("well within the grid");
///
/// assert!((edinburgh_castle.latitude_degrees() - 55.9486).abs() < 0.01);
/// assert!((edinburgh_castle.longitude_degrees() - -3.1999).abs() < 0.01);
/// ```
///
/// A `GridTransform` holds no state beyond its parameters, so one can be shared freely between
/// threads.
#[derive(Debug)]
pub struct GridTransform<From = Osgb36, To = Wgs84> {
    projection: ProjectionOrigin<From>,
    helmert: Helmert<From, To>,
    tolerances: Tolerances,
}

// manual impls of Clone and Copy to avoid requiring From/To: Copy + Clone
impl<From, To> Clone for GridTransform<From, To> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<From, To> Copy for GridTransform<From, To> {}

impl<From, To> PartialEq<Self> for GridTransform<From, To> {
    fn eq(&self, other: &Self) -> bool {
        self.projection == other.projection
            && self.helmert == other.helmert
            && self.tolerances == other.tolerances
    }
}

impl Default for GridTransform<Osgb36, Wgs84> {
    fn default() -> Self {
        Self::new(
            BRITISH_NATIONAL_GRID,
            Helmert::osgb36_to_wgs84(),
            Tolerances::default(),
        )
    }
}

impl<From, To> GridTransform<From, To> {
    /// Assembles a pipeline from its parts.
    #[must_use]
    pub fn new(
        projection: ProjectionOrigin<From>,
        helmert: Helmert<From, To>,
        tolerances: Tolerances,
    ) -> Self {
        Self {
            projection,
            helmert,
            tolerances,
        }
    }

    /// The same pipeline, but with different stopping rules.
    #[must_use]
    pub fn with_tolerances(self, tolerances: Tolerances) -> Self {
        Self { tolerances, ..self }
    }

    #[must_use]
    pub fn projection(&self) -> &ProjectionOrigin<From> {
        &self.projection
    }

    #[must_use]
    pub fn helmert(&self) -> &Helmert<From, To> {
        &self.helmert
    }

    #[must_use]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }
}

impl<From, To> GridTransform<From, To>
where
    From: Datum,
    To: Datum,
{
    /// Converts one grid coordinate.
    ///
    /// This is a pure function of `grid` and `self`: calling it again with the same inputs gives
    /// bit-for-bit the same answer.
    pub fn transform(&self, grid: GridCoordinate) -> Result<Geographic<To>, ConvergenceError> {
        let on_source = self.projection.unproject(grid, &self.tolerances)?;
        let source_frame = Cartesian::from_geographic(&on_source, Length::new::<meter>(0.));
        let target_frame = source_frame * self.helmert;
        target_frame.to_geographic(&self.tolerances)
    }

    /// Converts every coordinate in `grid`, in order.
    ///
    /// Stops at (and returns) the first failure; no partial results are returned.
    pub fn transform_all(
        &self,
        grid: &[GridCoordinate],
    ) -> Result<Vec<Geographic<To>>, ConvergenceError> {
        grid.iter().map(|&point| self.transform(point)).collect()
    }
}

impl GridTransform<Osgb36, Wgs84> {
    /// Parses a `POLYGON` or `MULTIPOLYGON` in well-known text and converts every vertex.
    ///
    /// See [`wkt::decode`] for the details; this is the same but with `self` as the pipeline.
    pub fn decode(&self, text: &str) -> Result<Geometry<LonLat>, DecodeError> {
        let planar = wkt::parse(text)?;
        let decoded = planar.try_map(|point| self.transform(point).map(LonLat::from))?;
        Ok(decoded)
    }
}

/// Converts a British National Grid coordinate to WGS84 latitude and longitude.
///
/// Shorthand for [`GridTransform::default().transform(grid)`](GridTransform::transform).
///
/// ```rust
/// use natgrid::GridCoordinate;
///
/// // the true origin of the grid, 49°N 2°W on OSGB36
/// let origin = natgrid::transform(GridCoordinate::from_meters(400_000., -100_000.)).unwrap();
/// assert!((origin.latitude_degrees() - 49.).abs() < 0.01);
/// assert!((origin.longitude_degrees() - -2.).abs() < 0.01);
/// ```
pub fn transform(grid: GridCoordinate) -> Result<Geographic<Wgs84>, ConvergenceError> {
    GridTransform::<Osgb36, Wgs84>::default().transform(grid)
}

#[cfg(test)]
mod tests {
    use super::{GridTransform, Tolerances};
    use crate::datum::{Osgb36, Wgs84};
    use crate::error::Solve;
    use crate::geodetic::Geographic;
    use crate::grid::GridCoordinate;
    use crate::helmert::Helmert;
    use crate::projection::BRITISH_NATIONAL_GRID;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;
    use uom::si::angle::radian;
    use uom::si::f64::{Angle, Length};
    use uom::si::length::meter;

    #[test]
    fn deterministic() {
        let grid = GridCoordinate::from_meters(530_034., 180_381.);
        let a = super::transform(grid).unwrap();
        let b = super::transform(grid).unwrap();
        assert_eq!(a.latitude_degrees().to_bits(), b.latitude_degrees().to_bits());
        assert_eq!(a.longitude_degrees().to_bits(), b.longitude_degrees().to_bits());
    }

    #[test]
    fn true_origin_is_close_to_49n_2w() {
        let origin = super::transform(GridCoordinate::from_meters(400_000., -100_000.)).unwrap();
        assert_abs_diff_eq!(origin.latitude_degrees(), 49., epsilon = 0.01);
        assert_abs_diff_eq!(origin.longitude_degrees(), -2., epsilon = 0.01);
        // but not exactly: the datum shift is a few tens of meters here
        assert!(origin.latitude_degrees() > 49.0005);
        assert!(origin.longitude_degrees() < -2.001);
    }

    #[test]
    fn edinburgh_castle() {
        let castle = super::transform(GridCoordinate::from_meters(325_482., 673_143.)).unwrap();
        assert_abs_diff_eq!(castle.latitude_degrees(), 55.9486, epsilon = 0.01);
        assert_abs_diff_eq!(castle.longitude_degrees(), -3.1999, epsilon = 0.01);
        insta::assert_snapshot!(format!("{castle:.4}"), @"55.9455°N, 3.1947°W");
    }

    #[rstest]
    #[case::true_origin(400_000., -100_000., 49.000_770_777_5, -2.001_307_500_7)]
    #[case::edinburgh(325_482., 673_143., 55.945_526_645_3, -3.194_710_478_4)]
    #[case::caister(651_409.903, 313_177.270, 52.657_978_596_2, 1.716_051_945_7)]
    #[case::trafalgar_square(530_034., 180_381., 51.507_406_923_9, -0.127_724_043_8)]
    #[case::false_origin(0., 0., 49.766_807_210_4, -7.557_159_803_2)]
    fn known_values(
        #[case] easting: f64,
        #[case] northing: f64,
        #[case] latitude: f64,
        #[case] longitude: f64,
    ) {
        let location = super::transform(GridCoordinate::from_meters(easting, northing)).unwrap();
        assert_abs_diff_eq!(location.latitude_degrees(), latitude, epsilon = 1e-6);
        assert_abs_diff_eq!(location.longitude_degrees(), longitude, epsilon = 1e-6);
    }

    #[test]
    fn far_out_of_grid_is_bounded() {
        // either gives up or produces something (meaningless, but) in range
        match super::transform(GridCoordinate::from_meters(0., 1e9)) {
            Ok(location) => {
                assert!((-90. ..=90.).contains(&location.latitude_degrees()));
                assert!((-180. ..180.).contains(&location.longitude_degrees()));
            }
            Err(e) => assert!(e.iterations() <= Tolerances::default().max_iterations),
        }
    }

    #[rstest]
    #[case::nan_northing(400_000., f64::NAN, Solve::FootPointLatitude)]
    #[case::infinite_northing(400_000., f64::INFINITY, Solve::FootPointLatitude)]
    #[case::nan_easting(f64::NAN, 400_000., Solve::FootPointLatitude)]
    #[case::past_the_pole(400_000., 6e6, Solve::FootPointLatitude)]
    fn input_off_the_ellipsoid_is_an_error(
        #[case] easting: f64,
        #[case] northing: f64,
        #[case] solve: Solve,
    ) {
        let err = super::transform(GridCoordinate::from_meters(easting, northing)).unwrap_err();
        assert_eq!(err.solve(), solve);
    }

    #[test]
    fn transform_all_is_fail_fast() {
        let bng: GridTransform = GridTransform::default();
        let ok = [
            GridCoordinate::from_meters(0., 0.),
            GridCoordinate::from_meters(10., 10.),
        ];
        assert_eq!(bng.transform_all(&ok).unwrap().len(), 2);

        let bad = [ok[0], GridCoordinate::from_meters(0., f64::NAN), ok[1]];
        assert_eq!(
            bng.transform_all(&bad).unwrap_err().solve(),
            Solve::FootPointLatitude
        );
    }

    #[test]
    fn identity_helmert_only_projects() {
        let helmert = Helmert::<Osgb36, Osgb36>::from_parameters(crate::helmert::HelmertParameters {
            tx: 0.,
            ty: 0.,
            tz: 0.,
            rx: 0.,
            ry: 0.,
            rz: 0.,
            scale_ppm: 0.,
        })
        .unwrap();
        let no_shift = GridTransform::new(BRITISH_NATIONAL_GRID, helmert, Tolerances::default());
        let grid = GridCoordinate::from_meters(651_409.903, 313_177.270);
        let via_cartesian: Geographic<Osgb36> = no_shift.transform(grid).unwrap();
        let direct = BRITISH_NATIONAL_GRID
            .unproject(grid, &Tolerances::default())
            .unwrap();
        assert_abs_diff_eq!(via_cartesian, direct);
    }

    #[test]
    fn starved_of_iterations() {
        let bng = GridTransform::<Osgb36, Wgs84>::default().with_tolerances(Tolerances {
            max_iterations: 0,
            ..Tolerances::default()
        });
        let err = bng
            .transform(GridCoordinate::from_meters(325_482., 673_143.))
            .unwrap_err();
        assert_eq!(err.solve(), Solve::FootPointLatitude);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn tolerances_from_yaml() {
        let tolerances: Tolerances = serde_yaml::from_str(
            "
            max_iterations: 20
            latitude_tolerance: 1.0e-12
            ",
        )
        .unwrap();
        assert_eq!(
            tolerances,
            Tolerances {
                max_iterations: 20,
                latitude_tolerance: Angle::new::<radian>(1e-12),
                ..Tolerances::default()
            }
        );
        assert_eq!(
            tolerances.arc_length_tolerance,
            Length::new::<meter>(1e-5)
        );
    }
}
