use crate::datum::{Datum, Wgs84};
use crate::util::{degrees_minutes_seconds, BoundedAngle};
use std::fmt;
use std::fmt::Display;
use std::marker::PhantomData;
use uom::si::angle::{degree, radian};
use uom::si::f64::{Angle, Length};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An Earth-bound location given as latitude and longitude on the ellipsoid of datum `In`.
///
/// This is what [`transform`](crate::transform()) hands back, tagged with [`Wgs84`] since that is
/// the frame web maps and GPS receivers speak. A location on any other datum (such as
/// [`Osgb36`](crate::datum::Osgb36)) can only become a WGS84 one by going through a
/// [`Helmert`](crate::Helmert) transform.
///
/// To construct one, either use [a builder] via [`Geographic::builder`] or provide a
/// [`Components`] to [`Geographic::build`]. The following are equivalent:
///
/// ```rust
/// use natgrid::Geographic;
/// use natgrid::geodetic::Components;
/// use uom::si::f64::Angle;
/// use uom::si::angle::degree;
///
/// let a = Geographic::<natgrid::datum::Wgs84>::builder()
///     .latitude(Angle::new::<degree>(55.9486))
///     .expect("latitude is in [-90°, 90°]")
///     .longitude(Angle::new::<degree>(-3.1999))
///     .build();
///
/// let b = Geographic::build(Components {
///     latitude: Angle::new::<degree>(55.9486),
///     longitude: Angle::new::<degree>(-3.1999),
/// })
/// .expect("latitude is in [-90°, 90°]");
///
/// assert_eq!(a, b);
/// ```
///
/// [a builder]: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// don't require In: Serialize/Deserialize since we skip it anyway
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct Geographic<In = Wgs84> {
    // NOTE: uom does not say how it normalizes angles, so longitude is only put into
    // [-180°, 180°) when it is read back out.
    pub(crate) latitude: Angle,
    pub(crate) longitude: Angle,
    #[cfg_attr(feature = "serde", serde(skip))]
    datum: PhantomData<In>,
}

// manual impls of Clone and Copy to avoid requiring In: Copy + Clone
impl<In> Clone for Geographic<In> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In> Copy for Geographic<In> {}

impl<In> PartialEq<Self> for Geographic<In> {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

impl<In> Geographic<In> {
    /// Constructs a location from latitude and longitude.
    ///
    /// The latitude must be in [-90°,90°] % 360°. If it is not, this function returns `None`.
    #[must_use]
    pub fn build(
        Components {
            latitude,
            longitude,
        }: Components,
    ) -> Option<Self> {
        Some(
            Self::builder()
                .latitude(latitude)?
                .longitude(longitude)
                .build(),
        )
    }

    /// Provides a constructor for a [`Geographic`] location.
    pub fn builder() -> Builder<In, MissingLatitude, MissingLongitude> {
        Builder {
            under_construction: Self::from_radians_unchecked(0., 0.),
            has: (PhantomData, PhantomData),
        }
    }

    /// Constructs a location from latitude and longitude in decimal degrees.
    ///
    /// Returns `None` if the latitude is not in [-90°,90°] % 360°.
    #[must_use]
    pub fn from_degrees(latitude: f64, longitude: f64) -> Option<Self> {
        Self::build(Components {
            latitude: Angle::new::<degree>(latitude),
            longitude: Angle::new::<degree>(longitude),
        })
    }

    /// Only for use by the solvers in this crate, which either produce latitudes by `atan`/`atan2`
    /// or check the range before calling this.
    pub(crate) fn from_radians_unchecked(lat_phi: f64, lon_lambda: f64) -> Self {
        Self {
            latitude: Angle::new::<radian>(lat_phi),
            longitude: Angle::new::<radian>(lon_lambda),
            datum: PhantomData,
        }
    }

    /// Returns the angle north of the equator.
    ///
    /// The returned value is always in [-90°, 90°].
    #[must_use]
    pub fn latitude(&self) -> Angle {
        Angle::new::<radian>(BoundedAngle::new(self.latitude).to_signed_range())
    }

    /// Returns the angle east of the prime meridian.
    ///
    /// The returned value is always in [-180°, 180°).
    #[must_use]
    pub fn longitude(&self) -> Angle {
        Angle::new::<radian>(BoundedAngle::new(self.longitude).to_signed_range())
    }

    /// Shorthand for [`Geographic::latitude`] in decimal degrees.
    #[must_use]
    pub fn latitude_degrees(&self) -> f64 {
        self.latitude().get::<degree>()
    }

    /// Shorthand for [`Geographic::longitude`] in decimal degrees.
    #[must_use]
    pub fn longitude_degrees(&self) -> f64 {
        self.longitude().get::<degree>()
    }

    /// Latitude and longitude in radians, in that order, for the numeric kernels.
    pub(crate) fn radians(&self) -> (f64, f64) {
        (
            self.latitude().get::<radian>(),
            self.longitude().get::<radian>(),
        )
    }

    /// Computes the [great-circle distance] between the two locations on the surface of the
    /// earth.
    ///
    /// This is an approximation that treats the ellipsoid of `In` as a sphere with its semi-major
    /// axis as radius; it is good enough to decide whether two locations are "the same".
    ///
    /// The current implementation computes this [using the archaversine] (inverse haversine).
    ///
    /// [great-circle distance]: https://en.wikipedia.org/wiki/Great-circle_distance
    /// [using the archaversine]: https://en.wikipedia.org/wiki/Haversine_formula#Formulation
    #[doc(alias = "great_circle_distance")]
    #[must_use]
    pub fn haversine_distance_on_surface(&self, other: &Self) -> Length
    where
        In: Datum,
    {
        let (lat_a, lon_a) = self.radians();
        let (lat_b, lon_b) = other.radians();
        let delta_lat = lat_b - lat_a;
        let delta_lon = lon_b - lon_a;

        let inner = 1. - delta_lat.cos() + lat_a.cos() * lat_b.cos() * (1. - delta_lon.cos());
        let central_angle = 2. * (inner / 2.).sqrt().asin();

        In::ELLIPSOID.semi_major_axis() * central_angle
    }
}

/// Prints as decimal degrees with hemisphere letters, eg `55.9455°N, 3.1947°W`.
///
/// The alternate form (`{:#}`) prints degrees, minutes, and seconds instead, eg
/// `55°56'43.899"N, 3°11'40.958"W`. A precision (`{:.2}`) applies to the degrees or seconds
/// respectively.
impl<In> Display for Geographic<In> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat = self.latitude_degrees();
        let lon = self.longitude_degrees();
        let ns = if lat.is_sign_negative() { 'S' } else { 'N' };
        let ew = if lon.is_sign_negative() { 'W' } else { 'E' };

        if f.alternate() {
            let precision = f.precision().unwrap_or(3);
            let (lat_d, lat_m, lat_s) = degrees_minutes_seconds(lat, precision);
            let (lon_d, lon_m, lon_s) = degrees_minutes_seconds(lon, precision);
            write!(
                f,
                "{lat_d}°{lat_m}'{lat_s:.precision$}\"{ns}, {lon_d}°{lon_m}'{lon_s:.precision$}\"{ew}"
            )
        } else if let Some(precision) = f.precision() {
            let (lat, lon) = (lat.abs(), lon.abs());
            write!(f, "{lat:.precision$}°{ns}, {lon:.precision$}°{ew}")
        } else {
            let (lat, lon) = (lat.abs(), lon.abs());
            write!(f, "{lat}°{ns}, {lon}°{ew}")
        }
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> AbsDiffEq<Self> for Geographic<In> {
    type Epsilon = Angle;

    fn default_epsilon() -> Self::Epsilon {
        // the pipeline stops iterating once latitude moves by less than 1e-9 radians, so asking
        // for more than that would be asking for noise
        Angle::new::<radian>(BoundedAngle::default_epsilon())
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let epsilon = epsilon.get::<radian>();
        BoundedAngle::new(self.latitude).abs_diff_eq(&BoundedAngle::new(other.latitude), epsilon)
            && BoundedAngle::new(self.longitude)
                .abs_diff_eq(&BoundedAngle::new(other.longitude), epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<In> RelativeEq for Geographic<In> {
    fn default_max_relative() -> Self::Epsilon {
        Angle::new::<radian>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        _max_relative: Self::Epsilon,
    ) -> bool {
        // relative comparison of angles is meaningless near 0°, so fall back to absolute
        self.abs_diff_eq(other, epsilon)
    }
}

/// Argument type for [`Geographic::build`].
#[derive(Debug, Default, Clone, Copy)]
#[must_use]
pub struct Components {
    /// The latitude angle of the proposed [`Geographic`] location.
    ///
    /// The latitude must be in [-90°,90°] % 360°.
    pub latitude: Angle,

    /// The longitude angle of the proposed [`Geographic`] location.
    pub longitude: Angle,
}

/// Used to indicate that a partially-constructed [`Geographic`] is missing the latitude.
pub struct MissingLatitude;
/// Used to indicate that a partially-constructed [`Geographic`] has the latitude set.
pub struct HasLatitude;
/// Used to indicate that a partially-constructed [`Geographic`] is missing the longitude.
pub struct MissingLongitude;
/// Used to indicate that a partially-constructed [`Geographic`] has the longitude set.
pub struct HasLongitude;

/// [Builder] for a [`Geographic`] location.
///
/// Construct one through [`Geographic::builder`], and finalize with [`Builder::build`].
///
/// [Builder]: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
#[derive(Debug)]
#[must_use]
pub struct Builder<In, Latitude, Longitude> {
    under_construction: Geographic<In>,
    has: (PhantomData<Latitude>, PhantomData<Longitude>),
}

// manual impls of Clone and Copy to avoid requiring In: Copy + Clone
impl<In, L1, L2> Clone for Builder<In, L1, L2> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<In, L1, L2> Copy for Builder<In, L1, L2> {}

impl<In, L1, L2> Builder<In, L1, L2> {
    /// Sets the latitude of the [`Geographic`]-to-be.
    ///
    /// The latitude must be in [-90°,90°] % 360°. If it is not, this function returns `None`.
    pub fn latitude(
        mut self,
        latitude: impl Into<Angle>,
    ) -> Option<Builder<In, HasLatitude, L2>> {
        let latitude = latitude.into();
        let latitude_in_signed_radians = BoundedAngle::new(latitude).to_signed_range();
        if !(-std::f64::consts::FRAC_PI_2..=std::f64::consts::FRAC_PI_2)
            .contains(&latitude_in_signed_radians)
        {
            None
        } else {
            self.under_construction.latitude = latitude;
            Some(Builder {
                under_construction: self.under_construction,
                has: (PhantomData::<HasLatitude>, self.has.1),
            })
        }
    }

    /// Sets the longitude of the [`Geographic`]-to-be.
    pub fn longitude(mut self, longitude: impl Into<Angle>) -> Builder<In, L1, HasLongitude> {
        self.under_construction.longitude = longitude.into();
        Builder {
            under_construction: self.under_construction,
            has: (self.has.0, PhantomData::<HasLongitude>),
        }
    }
}

impl<In> Builder<In, HasLatitude, HasLongitude> {
    #[must_use]
    pub fn build(self) -> Geographic<In> {
        self.under_construction
    }
}

/// A decoded geometry vertex: decimal degrees, longitude first.
///
/// This is the axis order GeoJSON (and so most web map renderers) expects, which is the opposite
/// of how people usually say coordinates out loud. With the `serde` feature it serializes as a
/// bare `[longitude, latitude]` array.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "[f64; 2]", into = "[f64; 2]")
)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl From<Geographic<Wgs84>> for LonLat {
    fn from(location: Geographic<Wgs84>) -> Self {
        Self {
            longitude: location.longitude_degrees(),
            latitude: location.latitude_degrees(),
        }
    }
}

impl From<[f64; 2]> for LonLat {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(position: LonLat) -> Self {
        [position.longitude, position.latitude]
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for LonLat {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        // degrees; about a centimeter
        1e-7
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.longitude.abs_diff_eq(&other.longitude, epsilon)
            && self.latitude.abs_diff_eq(&other.latitude, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for LonLat {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.longitude
            .relative_eq(&other.longitude, epsilon, max_relative)
            && self
                .latitude
                .relative_eq(&other.latitude, epsilon, max_relative)
    }
}

impl Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.longitude, self.latitude)
    }
}
