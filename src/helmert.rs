//! Seven-parameter similarity transforms between datum frames.
//!
//! The main type provided by this module is [`Helmert`], which maps [`Cartesian`] points from
//! the Earth-centred frame of one [`Datum`] into that of another through three translations,
//! three (small) rotations, and one scale change. Its parameters come from a
//! [`HelmertParameters`]; [`OSGB36_TO_WGS84`] is the set the Ordnance Survey publishes for moving
//! from the British National Grid's datum to the one GPS and web maps use.

use crate::cartesian::Cartesian;
use crate::datum::{Datum, Osgb36, Wgs84};
use crate::{Matrix3, Vector3};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::ops::Mul;
use uom::si::angle::{radian, second};
use uom::si::f64::{Angle, Length, Ratio};
use uom::si::length::meter;
use uom::si::ratio::part_per_million;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The seven numbers that define a Helmert transform, in the units they are usually published in.
///
/// Rotations follow the _position vector_ convention (a positive rotation turns the point, not
/// the axes, anticlockwise when viewed from the positive end of the axis). Published parameter
/// sets using the coordinate frame convention need their rotations negated first.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HelmertParameters {
    /// Translation along X, in meters.
    pub tx: f64,
    /// Translation along Y, in meters.
    pub ty: f64,
    /// Translation along Z, in meters.
    pub tz: f64,
    /// Rotation about X, in arc-seconds.
    pub rx: f64,
    /// Rotation about Y, in arc-seconds.
    pub ry: f64,
    /// Rotation about Z, in arc-seconds.
    pub rz: f64,
    /// Scale change, in parts per million; the points are scaled by `1 + scale_ppm * 1e-6`.
    pub scale_ppm: f64,
}

/// OSGB36 to WGS84 as published by the Ordnance Survey.
///
/// The OS quotes this as good to "a few meters" across Great Britain; sub-meter accuracy needs
/// the OSTN15 correction grid, which this crate deliberately does not carry.
// https://www.ordnancesurvey.co.uk/documents/resources/guide-coordinate-systems-great-britain.pdf
// section 6.6, with signs flipped to go OSGB36 -> WGS84
pub const OSGB36_TO_WGS84: HelmertParameters = HelmertParameters {
    tx: 446.448,
    ty: -125.157,
    tz: 542.060,
    rx: 0.1502,
    ry: 0.2470,
    rz: 0.8421,
    scale_ppm: -20.4894,
};

impl HelmertParameters {
    /// The translations, as lengths.
    #[must_use]
    pub fn translation(&self) -> [Length; 3] {
        [self.tx, self.ty, self.tz].map(Length::new::<meter>)
    }

    /// The rotations, as angles.
    #[must_use]
    pub fn rotation(&self) -> [Angle; 3] {
        [self.rx, self.ry, self.rz].map(Angle::new::<second>)
    }

    /// The scale change, as a ratio.
    #[must_use]
    pub fn scale(&self) -> Ratio {
        Ratio::new::<part_per_million>(self.scale_ppm)
    }

    /// `(1 + s)I + R`, where R is the skew-symmetric small-angle rotation matrix.
    fn linear_part(&self) -> Matrix3 {
        let [rx, ry, rz] = self.rotation().map(|angle| angle.get::<radian>());
        let scale = 1. + self.scale_ppm * 1e-6;
        Matrix3::new(
            scale, -rz, ry, //
            rz, scale, -rx, //
            -ry, rx, scale,
        )
    }
}

/// Defines a [Helmert transform] from the Earth-centred frame of `From` into that of `To`.
///
/// Mathematically this is the affine map `X' = T + ((1 + s)I + R) X`, where `T` is the
/// translation, `s` the scale change, and `R` the skew-symmetric matrix of the three
/// (small-angle) rotations. It is _not_ a rigid body transform: the scale term means distances
/// change very slightly. The map is applied in full in both directions, so going
/// `From -> To -> From` returns the original point to floating point precision.
///
/// <div class="warning">
///
/// Helmert transforms are chained with points using `*` (ie, the [`Mul`] trait), and the order
/// of the operands matters. To go from `From` into `To`, the transform goes on the _right_:
///
/// ```rust,ignore
/// let _: Cartesian<To> = Cartesian<From> * Helmert<From, To>;
/// ```
///
/// and with the transform on the _left_ it is applied in inverse, taking `To` back into `From`.
///
/// </div>
///
/// ```rust
/// use natgrid::{Cartesian, Geographic, Helmert};
/// use natgrid::datum::{Osgb36, Wgs84};
/// use natgrid::helmert::OSGB36_TO_WGS84;
/// use natgrid::transform::Tolerances;
/// use uom::si::{f64::Length, length::meter};
///
/// let osgb36_to_wgs84 =
///     Helmert::<Osgb36, Wgs84>::from_parameters(OSGB36_TO_WGS84).expect("invertible");
///
/// // a point on the Airy 1830 ellipsoid, in OSGB36
/// let on_airy = Geographic::<Osgb36>::from_degrees(52.657_570_3, 1.717_921_6).unwrap();
/// let in_osgb36 = Cartesian::from_geographic(&on_airy, Length::new::<meter>(0.));
///
/// // the same physical point, in WGS84
/// let in_wgs84: Cartesian<Wgs84> = in_osgb36 * osgb36_to_wgs84;
/// let on_wgs84 = in_wgs84.to_geographic(&Tolerances::default()).unwrap();
/// assert!((on_wgs84.latitude_degrees() - 52.657_978_6).abs() < 1e-6);
/// ```
///
/// [Helmert transform]: https://en.wikipedia.org/wiki/Helmert_transformation
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// don't require From/To: Serialize/Deserialize since we skip them anyway
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct Helmert<From, To> {
    translation: Vector3,
    linear: Matrix3,
    /// Precomputed inverse of `linear`, so that applying the transform backwards is as cheap (and
    /// as exact) as applying it forwards.
    inverse_linear: Matrix3,
    #[cfg_attr(feature = "serde", serde(skip))]
    from: PhantomData<From>,
    #[cfg_attr(feature = "serde", serde(skip))]
    to: PhantomData<To>,
}

// manual impls of Clone and Copy to avoid requiring From/To: Copy + Clone
impl<From, To> Clone for Helmert<From, To> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<From, To> Copy for Helmert<From, To> {}

impl<From, To> PartialEq<Self> for Helmert<From, To> {
    fn eq(&self, other: &Self) -> bool {
        self.translation == other.translation && self.linear == other.linear
    }
}

impl<From, To> Display for Helmert<From, To>
where
    From: Datum,
    To: Datum,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Helmert {} -> {}: translation {}, linear part {}",
            From::NAME,
            To::NAME,
            self.translation.transpose(),
            self.linear
        )
    }
}

impl<From, To> Helmert<From, To> {
    /// Constructs the transform from `From` into `To` described by `parameters`.
    ///
    /// The caller is responsible for `parameters` actually describing the relationship between
    /// the two datums; nothing here can check that.
    ///
    /// Returns `None` if the parameters do not describe an invertible map (which for any
    /// real-world parameter set means a scale change of -1,000,000 ppm).
    #[must_use]
    pub fn from_parameters(parameters: HelmertParameters) -> Option<Self> {
        let linear = parameters.linear_part();
        let inverse_linear = linear.try_inverse()?;
        Some(Self {
            translation: Vector3::new(parameters.tx, parameters.ty, parameters.tz),
            linear,
            inverse_linear,
            from: PhantomData,
            to: PhantomData,
        })
    }

    /// Returns the transform that goes the other way, from `To` back into `From`.
    #[must_use]
    pub fn inverse(&self) -> Helmert<To, From> {
        Helmert {
            translation: -(self.inverse_linear * self.translation),
            linear: self.inverse_linear,
            inverse_linear: self.linear,
            from: PhantomData,
            to: PhantomData,
        }
    }

    /// Applies the transform, taking a point in `From` into `To`.
    ///
    /// Equivalent to `point * self`.
    #[must_use]
    pub fn transform(&self, point: Cartesian<From>) -> Cartesian<To> {
        Cartesian::from_nalgebra_point((self.linear * point.point.coords + self.translation).into())
    }

    /// Applies the transform in reverse, taking a point in `To` back into `From`.
    ///
    /// Equivalent to `self * point`.
    #[must_use]
    pub fn inverse_transform(&self, point: Cartesian<To>) -> Cartesian<From> {
        Cartesian::from_nalgebra_point(
            (self.inverse_linear * (point.point.coords - self.translation)).into(),
        )
    }
}

impl Helmert<Osgb36, Wgs84> {
    /// The Ordnance Survey's published OSGB36 to WGS84 transform ([`OSGB36_TO_WGS84`]).
    #[must_use]
    pub fn osgb36_to_wgs84() -> Self {
        Self::from_parameters(OSGB36_TO_WGS84)
            .unwrap_or_else(|| unreachable!("OSGB36_TO_WGS84 has a scale change near 1"))
    }
}

impl Default for Helmert<Osgb36, Wgs84> {
    fn default() -> Self {
        Self::osgb36_to_wgs84()
    }
}

impl<From, To> Mul<Helmert<From, To>> for Cartesian<From> {
    type Output = Cartesian<To>;

    fn mul(self, rhs: Helmert<From, To>) -> Self::Output {
        rhs.transform(self)
    }
}

impl<From, To> Mul<Cartesian<To>> for Helmert<From, To> {
    type Output = Cartesian<From>;

    fn mul(self, rhs: Cartesian<To>) -> Self::Output {
        self.inverse_transform(rhs)
    }
}
