use crate::ellipsoid::Ellipsoid;

#[cfg(doc)]
use crate::{Cartesian, Geographic, Helmert};

/// A geodetic datum: a reference ellipsoid and where it sits relative to the Earth.
///
/// Datums are zero-sized marker types used to tag [`Cartesian`] and [`Geographic`] values with
/// the frame they are expressed in, so that, say, an OSGB36 latitude cannot be handed to
/// something that expects WGS84 without going through a [`Helmert`] transform first.
///
/// While you _can_ implement this trait directly, prefer using [`datum!`](crate::datum).
pub trait Datum {
    /// The ellipsoid latitudes and heights in this datum are measured against.
    const ELLIPSOID: Ellipsoid;

    /// Human-readable name, used when printing values tagged with this datum.
    const NAME: &'static str;
}

/// Defines a new datum marker type on the given [`Ellipsoid`].
///
/// ```rust
/// use natgrid::{datum, ellipsoid::Ellipsoid};
///
/// datum! {
///     /// Ireland's historic datum, on the modified Airy ellipsoid.
///     pub struct Ireland1965 on Ellipsoid::new(6_377_340.189, 6_356_034.447)
/// }
/// ```
#[macro_export]
macro_rules! datum {
    ($(#[$attr:meta])* $vis:vis struct $name:ident on $ellipsoid:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::Datum for $name {
            const ELLIPSOID: $crate::ellipsoid::Ellipsoid = $ellipsoid;
            const NAME: &'static str = stringify!($name);
        }
    };
}

datum! {
    /// The Ordnance Survey Great Britain 1936 datum, which the British National Grid is drawn on.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Osgb36 on crate::ellipsoid::AIRY_1830
}

datum! {
    /// The [World Geodetic System '84](https://en.wikipedia.org/wiki/World_Geodetic_System#WGS_84)
    /// datum that GPS and web maps use.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Wgs84 on crate::ellipsoid::WGS84
}

#[cfg(test)]
mod tests {
    use super::{Datum, Osgb36, Wgs84};
    use crate::ellipsoid::{AIRY_1830, WGS84};

    crate::datum!(struct Sphere on crate::ellipsoid::Ellipsoid::new(6_371_000., 6_371_000.));

    #[test]
    fn builtin_datums_use_their_ellipsoids() {
        assert_eq!(Osgb36::ELLIPSOID, AIRY_1830);
        assert_eq!(Wgs84::ELLIPSOID, WGS84);
        assert_eq!(Osgb36::NAME, "Osgb36");
    }

    #[test]
    fn macro_defined_datums_work() {
        assert_eq!(Sphere::ELLIPSOID.flattening(), 0.);
        assert_eq!(Sphere::NAME, "Sphere");
    }
}
