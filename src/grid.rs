use std::fmt;
use std::fmt::Display;
use uom::si::f64::Length;
use uom::si::length::meter;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A planar position on a national grid, as an easting and a northing.
///
/// Grid coordinates are what mapping agencies and their APIs hand out (eg, the `GEOMETRY_X` and
/// `GEOMETRY_Y` of a gazetteer entry, or the vertices of a flood-area polygon). They are only
/// meaningful together with the [`ProjectionOrigin`](crate::projection::ProjectionOrigin) they
/// were projected with; on their own they are just two lengths.
///
/// ```rust
/// use natgrid::GridCoordinate;
/// use natgrid::grid::Components;
/// use uom::si::f64::Length;
/// use uom::si::length::kilometer;
///
/// let a = GridCoordinate::build(Components {
///     easting: Length::new::<kilometer>(325.482),
///     northing: Length::new::<kilometer>(673.143),
/// });
/// let b = GridCoordinate::from_meters(325_482., 673_143.);
/// approx::assert_relative_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridCoordinate {
    pub(crate) easting: f64,
    pub(crate) northing: f64,
}

impl GridCoordinate {
    /// Constructs a grid coordinate from its easting and northing.
    #[must_use]
    pub fn build(Components { easting, northing }: Components) -> Self {
        Self {
            easting: easting.get::<meter>(),
            northing: northing.get::<meter>(),
        }
    }

    /// Constructs a grid coordinate from an easting and northing in meters.
    #[must_use]
    pub fn from_meters(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }

    /// Distance east of the grid's false origin.
    #[must_use]
    pub fn easting(&self) -> Length {
        Length::new::<meter>(self.easting)
    }

    /// Distance north of the grid's false origin.
    #[must_use]
    pub fn northing(&self) -> Length {
        Length::new::<meter>(self.northing)
    }

    /// Straight-line distance to `other` on the grid plane.
    ///
    /// This is not a distance on the ground; the grid's scale varies (very slightly) away from
    /// the central meridian.
    #[must_use]
    pub fn grid_distance_to(&self, other: &Self) -> Length {
        Length::new::<meter>((self.easting - other.easting).hypot(self.northing - other.northing))
    }
}

/// Prints as `easting northing` in meters, which is also how vertices are written in well-known
/// text.
impl Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(precision) = f.precision() {
            write!(
                f,
                "{:.precision$} {:.precision$}",
                self.easting, self.northing
            )
        } else {
            write!(f, "{} {}", self.easting, self.northing)
        }
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for GridCoordinate {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        // NOTE: this is in meters; grid references are published to the millimeter at best
        Length::new::<meter>(0.001)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        // NOTE: this checks each axis separately, not the length of the difference
        let epsilon = epsilon.get::<meter>();
        self.easting.abs_diff_eq(&other.easting, epsilon)
            && self.northing.abs_diff_eq(&other.northing, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for GridCoordinate {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let (epsilon, max_relative) = (epsilon.get::<meter>(), max_relative.get::<meter>());
        self.easting
            .relative_eq(&other.easting, epsilon, max_relative)
            && self
                .northing
                .relative_eq(&other.northing, epsilon, max_relative)
    }
}

/// Argument type for [`GridCoordinate::build`].
#[derive(Debug, Default, Clone, Copy)]
#[must_use]
pub struct Components {
    /// Distance east of the grid's false origin.
    pub easting: Length,

    /// Distance north of the grid's false origin.
    pub northing: Length,
}

#[cfg(test)]
mod tests {
    use super::{Components, GridCoordinate};
    use approx::{assert_relative_eq, assert_relative_ne};
    use uom::si::f64::Length;
    use uom::si::length::{kilometer, meter};

    #[test]
    fn build_converts_units() {
        let coordinate = GridCoordinate::build(Components {
            easting: Length::new::<kilometer>(651.409_903),
            northing: Length::new::<meter>(313_177.27),
        });
        assert_relative_eq!(
            coordinate,
            GridCoordinate::from_meters(651_409.903, 313_177.27)
        );
    }

    #[test]
    fn approx_is_per_axis() {
        let a = GridCoordinate::from_meters(100., 200.);
        assert_relative_eq!(a, GridCoordinate::from_meters(100.0005, 199.9995));
        assert_relative_ne!(a, GridCoordinate::from_meters(100.002, 200.));
    }

    #[test]
    fn grid_distance() {
        let a = GridCoordinate::from_meters(0., 0.);
        let b = GridCoordinate::from_meters(3., 4.);
        assert_eq!(a.grid_distance_to(&b).get::<meter>(), 5.);
    }

    #[test]
    fn display_is_wkt_vertex() {
        let point = GridCoordinate::from_meters(325_482., 673_143.5);
        insta::assert_snapshot!(point, @"325482 673143.5");
        insta::assert_snapshot!(format!("{point:.1}"), @"325482.0 673143.5");
    }
}
