//! Polygonal geometry, generic over the type of its vertices.
//!
//! The same structures carry planar vertices ([`GridCoordinate`]) straight out of the
//! [well-known text parser](crate::wkt::parse) and geographic vertices ([`LonLat`]) once those
//! have been [transformed](Geometry::try_map). Nothing here cares which it is; in particular,
//! rings are kept exactly as they were given, closed or not, and no winding order is imposed.
//!
//! With the `serde` feature, geometries serialize in the [GeoJSON] geometry layout, eg
//! `{"type":"Polygon","coordinates":[[[lon,lat],...]]}`, which is what map renderers expect.
//!
//! [GeoJSON]: https://datatracker.ietf.org/doc/html/rfc7946#section-3.1

use crate::grid::GridCoordinate;
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(doc)]
use crate::geodetic::LonLat;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

/// An ordered sequence of vertices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// no need for the "points": indirection
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Ring<P> {
    points: Vec<P>,
}

impl<P> Ring<P> {
    #[must_use]
    pub fn new(points: Vec<P>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[P] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true if the ring has at least two vertices and its last vertex repeats its first.
    #[must_use]
    pub fn is_closed(&self) -> bool
    where
        P: PartialEq,
    {
        self.points.len() > 1 && self.points.first() == self.points.last()
    }

    /// Maps every vertex with `f`, keeping their order, and stops at the first error.
    pub fn try_map<Q, E>(self, f: impl FnMut(P) -> Result<Q, E>) -> Result<Ring<Q>, E> {
        Ok(Ring {
            points: self.points.into_iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}

impl<P> From<Vec<P>> for Ring<P> {
    fn from(points: Vec<P>) -> Self {
        Self::new(points)
    }
}

/// An exterior ring followed by zero or more holes.
///
/// Which ring is the exterior is purely positional: it is the first one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Polygon<P> {
    /// Never empty.
    rings: Vec<Ring<P>>,
}

impl<P> Polygon<P> {
    #[must_use]
    pub fn new(exterior: Ring<P>, interiors: impl IntoIterator<Item = Ring<P>>) -> Self {
        Self {
            rings: std::iter::once(exterior).chain(interiors).collect(),
        }
    }

    /// Constructs a polygon from its rings, exterior first.
    ///
    /// Returns `None` if `rings` is empty.
    #[must_use]
    pub fn from_rings(rings: Vec<Ring<P>>) -> Option<Self> {
        if rings.is_empty() {
            None
        } else {
            Some(Self { rings })
        }
    }

    #[must_use]
    pub fn exterior(&self) -> &Ring<P> {
        // NOTE: every constructor (including Deserialize) guarantees at least one ring
        &self.rings[0]
    }

    /// The holes, if any.
    #[must_use]
    pub fn interiors(&self) -> &[Ring<P>] {
        &self.rings[1..]
    }

    /// All rings, exterior first.
    #[must_use]
    pub fn rings(&self) -> &[Ring<P>] {
        &self.rings
    }

    /// Total number of vertices across all rings.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Ring::len).sum()
    }

    /// Maps every vertex with `f`, keeping ring and vertex order, and stops at the first error.
    pub fn try_map<Q, E>(self, mut f: impl FnMut(P) -> Result<Q, E>) -> Result<Polygon<Q>, E> {
        Ok(Polygon {
            rings: self
                .rings
                .into_iter()
                .map(|ring| ring.try_map(&mut f))
                .collect::<Result<_, _>>()?,
        })
    }
}

#[cfg(feature = "serde")]
impl<'de, P> Deserialize<'de> for Polygon<P>
where
    P: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rings = Vec::<Ring<P>>::deserialize(deserializer)?;
        Self::from_rings(rings).ok_or_else(|| {
            serde::de::Error::invalid_length(0, &"a polygon with at least an exterior ring")
        })
    }
}

/// A collection of polygons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MultiPolygon<P> {
    polygons: Vec<Polygon<P>>,
}

impl<P> MultiPolygon<P> {
    #[must_use]
    pub fn new(polygons: Vec<Polygon<P>>) -> Self {
        Self { polygons }
    }

    #[must_use]
    pub fn polygons(&self) -> &[Polygon<P>] {
        &self.polygons
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn try_map<Q, E>(
        self,
        mut f: impl FnMut(P) -> Result<Q, E>,
    ) -> Result<MultiPolygon<Q>, E> {
        Ok(MultiPolygon {
            polygons: self
                .polygons
                .into_iter()
                .map(|polygon| polygon.try_map(&mut f))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Either a single [`Polygon`] or a [`MultiPolygon`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "coordinates"))]
pub enum Geometry<P> {
    Polygon(Polygon<P>),
    MultiPolygon(MultiPolygon<P>),
}

impl<P> Geometry<P> {
    /// Iterates over the polygons of this geometry; a [`Geometry::Polygon`] yields just itself.
    pub fn polygons(&self) -> std::slice::Iter<'_, Polygon<P>> {
        match self {
            Self::Polygon(polygon) => std::slice::from_ref(polygon).iter(),
            Self::MultiPolygon(multi) => multi.polygons.iter(),
        }
    }

    /// Iterates over every vertex of every ring of every polygon, in order.
    pub fn vertices(&self) -> impl Iterator<Item = &P> + '_ {
        self.polygons()
            .flat_map(|polygon| polygon.rings.iter())
            .flat_map(|ring| ring.points.iter())
    }

    /// The geometry type as it is spelled in well-known text.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Polygon(_) => "POLYGON",
            Self::MultiPolygon(_) => "MULTIPOLYGON",
        }
    }

    /// Maps every vertex with `f`, keeping the structure intact, and stops at the first error.
    ///
    /// ```rust
    /// use natgrid::geometry::{Geometry, Polygon, Ring};
    ///
    /// let square = Geometry::Polygon(Polygon::new(
    ///     Ring::new(vec![(0, 0), (0, 10), (10, 10), (10, 0), (0, 0)]),
    ///     [],
    /// ));
    /// let doubled = square.clone().try_map(|(x, y)| Ok::<_, ()>((2 * x, 2 * y))).unwrap();
    /// assert_eq!(doubled.vertices().nth(2), Some(&(20, 20)));
    ///
    /// let failed = square.try_map(|(x, _)| if x < 10 { Ok(x) } else { Err(x) });
    /// assert_eq!(failed, Err(10));
    /// ```
    pub fn try_map<Q, E>(self, f: impl FnMut(P) -> Result<Q, E>) -> Result<Geometry<Q>, E> {
        Ok(match self {
            Self::Polygon(polygon) => Geometry::Polygon(polygon.try_map(f)?),
            Self::MultiPolygon(multi) => Geometry::MultiPolygon(multi.try_map(f)?),
        })
    }
}

impl<P> From<Polygon<P>> for Geometry<P> {
    fn from(polygon: Polygon<P>) -> Self {
        Self::Polygon(polygon)
    }
}

impl<P> From<MultiPolygon<P>> for Geometry<P> {
    fn from(multi: MultiPolygon<P>) -> Self {
        Self::MultiPolygon(multi)
    }
}

fn write_ring<P: Display>(f: &mut Formatter<'_>, ring: &Ring<P>) -> fmt::Result {
    f.write_str("(")?;
    for (i, point) in ring.points.iter().enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        // forward the caller's precision, if any, to each vertex
        match f.precision() {
            Some(precision) => write!(f, "{point:.precision$}")?,
            None => write!(f, "{point}")?,
        }
    }
    f.write_str(")")
}

fn write_polygon<P: Display>(f: &mut Formatter<'_>, polygon: &Polygon<P>) -> fmt::Result {
    f.write_str("(")?;
    for (i, ring) in polygon.rings.iter().enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        write_ring(f, ring)?;
    }
    f.write_str(")")
}

/// Prints as well-known text, eg `POLYGON ((0 0, 0 10, 10 10, 0 0))`.
impl Display for Geometry<GridCoordinate> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.keyword())?;
        match self {
            Self::Polygon(polygon) => write_polygon(f, polygon),
            Self::MultiPolygon(multi) => {
                f.write_str("(")?;
                for (i, polygon) in multi.polygons.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write_polygon(f, polygon)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, MultiPolygon, Polygon, Ring};
    use crate::geodetic::LonLat;
    use crate::grid::GridCoordinate;

    fn square(origin: f64, side: f64) -> Ring<GridCoordinate> {
        Ring::new(
            [
                (origin, origin),
                (origin, origin + side),
                (origin + side, origin + side),
                (origin + side, origin),
                (origin, origin),
            ]
            .map(|(e, n)| GridCoordinate::from_meters(e, n))
            .to_vec(),
        )
    }

    #[test]
    fn ring_closure() {
        assert!(square(0., 10.).is_closed());
        assert!(!Ring::new(vec![1, 2, 3]).is_closed());
        assert!(!Ring::new(vec![1]).is_closed());
        assert!(!Ring::<i32>::default().is_closed());
    }

    #[test]
    fn polygon_rings_are_positional() {
        let with_hole = Polygon::new(square(0., 10.), [square(2., 2.)]);
        assert_eq!(with_hole.exterior(), &square(0., 10.));
        assert_eq!(with_hole.interiors(), &[square(2., 2.)]);
        assert_eq!(with_hole.rings().len(), 2);
        assert_eq!(with_hole.vertex_count(), 10);

        assert_eq!(Polygon::<i32>::from_rings(vec![]), None);
        assert!(Polygon::new(Ring::new(vec![1]), [])
            .interiors()
            .is_empty());
    }

    #[test]
    fn polygons_of_either_kind() {
        let single = Geometry::from(Polygon::new(square(0., 10.), []));
        assert_eq!(single.polygons().count(), 1);
        assert_eq!(single.vertices().count(), 5);

        let multi = Geometry::from(MultiPolygon::new(vec![
            Polygon::new(square(0., 10.), [square(2., 2.)]),
            Polygon::new(square(20., 5.), []),
        ]));
        assert_eq!(multi.polygons().count(), 2);
        assert_eq!(
            multi.polygons().map(|p| p.rings().len()).collect::<Vec<_>>(),
            [2, 1]
        );
        assert_eq!(multi.vertices().count(), 15);
    }

    #[test]
    fn try_map_keeps_structure_and_stops_early() {
        let multi = Geometry::from(MultiPolygon::new(vec![
            Polygon::new(Ring::new(vec![1, 2, 3, 1]), []),
            Polygon::new(Ring::new(vec![4, 5, 6, 4]), [Ring::new(vec![7, 8, 9, 7])]),
        ]));

        let doubled = multi.clone().try_map(|v| Ok::<_, ()>(v * 2)).unwrap();
        assert_eq!(
            doubled.vertices().copied().collect::<Vec<_>>(),
            [2, 4, 6, 2, 8, 10, 12, 8, 14, 16, 18, 14]
        );

        let mut seen = Vec::new();
        let failed = multi.try_map(|v| {
            seen.push(v);
            if v == 5 {
                Err("five")
            } else {
                Ok(v)
            }
        });
        assert_eq!(failed, Err("five"));
        assert_eq!(seen, [1, 2, 3, 1, 4, 5]);
    }

    #[test]
    fn display_as_wkt() {
        let polygon = Geometry::from(Polygon::new(square(0., 10.), []));
        insta::assert_snapshot!(polygon, @"POLYGON ((0 0, 0 10, 10 10, 10 0, 0 0))");

        let multi = Geometry::from(MultiPolygon::new(vec![
            Polygon::new(square(0., 2.), [square(0.5, 0.5)]),
            Polygon::new(square(5., 1.), []),
        ]));
        insta::assert_snapshot!(
            format!("{multi:.1}"),
            @"MULTIPOLYGON (((0.0 0.0, 0.0 2.0, 2.0 2.0, 2.0 0.0, 0.0 0.0), (0.5 0.5, 0.5 1.0, 1.0 1.0, 1.0 0.5, 0.5 0.5)), ((5.0 5.0, 5.0 6.0, 6.0 6.0, 6.0 5.0, 5.0 5.0)))"
        );
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serializes_as_geojson() {
        let polygon: Geometry<LonLat> = Geometry::from(Polygon::new(
            Ring::new(vec![
                LonLat::from([-3.5, 55.]),
                LonLat::from([-3., 55.]),
                LonLat::from([-3., 55.5]),
                LonLat::from([-3.5, 55.]),
            ]),
            [],
        ));
        let json = serde_json::to_value(&polygon).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "Polygon",
                "coordinates": [[[-3.5, 55.0], [-3.0, 55.0], [-3.0, 55.5], [-3.5, 55.0]]]
            })
        );
        let back: Geometry<LonLat> = serde_json::from_value(json).unwrap();
        assert_eq!(back, polygon);

        let multi: Geometry<LonLat> = Geometry::from(MultiPolygon::new(vec![
            Polygon::new(Ring::new(vec![LonLat::from([0., 0.])]), []),
        ]));
        assert_eq!(
            serde_json::to_value(&multi).unwrap(),
            serde_json::json!({ "type": "MultiPolygon", "coordinates": [[[[0.0, 0.0]]]] })
        );
    }

    #[test]
    #[cfg(feature = "serde")]
    fn polygon_without_rings_does_not_deserialize() {
        let err = serde_json::from_str::<Geometry<LonLat>>(r#"{"type":"Polygon","coordinates":[]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("at least an exterior ring"), "{err}");
    }
}
