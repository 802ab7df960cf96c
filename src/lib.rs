//! This library converts British National Grid references into WGS84 latitude and longitude,
//! and decodes polygon outlines published in well-known text on the grid into geographic
//! geometry a web map can draw.
//!
//! Grid eastings and northings (a [`GridCoordinate`]) are a Transverse Mercator
//! [projection](projection::ProjectionOrigin) of the Airy 1830 ellipsoid, which is what the
//! OSGB36 [datum](datum::Osgb36) is defined on. GPS receivers and web maps work in a different
//! datum, [WGS84](datum::Wgs84), whose ellipsoid is both a different shape and in a slightly
//! different place. Getting from one to the other therefore takes more than undoing the
//! projection:
//!
//! 1. [unproject](projection::ProjectionOrigin::unproject) onto the Airy 1830 ellipsoid, giving a
//!    [`Geographic<Osgb36>`](Geographic);
//! 2. lift that into the Earth-centred [`Cartesian<Osgb36>`](Cartesian) frame;
//! 3. move into [`Cartesian<Wgs84>`](Cartesian) with a seven-parameter [`Helmert`] transform;
//! 4. and drop back onto the WGS84 ellipsoid as a [`Geographic<Wgs84>`](Geographic).
//!
//! Every intermediate is typed by its [`Datum`], so that (for example) an OSGB36 latitude cannot
//! be passed off as a WGS84 one, and a Helmert transform can only be applied to points in the
//! datum it was defined for. [`GridTransform`] composes the four steps; [`transform()`] is the
//! one-call version with the standard parameters.
//!
//! The [`Helmert`] parameters used are the Ordnance Survey's published
//! [OSGB36 to WGS84](helmert::OSGB36_TO_WGS84) set, which is good to a few meters. That is plenty
//! for putting outlines on a map, but not for surveying.
//!
//! # Examples
//!
//! Converting a single grid reference:
//!
//! ```
//! use natgrid::GridCoordinate;
//!
//! // Edinburgh Castle
//! let castle = natgrid::transform(GridCoordinate::from_meters(325_482., 673_143.))
//!     .expect("well within the grid");
//! assert!((castle.latitude_degrees() - 55.9486).abs() < 0.01);
//! assert!((castle.longitude_degrees() - -3.1999).abs() < 0.01);
//! println!("{castle:.4}"); // 55.9455°N, 3.1947°W
//! ```
//!
//! Decoding an outline given in well-known text:
//!
//! ```
//! use natgrid::geometry::Geometry;
//!
//! let area = natgrid::decode(
//!     "MULTIPOLYGON (((325000 673000, 325000 674000, 326000 674000, 325000 673000)), \
//!                    ((530000 180000, 530000 181000, 531000 181000, 530000 180000)))",
//! )
//! .expect("valid polygons on the grid");
//!
//! let Geometry::MultiPolygon(area) = area else { unreachable!() };
//! assert_eq!(area.len(), 2);
//!
//! // vertices come out longitude first, ready for GeoJSON
//! let first = area.polygons()[0].exterior().points()[0];
//! assert!(first.longitude < 0. && first.latitude > 55.);
//! ```
//!
//! Doing the steps by hand, to also get at the intermediate values:
//!
//! ```
//! use natgrid::{Cartesian, GridCoordinate, Helmert, Tolerances};
//! use natgrid::datum::{Osgb36, Wgs84};
//! use natgrid::projection::BRITISH_NATIONAL_GRID;
//! use uom::si::{f64::Length, length::meter};
//!
//! let tolerances = Tolerances::default();
//! let grid = GridCoordinate::from_meters(651_409.903, 313_177.270);
//!
//! let on_airy = BRITISH_NATIONAL_GRID.unproject(grid, &tolerances).unwrap();
//! assert_eq!(format!("{on_airy:#.4}"), "52°39'27.2531\"N, 1°43'4.5177\"E");
//!
//! let in_osgb36 = Cartesian::from_geographic(&on_airy, Length::new::<meter>(0.));
//! let in_wgs84: Cartesian<Wgs84> = in_osgb36 * Helmert::<Osgb36, Wgs84>::default();
//! let on_wgs84 = in_wgs84.to_geographic(&tolerances).unwrap();
//!
//! // the shift moves the point along the ground, and also off the surface of the new ellipsoid
//! assert!((on_wgs84.latitude_degrees() - on_airy.latitude_degrees()).abs() < 0.001);
//! assert!(in_wgs84.ellipsoidal_height(&on_wgs84).get::<meter>().abs() < 100.);
//! ```
//!
//! # Features
//!
//! - `serde` (default): (de)serialization for all value types; geometries serialize in the
//!   GeoJSON geometry layout.
//! - `approx` (default): `approx` comparisons for coordinates, with epsilons in real units.

#[macro_use]
pub mod datum;

mod cartesian;
mod error;
mod util;

pub mod ellipsoid;
pub mod geodetic;
pub mod geometry;
pub mod grid;
pub mod helmert;
pub mod projection;
pub mod transform;
pub mod wkt;

pub(crate) type Point3 = nalgebra::Point3<f64>;
pub(crate) type Vector3 = nalgebra::Vector3<f64>;
pub(crate) type Matrix3 = nalgebra::Matrix3<f64>;

pub use cartesian::Cartesian;
pub use datum::Datum;
pub use error::{ConvergenceError, DecodeError, Solve};
pub use geodetic::{Geographic, LonLat};
pub use grid::GridCoordinate;
pub use helmert::Helmert;
pub use transform::{transform, GridTransform, Tolerances};
pub use wkt::decode;
