//! Decodes a batch of flood-warning area outlines, as a flood-warning service publishes them
//! (well-known text on the British National Grid), into GeoJSON a web map can draw.
//!
//! Each outline is independent, so they are decoded in parallel; a failure in one only affects
//! that one.

use natgrid::geometry::Geometry;
use natgrid::{DecodeError, GridTransform, LonLat};
use std::thread;
use tracing_subscriber::EnvFilter;

const AREAS: &[(&str, &str)] = &[
    (
        "Water of Leith at Canonmills",
        "POLYGON ((324800 675100, 324800 675600, 325600 675600, 325600 675100, 324800 675100))",
    ),
    (
        "River Thames at Westminster",
        "MULTIPOLYGON (((530000 179000, 530000 180000, 531000 180000, 531000 179000, 530000 179000), \
                        (530400 179400, 530600 179400, 530600 179600, 530400 179400)), \
                       ((529000 178000, 529000 178500, 529500 178500, 529000 178000)))",
    ),
    ("River Tay gauge", "POINT (311000 723000)"),
    ("River Don (truncated record)", "POLYGON ((394000 807000, 394500 807000"),
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("natgrid=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let bng: GridTransform = GridTransform::default();

    let decoded: Vec<(&str, Result<Geometry<LonLat>, DecodeError>)> = thread::scope(|s| {
        let handles: Vec<_> = AREAS
            .iter()
            .map(|&(name, wkt)| s.spawn(move || (name, bng.decode(wkt))))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("decoding does not panic"))
            .collect()
    });

    let mut features = Vec::new();
    for (name, geometry) in decoded {
        match geometry {
            Ok(geometry) => {
                eprintln!(
                    "{name}: {} polygon(s), {} vertices",
                    geometry.polygons().count(),
                    geometry.vertices().count()
                );
                features.push(serde_json::json!({
                    "type": "Feature",
                    "properties": { "name": name },
                    "geometry": geometry,
                }));
            }
            Err(e) => eprintln!("{name}: skipped: {e}"),
        }
    }

    let collection = serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&collection).expect("JSON values always serialize")
    );
}
