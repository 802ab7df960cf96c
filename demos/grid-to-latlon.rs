use natgrid::datum::{Osgb36, Wgs84};
use natgrid::projection::BRITISH_NATIONAL_GRID;
use natgrid::{Cartesian, Geographic, GridCoordinate, GridTransform, Helmert, Tolerances};
use tracing_subscriber::EnvFilter;
use uom::si::f64::Length;
use uom::si::length::{meter, millimeter};

// a few well-known places, as the Ordnance Survey gazetteer gives them
const PLACES: &[(&str, f64, f64)] = &[
    ("Edinburgh Castle", 325_482., 673_143.),
    ("Trafalgar Square", 530_034., 180_381.),
    ("Caister Water Tower", 651_409.903, 313_177.270),
    ("Ben Nevis", 216_666., 771_288.),
    ("Land's End", 134_281., 25_360.),
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("natgrid=debug")),
        )
        .init();

    let bng: GridTransform = GridTransform::default();
    for &(name, easting, northing) in PLACES {
        let grid = GridCoordinate::from_meters(easting, northing);
        let wgs84 = bng.transform(grid).expect("all places are on the grid");
        println!("{name:>20}: {grid:.0} -> {wgs84:.5} ({wgs84:#.2})");
    }

    // the same thing, one step at a time, to see how far the datum shift moves things
    let tolerances = Tolerances::default();
    let grid = GridCoordinate::from_meters(325_482., 673_143.);
    let on_airy = BRITISH_NATIONAL_GRID
        .unproject(grid, &tolerances)
        .expect("on the grid");
    let osgb36 = Cartesian::<Osgb36>::from_geographic(&on_airy, Length::new::<meter>(0.));
    let wgs84: Cartesian<Wgs84> = osgb36 * Helmert::osgb36_to_wgs84();
    let on_wgs84 = wgs84.to_geographic(&tolerances).expect("near the surface");

    println!();
    println!("OSGB36 geographic: {on_airy:.6}");
    println!("OSGB36 Cartesian:  {osgb36:.2}");
    println!("WGS84 Cartesian:   {wgs84:.2}");
    println!("WGS84 geographic:  {on_wgs84:.6}");
    println!(
        "height above WGS84: {:.1} m",
        wgs84.ellipsoidal_height(&on_wgs84).get::<meter>()
    );
    println!(
        "moved {:.1} m along the ground",
        on_airy
            .haversine_distance_on_surface(&Geographic::<Osgb36>::from_degrees(
                on_wgs84.latitude_degrees(),
                on_wgs84.longitude_degrees()
            )
            .expect("latitude is in range"))
            .get::<meter>()
    );
    println!(
        "projecting back onto the grid lands {:.3} mm away",
        BRITISH_NATIONAL_GRID
            .project(&on_airy)
            .grid_distance_to(&grid)
            .get::<millimeter>()
    );
    println!(
        "undoing the shift lands {:.3} mm away",
        (Helmert::osgb36_to_wgs84() * wgs84)
            .distance_to(&osgb36)
            .get::<millimeter>()
    );
}
