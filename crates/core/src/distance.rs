use geo::{Distance, Geodesic, Point};

use crate::models::Coordinate;

/// Geodesic distance on the WGS84 ellipsoid, in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let from = Point::new(a.lon, a.lat);
    let to = Point::new(b.lon, b.lat);
    Geodesic::distance(from, to) / 1000.0
}
