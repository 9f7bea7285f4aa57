//! Great-circle math on a spherical Earth
//!
//! Distances use the haversine formula; intermediate points are found by
//! spherical linear interpolation through Cartesian unit vectors.

use serde::{Deserialize, Serialize};

/// Earth radius used for all distance calculations, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// A point on the globe with an altitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, -90..=90
    #[serde(rename = "latitude")]
    pub lat: f64,
    /// Longitude in degrees, -180..=180
    #[serde(rename = "longitude")]
    pub lon: f64,
    /// Altitude in meters
    pub altitude: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64, altitude: f64) -> Self {
        Self { lat, lon, altitude }
    }

    /// Whether latitude and longitude are inside their bounds (NaN is not)
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

fn haversine(theta: f64) -> f64 {
    (theta / 2.0).sin().powi(2)
}

/// Central angle between two points in radians
fn central_angle(a: &Coordinate, b: &Coordinate) -> f64 {
    let (la1, lo1) = (a.lat.to_radians(), a.lon.to_radians());
    let (la2, lo2) = (b.lat.to_radians(), b.lon.to_radians());

    let h = haversine(la2 - la1) + la1.cos() * la2.cos() * haversine(lo2 - lo1);
    // rounding can push h a hair above 1 for near-antipodal points
    2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Great-circle distance between two points in kilometres
///
/// Altitude is ignored.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    EARTH_RADIUS_KM * central_angle(a, b)
}

/// Point at `fraction` of the great-circle arc from `a` to `b`
///
/// `fraction` 0 gives `a`, 1 gives `b`. Altitude is interpolated linearly.
/// Antipodal endpoints have no unique arc and produce NaN.
pub fn interpolate(a: &Coordinate, b: &Coordinate, fraction: f64) -> Coordinate {
    if fraction == 0.0 {
        return *a;
    }
    if fraction == 1.0 {
        return *b;
    }

    let altitude = a.altitude + (b.altitude - a.altitude) * fraction;
    let delta = central_angle(a, b);
    if delta == 0.0 {
        return Coordinate::new(a.lat, a.lon, altitude);
    }

    let (la1, lo1) = (a.lat.to_radians(), a.lon.to_radians());
    let (la2, lo2) = (b.lat.to_radians(), b.lon.to_radians());

    let weight_a = ((1.0 - fraction) * delta).sin() / delta.sin();
    let weight_b = (fraction * delta).sin() / delta.sin();

    let x = weight_a * la1.cos() * lo1.cos() + weight_b * la2.cos() * lo2.cos();
    let y = weight_a * la1.cos() * lo1.sin() + weight_b * la2.cos() * lo2.sin();
    let z = weight_a * la1.sin() + weight_b * la2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);

    Coordinate::new(lat.to_degrees(), lon.to_degrees(), altitude)
}
