//! Great-circle distance and proximity fencing.
//!
//! Two fences share this code with very different trust levels: a loose
//! 500 m sanity bound on coordinates a client submits for a court, and
//! the tight 20 m in-person fence for live check-ins.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and inside the valid lat/lon ranges. Callers must reject
    /// coordinates failing this before computing distances.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}

/// Haversine great-circle distance in meters.
pub fn distance_meters(a: Coord, b: Coord) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// True when `point` lies within `threshold_m` meters of `reference`.
pub fn within_fence(point: Coord, reference: Coord, threshold_m: f64) -> bool {
    distance_meters(point, reference) <= threshold_m
}
