use crate::models::coordinate::Coordinate;

/// Currency units charged per kilometre.
pub const DEFAULT_RATE_PER_KM: f64 = 0.1;
/// Average speed used for the travel time estimate, in km/h.
pub const AVERAGE_SPEED_KMH: f64 = 100.0;

const EARTH_MEAN_RADIUS_KM: f64 = 6371.0088;

/// Haversine great-circle distance in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_MEAN_RADIUS_KM * h.sqrt().asin()
}

/// Linear distance tariff. Amounts are never rounded here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tariff {
    rate_per_km: f64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            rate_per_km: DEFAULT_RATE_PER_KM,
        }
    }
}

impl Tariff {
    pub fn new(rate_per_km: f64) -> Self {
        Self { rate_per_km }
    }

    pub fn rate_per_km(&self) -> f64 {
        self.rate_per_km
    }

    pub fn toll(&self, distance_km: f64) -> f64 {
        distance_km * self.rate_per_km
    }
}

/// Toll at the default rate.
pub fn toll(distance_km: f64) -> f64 {
    Tariff::default().toll(distance_km)
}

pub fn estimated_hours(distance_km: f64) -> f64 {
    distance_km / AVERAGE_SPEED_KMH
}
