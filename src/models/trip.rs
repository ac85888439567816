use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::coordinate::Coordinate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: i64,
    pub username: String,
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub distance: f64,
    pub toll: f64,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn start(&self) -> Coordinate {
        Coordinate {
            lat: self.start_lat,
            lon: self.start_lon,
        }
    }

    pub fn end(&self) -> Coordinate {
        Coordinate {
            lat: self.end_lat,
            lon: self.end_lon,
        }
    }
}

/// Values the caller supplies for a new trip; id and timestamp come from the
/// store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewTrip {
    pub start: Coordinate,
    pub end: Coordinate,
    pub distance_km: f64,
    pub toll: f64,
}
