use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument};

use crate::{
    db::DbPool,
    error::AppError,
    models::trip::{NewTrip, Trip},
};

/// Users and their trips in SQLite. Every method holds a pooled connection
/// or transaction only for its own duration.
#[derive(Clone)]
pub struct TripStore {
    db: DbPool,
}

impl TripStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }

    /// Registers `username` unless it already exists.
    #[instrument(skip(self))]
    pub async fn ensure_user(&self, username: &str) -> Result<(), AppError> {
        let username = normalize_username(username)?;
        let mut tx = self.db.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO users (username) VALUES (?1) ON CONFLICT(username) DO NOTHING",
        )
        .bind(username)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;
        if inserted > 0 {
            debug!("registered new user");
        }
        Ok(())
    }

    /// Stores one trip for an already registered user.
    #[instrument(skip(self, trip), fields(distance_km = trip.distance_km, toll = trip.toll))]
    pub async fn record_trip(&self, username: &str, trip: NewTrip) -> Result<Trip, AppError> {
        let username = normalize_username(username)?;
        validate_amount("distance", trip.distance_km)?;
        validate_amount("toll", trip.toll)?;

        let mut tx = self.db.begin().await?;
        // Single statement: the owner lookup and the insert cannot be split
        // by a concurrent writer, and no row appears for an unknown user.
        let row = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"INSERT INTO trips (user_id, start_lat, start_lon, end_lat, end_lon, distance, toll)
               SELECT id, ?2, ?3, ?4, ?5, ?6, ?7 FROM users WHERE username = ?1
               RETURNING id, created_at"#,
        )
        .bind(username)
        .bind(trip.start.lat)
        .bind(trip.start.lon)
        .bind(trip.end.lat)
        .bind(trip.end.lon)
        .bind(trip.distance_km)
        .bind(trip.toll)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((id, created_at)) = row else {
            error!("trip recorded for a user that was never registered");
            return Err(AppError::UnknownUser(username.to_string()));
        };
        tx.commit().await?;

        Ok(Trip {
            id,
            username: username.to_string(),
            start_lat: trip.start.lat,
            start_lon: trip.start.lon,
            end_lat: trip.end.lat,
            end_lon: trip.end.lon,
            distance: trip.distance_km,
            toll: trip.toll,
            created_at,
        })
    }

    /// Trips of `username` in the order they were recorded. Unknown users
    /// simply have none.
    #[instrument(skip(self))]
    pub async fn history(&self, username: &str) -> Result<Vec<Trip>, AppError> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"SELECT trips.id, users.username, trips.start_lat, trips.start_lon,
                      trips.end_lat, trips.end_lon, trips.distance, trips.toll, trips.created_at
               FROM trips
               JOIN users ON trips.user_id = users.id
               WHERE users.username = ?1
               ORDER BY trips.id ASC"#,
        )
        .bind(username.trim())
        .fetch_all(&self.db)
        .await?;
        Ok(trips)
    }

    pub async fn user_count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

fn normalize_username(username: &str) -> Result<&str, AppError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Please enter a username.".into()));
    }
    Ok(trimmed)
}

fn validate_amount(name: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "{name} must be a non-negative number"
        )));
    }
    Ok(())
}
