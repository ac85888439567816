use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    error::AppError,
    models::{
        coordinate::Coordinate,
        session::SessionContext,
        trip::{NewTrip, Trip},
    },
    services::{
        geocoder::{validate_address, Geocoder},
        tariff::{self, Tariff},
        trip_store::TripStore,
    },
};

#[derive(Debug, Clone, Default)]
pub struct SimulationRequest {
    pub username: Option<String>,
    pub start_address: String,
    pub end_address: String,
}

/// Everything the result page needs for one run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub start: Coordinate,
    pub end: Coordinate,
    pub distance_km: f64,
    pub toll: f64,
    pub estimated_hours: f64,
    pub recorded: Option<Trip>,
}

/// Geocodes both ends of a route, prices it and records the trip.
#[derive(Clone)]
pub struct SimulationService {
    geocoder: Arc<dyn Geocoder>,
    store: TripStore,
    tariff: Tariff,
}

impl SimulationService {
    pub fn new(geocoder: Arc<dyn Geocoder>, store: TripStore, tariff: Tariff) -> Self {
        Self {
            geocoder,
            store,
            tariff,
        }
    }

    pub fn tariff(&self) -> Tariff {
        self.tariff
    }

    pub fn store(&self) -> &TripStore {
        &self.store
    }

    #[instrument(skip_all, fields(session = %session.id))]
    pub async fn run(
        &self,
        session: &SessionContext,
        request: &SimulationRequest,
    ) -> Result<SimulationReport, AppError> {
        session.require_simulation()?;

        let start_address = validate_address(&request.start_address)?;
        let end_address = validate_address(&request.end_address)?;
        let username = request
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        if let Some(username) = username {
            self.store.ensure_user(username).await?;
        }

        let start = self.geocoder.resolve(start_address).await?;
        let end = self.geocoder.resolve(end_address).await?;

        let distance_km = tariff::distance_km(start, end);
        let toll = self.tariff.toll(distance_km);

        let recorded = match username {
            Some(username) => Some(
                self.store
                    .record_trip(
                        username,
                        NewTrip {
                            start,
                            end,
                            distance_km,
                            toll,
                        },
                    )
                    .await?,
            ),
            None => None,
        };

        info!(distance_km, toll, recorded = recorded.is_some(), "route simulated");

        Ok(SimulationReport {
            start,
            end,
            distance_km,
            toll,
            estimated_hours: tariff::estimated_hours(distance_km),
            recorded,
        })
    }
}
