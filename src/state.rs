use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        geocoder::Geocoder,
        simulation::SimulationService,
        tariff::Tariff,
        trip_store::TripStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: TripStore,
    pub simulation: SimulationService,
    pub cookie_key: Key,
}

impl AppState {
    /// The geocoder is built once by the caller and shared by every request.
    pub fn new(config: AppConfig, db: DbPool, geocoder: Arc<dyn Geocoder>) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        let store = TripStore::new(db);
        let simulation =
            SimulationService::new(geocoder, store.clone(), Tariff::new(config.rate_per_km));
        Self {
            config,
            store,
            simulation,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
