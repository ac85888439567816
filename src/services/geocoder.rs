use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{config::GeocoderConfig, error::AppError, models::coordinate::Coordinate};

/// Turns a free-text address into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `address`. Blank input is rejected before any lookup.
    async fn resolve(&self, address: &str) -> Result<Coordinate, AppError>;
}

/// Rejects empty or whitespace-only addresses.
pub fn validate_address(address: &str) -> Result<&str, AppError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Please enter an address.".into()));
    }
    Ok(trimmed)
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Client for the Nominatim `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    search_url: Url,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| AppError::Config(format!("cannot build geocoder client: {err}")))?;

        let mut base = config.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let search_url = base
            .join("search")
            .map_err(|err| AppError::Config(format!("invalid geocoder url: {err}")))?;

        Ok(Self { client, search_url })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, address: &str) -> Result<Coordinate, AppError> {
        let query = validate_address(address)?;

        let res = self
            .client
            .get(self.search_url.clone())
            .header(header::ACCEPT, "application/json")
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(unavailable)?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::GeocodeUnavailable("rate limited".into()));
        } else if !status.is_success() {
            warn!(%status, "geocoder returned an error status");
            return Err(AppError::GeocodeUnavailable(format!("status {status}")));
        }

        let places: Vec<Place> = res.json().await.map_err(unavailable)?;
        let Some(place) = places.into_iter().next() else {
            debug!("no match");
            return Err(AppError::GeocodeNotFound(query.to_string()));
        };

        let coordinate = parse_place(&place)?;
        debug!(
            matched = place.display_name.as_deref().unwrap_or(""),
            %coordinate,
            "resolved"
        );
        Ok(coordinate)
    }
}

fn parse_place(place: &Place) -> Result<Coordinate, AppError> {
    let lat = place.lat.trim().parse::<f64>();
    let lon = place.lon.trim().parse::<f64>();
    match (lat, lon) {
        (Ok(lat), Ok(lon)) => Coordinate::new(lat, lon).map_err(|_| {
            AppError::GeocodeUnavailable(format!("provider returned invalid coordinates {lat}, {lon}"))
        }),
        _ => Err(AppError::GeocodeUnavailable(format!(
            "provider returned unparsable coordinates {:?}, {:?}",
            place.lat, place.lon
        ))),
    }
}

fn unavailable(err: reqwest::Error) -> AppError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else if err.is_decode() {
        "malformed response".to_string()
    } else {
        err.to_string()
    };
    warn!("geocoding failed: {reason}");
    AppError::GeocodeUnavailable(reason)
}
