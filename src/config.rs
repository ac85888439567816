use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use url::Url;

use crate::{error::AppError, services::tariff::DEFAULT_RATE_PER_KM};

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "my_toll_app";
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub cookie_secret: String,
    pub geocoder: GeocoderConfig,
    pub rate_per_km: f64,
    pub welcome_image: Option<WelcomeImage>,
    pub static_root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: Url,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_GEOCODER_URL).expect("default geocoder url is valid"),
            user_agent: DEFAULT_GEOCODER_USER_AGENT.into(),
            timeout: Duration::from_secs(DEFAULT_GEOCODER_TIMEOUT_SECS),
        }
    }
}

/// Decorative image on the welcome screen, either served from disk or
/// linked from elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeImage {
    Path(PathBuf),
    Url(Url),
}

impl WelcomeImage {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(Self::Url(url)),
            _ => Some(Self::Path(PathBuf::from(raw))),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://toll_system.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-toll-simulation-cookie-secret".to_string());

        let base_url = env::var("GEOCODER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|err| AppError::Config(format!("invalid GEOCODER_BASE_URL: {err}")))?;
        let user_agent = env::var("GEOCODER_USER_AGENT")
            .unwrap_or_else(|_| DEFAULT_GEOCODER_USER_AGENT.to_string());
        let timeout_secs = match env::var("GEOCODER_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|err| AppError::Config(format!("invalid GEOCODER_TIMEOUT_SECS: {err}")))?,
            Err(_) => DEFAULT_GEOCODER_TIMEOUT_SECS,
        };

        let rate_per_km = match env::var("TOLL_RATE_PER_KM") {
            Ok(raw) => parse_rate(&raw)?,
            Err(_) => DEFAULT_RATE_PER_KM,
        };

        let welcome_image = env::var("WELCOME_IMAGE")
            .ok()
            .and_then(|raw| WelcomeImage::parse(&raw));

        let static_root = env::var("STATIC_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static"));

        Ok(Self {
            database_url,
            listen_addr,
            cookie_secret,
            geocoder: GeocoderConfig {
                base_url,
                user_agent,
                timeout: Duration::from_secs(timeout_secs),
            },
            rate_per_km,
            welcome_image,
            static_root,
        })
    }
}

fn parse_rate(raw: &str) -> Result<f64, AppError> {
    let rate: f64 = raw
        .parse()
        .map_err(|err| AppError::Config(format!("invalid TOLL_RATE_PER_KM: {err}")))?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(AppError::Config(
            "TOLL_RATE_PER_KM must be a non-negative number".into(),
        ));
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_image_distinguishes_urls_from_paths() {
        assert_eq!(
            WelcomeImage::parse("https://example.org/road.jpg"),
            Some(WelcomeImage::Url(
                Url::parse("https://example.org/road.jpg").unwrap()
            ))
        );
        assert_eq!(
            WelcomeImage::parse("assets/road.jpeg"),
            Some(WelcomeImage::Path(PathBuf::from("assets/road.jpeg")))
        );
        assert_eq!(WelcomeImage::parse("   "), None);
    }

    #[test]
    fn windows_paths_are_not_urls() {
        assert!(matches!(
            WelcomeImage::parse(r"C:\Users\someone\image.jpeg"),
            Some(WelcomeImage::Path(_))
        ));
    }

    #[test]
    fn rate_must_be_non_negative() {
        assert!(parse_rate("0.25").is_ok());
        assert!(parse_rate("-1").is_err());
        assert!(parse_rate("NaN").is_err());
        assert!(parse_rate("cheap").is_err());
    }
}
