use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no location found for \"{0}\"")]
    GeocodeNotFound(String),
    #[error("geocoding service unavailable: {0}")]
    GeocodeUnavailable(String),
    #[error("unknown user \"{0}\"")]
    UnknownUser(String),
    #[error("session is not on the expected screen")]
    InvalidTransition,
    #[error("trip store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Errors the session flow turns into a message on the form instead of
    /// failing the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_)
                | AppError::GeocodeNotFound(_)
                | AppError::GeocodeUnavailable(_)
                | AppError::UnknownUser(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::GeocodeNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::GeocodeUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UnknownUser(_) | AppError::InvalidTransition => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::StoreUnavailable(_)
            | AppError::Io(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the user next to the simulation form.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::GeocodeNotFound(address) => format!(
                "Could not find \"{address}\". Please check the address and try again."
            ),
            AppError::GeocodeUnavailable(_) => {
                "Geocoding service is unavailable. Please try again later.".into()
            }
            AppError::UnknownUser(_) => {
                "The trip could not be saved for this username. Please try again.".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_kinds_are_the_user_facing_ones() {
        assert!(AppError::InvalidInput("blank".into()).is_recoverable());
        assert!(AppError::GeocodeNotFound("x".into()).is_recoverable());
        assert!(AppError::GeocodeUnavailable("timeout".into()).is_recoverable());
        assert!(AppError::UnknownUser("bob".into()).is_recoverable());
        assert!(!AppError::StoreUnavailable(sqlx::Error::PoolClosed).is_recoverable());
        assert!(!AppError::InvalidTransition.is_recoverable());
    }

    #[test]
    fn store_failures_map_to_server_error() {
        let err = AppError::StoreUnavailable(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::GeocodeUnavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn unavailable_message_advises_retry() {
        let msg = AppError::GeocodeUnavailable("timeout".into()).user_message();
        assert!(msg.contains("try again later"));
        let msg = AppError::GeocodeNotFound("Atlantis".into()).user_message();
        assert!(msg.contains("Atlantis"));
    }
}
