use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::AppError, models::trip::Trip, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/trips/:username", get(trips))
}

/// Trip history as JSON, oldest first.
async fn trips(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let trips = state.store.history(&username).await?;
    Ok(Json(trips))
}
