use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use tracing::warn;

use crate::{
    error::AppError,
    models::trip::Trip,
    services::simulation::{SimulationReport, SimulationRequest},
    session::Session,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/simulation", get(simulation_form).post(simulation_submit))
        .route("/history", get(history))
}

#[derive(Template)]
#[template(path = "simulation.html")]
struct SimulationTemplate {
    identity: String,
    rate: String,
    username: String,
    start_address: String,
    end_address: String,
    show_error: bool,
    error_message: String,
    has_report: bool,
    report: ReportView,
}

/// Report values formatted for display; the map data is embedded as JSON.
#[derive(Clone, Default)]
struct ReportView {
    distance: String,
    toll: String,
    hours: String,
    recorded: bool,
    map_json: String,
}

#[derive(Serialize)]
struct MapData<'a> {
    center: [f64; 2],
    start: [f64; 2],
    end: [f64; 2],
    start_label: &'a str,
    end_label: &'a str,
}

impl ReportView {
    fn build(
        report: &SimulationReport,
        start_label: &str,
        end_label: &str,
    ) -> Result<Self, AppError> {
        let center = report.start.midpoint(&report.end);
        let map = MapData {
            center: [center.lat, center.lon],
            start: [report.start.lat, report.start.lon],
            end: [report.end.lat, report.end.lon],
            start_label,
            end_label,
        };
        let map_json = serde_json::to_string(&map)
            .map_err(|err| AppError::Other(err.into()))?
            .replace('<', "\\u003c");
        Ok(Self {
            distance: format!("{:.2} km", report.distance_km),
            toll: format_money(report.toll),
            hours: format!("{:.2} hours", report.estimated_hours),
            recorded: report.recorded.is_some(),
            map_json,
        })
    }
}

async fn simulation_form(State(state): State<AppState>, session: Session) -> Response {
    let Ok(identity) = session.context.require_simulation() else {
        return session.redirect_to_current().into_response();
    };
    SimulationTemplate {
        identity: identity.to_string(),
        rate: format_rate(&state),
        username: String::new(),
        start_address: String::new(),
        end_address: String::new(),
        show_error: false,
        error_message: String::new(),
        has_report: false,
        report: ReportView::default(),
    }
    .into_response()
}

#[serde_as]
#[derive(Deserialize)]
struct SimulationForm {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
}

async fn simulation_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SimulationForm>,
) -> Result<Response, AppError> {
    let Ok(identity) = session.context.require_simulation() else {
        return Ok(session.redirect_to_current().into_response());
    };
    let identity = identity.to_string();

    let request = SimulationRequest {
        username: form.username,
        start_address: form.start_address,
        end_address: form.end_address,
    };

    let mut page = SimulationTemplate {
        identity,
        rate: format_rate(&state),
        username: request.username.clone().unwrap_or_default(),
        start_address: request.start_address.clone(),
        end_address: request.end_address.clone(),
        show_error: false,
        error_message: String::new(),
        has_report: false,
        report: ReportView::default(),
    };

    match state.simulation.run(&session.context, &request).await {
        Ok(report) => {
            page.report = ReportView::build(
                &report,
                &format!("Start: {}", request.start_address.trim()),
                &format!("End: {}", request.end_address.trim()),
            )?;
            page.has_report = true;
            Ok(page.into_response())
        }
        Err(err) if err.is_recoverable() => {
            warn!("simulation rejected: {err}");
            let status = err.status();
            page.show_error = true;
            page.error_message = err.user_message();
            Ok((status, page).into_response())
        }
        Err(err) => Err(err),
    }
}

#[serde_as]
#[derive(Deserialize)]
struct HistoryQuery {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    username: Option<String>,
}

#[derive(Clone)]
struct TripRow {
    created_at: String,
    start: String,
    end: String,
    distance: String,
    toll: String,
}

#[derive(Serialize)]
struct TollPoint {
    created_at: DateTime<Utc>,
    toll: f64,
}

#[derive(Template)]
#[template(path = "history.html")]
struct HistoryTemplate {
    has_username: bool,
    username: String,
    trips: Vec<TripRow>,
    total_toll: String,
    series_json: String,
}

async fn history(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, AppError> {
    if session.context.require_simulation().is_err() {
        return Ok(session.redirect_to_current().into_response());
    }

    let username = query
        .username
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    let Some(username) = username else {
        return Ok(HistoryTemplate {
            has_username: false,
            username: String::new(),
            trips: Vec::new(),
            total_toll: format_money(0.0),
            series_json: "[]".into(),
        }
        .into_response());
    };

    let trips = state.store.history(&username).await?;
    let total: f64 = trips.iter().map(|trip| trip.toll).sum();
    let series: Vec<TollPoint> = trips
        .iter()
        .map(|trip| TollPoint {
            created_at: trip.created_at,
            toll: trip.toll,
        })
        .collect();
    let series_json = serde_json::to_string(&series)
        .map_err(|err| AppError::Other(err.into()))?
        .replace('<', "\\u003c");

    Ok(HistoryTemplate {
        has_username: true,
        username,
        trips: trips.iter().map(trip_row).collect(),
        total_toll: format_money(total),
        series_json,
    }
    .into_response())
}

fn trip_row(trip: &Trip) -> TripRow {
    TripRow {
        created_at: format_timestamp(trip.created_at),
        start: trip.start().to_string(),
        end: trip.end().to_string(),
        distance: format!("{:.2} km", trip.distance),
        toll: format_money(trip.toll),
    }
}

fn format_rate(state: &AppState) -> String {
    format!("{} per km", format_money(state.simulation.tariff().rate_per_km()))
}

fn format_money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%d.%m.%Y %H:%M")
        .to_string()
}
