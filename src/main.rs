use std::sync::Arc;

use tokio::net::TcpListener;
use tollsim::config::AppConfig;
use tollsim::db::{init_pool, run_migrations};
use tollsim::error::AppError;
use tollsim::routes::create_router;
use tollsim::services::geocoder::NominatimGeocoder;
use tollsim::state::AppState;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;

    if let Err(err) = run_migrations(&db).await {
        error!("migration failed: {err:?}");
        return Err(err);
    }

    let geocoder = Arc::new(NominatimGeocoder::new(&config.geocoder)?);
    info!(
        "geocoding via {} (timeout {:?})",
        geocoder.search_url(),
        config.geocoder.timeout
    );

    let state = AppState::new(config.clone(), db, geocoder);
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tollsim=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
