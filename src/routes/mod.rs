pub mod api;
pub mod public;
pub mod simulation;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{config::WelcomeImage, state::AppState};

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(public::router())
        .merge(simulation::router())
        .nest("/api", api::router());

    if let Some(WelcomeImage::Path(path)) = &state.config.welcome_image {
        router = router.route_service("/welcome-image", ServeFile::new(path));
    }

    router
        .nest_service("/static", ServeDir::new(&state.config.static_root))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
