use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    config::WelcomeImage, error::AppError, models::session::Screen, session::Session,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/start", post(start))
        .route("/identity", get(identity_form).post(identity_submit))
        .route("/health", get(health))
}

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    has_image: bool,
    image_src: String,
    image_missing: bool,
}

async fn landing(State(state): State<AppState>, session: Session) -> Response {
    if session.context.screen != Screen::Start {
        return session.redirect_to_current().into_response();
    }

    let (has_image, image_src, image_missing) = match &state.config.welcome_image {
        Some(WelcomeImage::Url(url)) => (true, url.to_string(), false),
        Some(WelcomeImage::Path(path)) => {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                (true, "/welcome-image".to_string(), false)
            } else {
                warn!("welcome image not found at {}", path.display());
                (false, String::new(), true)
            }
        }
        None => (false, String::new(), false),
    };

    LandingTemplate {
        has_image,
        image_src,
        image_missing,
    }
    .into_response()
}

async fn start(mut session: Session) -> Result<Response, AppError> {
    if session.context.begin().is_err() {
        return Ok(session.redirect_to_current().into_response());
    }
    let target = session.redirect_to_current();
    Ok((session.save()?, target).into_response())
}

#[derive(Template)]
#[template(path = "identity.html")]
struct IdentityTemplate {
    show_error: bool,
    error_message: String,
    identity: String,
}

async fn identity_form(session: Session) -> Response {
    if session.context.screen != Screen::IdentityCollected {
        return session.redirect_to_current().into_response();
    }
    IdentityTemplate {
        show_error: false,
        error_message: String::new(),
        identity: String::new(),
    }
    .into_response()
}

#[derive(Deserialize)]
struct IdentityForm {
    identity: String,
}

async fn identity_submit(
    mut session: Session,
    Form(form): Form<IdentityForm>,
) -> Result<Response, AppError> {
    match session.context.submit_identity(&form.identity) {
        Ok(()) => {
            info!(session = %session.context.id, "identity collected");
            let target = session.redirect_to_current();
            Ok((session.save()?, target).into_response())
        }
        Err(err @ AppError::InvalidInput(_)) => Ok(render_identity_error(
            form.identity,
            err.user_message(),
        )),
        Err(AppError::InvalidTransition) => Ok(session.redirect_to_current().into_response()),
        Err(err) => Err(err),
    }
}

fn render_identity_error(identity: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        IdentityTemplate {
            show_error: true,
            error_message: message,
            identity,
        }
        .into_response(),
    )
        .into_response()
}

async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.store.ping().await?;
    Ok("ok")
}
