use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use tracing::debug;

use crate::{error::AppError, models::session::SessionContext};

pub const SESSION_COOKIE: &str = "toll_session";

/// Session context read from the encrypted session cookie. A missing or
/// unreadable cookie starts a fresh session on the welcome screen.
pub struct Session {
    pub context: SessionContext,
    jar: PrivateCookieJar,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|never| -> AppError { match never {} })?;
        let context = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| serde_json::from_str::<SessionContext>(cookie.value()).ok())
            .unwrap_or_else(|| {
                debug!("starting new session");
                SessionContext::new()
            });
        Ok(Self { context, jar })
    }
}

impl Session {
    /// Writes the (possibly advanced) context back into the cookie jar.
    pub fn save(self) -> Result<PrivateCookieJar, AppError> {
        let value =
            serde_json::to_string(&self.context).map_err(|err| AppError::Other(err.into()))?;
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        Ok(self.jar.add(cookie))
    }

    /// Redirect to the page of the screen this session is on.
    pub fn redirect_to_current(&self) -> Redirect {
        Redirect::to(self.context.screen.path())
    }
}
