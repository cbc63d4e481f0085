use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::auth::session_auth;

/// Guards protected pages. Expired sessions are discarded by
/// `session_auth::current`, so a stale cookie falls through to the login
/// redirect.
pub async fn require_auth(session: Session, request: Request, next: Next) -> Response {
    match session_auth::current(&session).await {
        Ok(Some(_auth)) => next.run(request).await,
        _ => Redirect::to("/login").into_response(),
    }
}

pub async fn redirect_if_authenticated(session: Session, request: Request, next: Next) -> Response {
    match session_auth::current(&session).await {
        Ok(Some(_auth)) => Redirect::to("/dashboard").into_response(),
        _ => next.run(request).await,
    }
}
