//! Session persistence for the authenticated user and the pending login flow.
//!
//! The cookie layer handles transport; this module owns the 24-hour expiry
//! rule: a stored `AuthSession` whose `expires_at` has passed is removed and
//! treated as absent.

use chrono::Utc;
use tower_sessions::Session;

use crate::auth::flow::LoginFlow;
use crate::models::session::AuthSession;
use crate::models::user::User;

pub const AUTH_SESSION_KEY: &str = "auth_session";
pub const LOGIN_FLOW_KEY: &str = "login_flow";

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Restores the persisted session, discarding it when past expiry.
pub async fn current(session: &Session) -> SessionResult<Option<AuthSession>> {
    let stored: Option<AuthSession> = session.get(AUTH_SESSION_KEY).await?;

    match stored {
        Some(auth) if auth.is_expired(Utc::now()) => {
            session.remove::<AuthSession>(AUTH_SESSION_KEY).await?;
            Ok(None)
        }
        other => Ok(other),
    }
}

/// Persists a fresh session with the fixed 24-hour expiry and clears any
/// pending login flow.
pub async fn login(session: &Session, user: User, token: String) -> SessionResult<AuthSession> {
    let auth = AuthSession::new(user, token, Utc::now());
    session.insert(AUTH_SESSION_KEY, auth.clone()).await?;
    session.remove::<LoginFlow>(LOGIN_FLOW_KEY).await?;
    Ok(auth)
}

/// Clears persisted and in-memory state.
pub async fn logout(session: &Session) -> SessionResult<()> {
    session.flush().await
}

pub async fn load_flow(session: &Session) -> SessionResult<LoginFlow> {
    Ok(session.get(LOGIN_FLOW_KEY).await?.unwrap_or_default())
}

pub async fn store_flow(session: &Session, flow: &LoginFlow) -> SessionResult<()> {
    match flow {
        // The credentials step carries no state worth persisting.
        LoginFlow::Credentials | LoginFlow::Authenticated => {
            session.remove::<LoginFlow>(LOGIN_FLOW_KEY).await?;
            Ok(())
        }
        LoginFlow::Verification(_) => session.insert(LOGIN_FLOW_KEY, flow).await,
    }
}
