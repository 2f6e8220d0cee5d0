//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use satyashodh_core::{
    auth::{AuthState, GateDecision, Principal, ENTRY_PATH},
    ports::PortError,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::web::auth::{session_id_from_headers, wants_html};
use crate::web::state::AppState;

/// Middleware that resolves the auth session cookie into an [`AuthState`] and gates the route.
///
/// When allowed, the user id is inserted into the request extensions for handlers to use.
/// Otherwise browsers are redirected to the entry page and API clients get `401`.
/// A store failure while checking the session is a `500`, not a sign-out.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let auth_session_id = session_id_from_headers(req.headers()).map(str::to_owned);
    let auth = match resolve_auth_state(&state, auth_session_id.as_deref()).await {
        Ok(auth) => auth,
        Err(status) => return status.into_response(),
    };

    match auth.gate() {
        GateDecision::Allow(user_id) => {
            req.extensions_mut().insert(user_id);
            next.run(req).await
        }
        GateDecision::RedirectToEntry if wants_html(req.headers()) => {
            Redirect::to(ENTRY_PATH).into_response()
        }
        GateDecision::RedirectToEntry => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn resolve_auth_state(
    state: &AppState,
    auth_session_id: Option<&str>,
) -> Result<AuthState, StatusCode> {
    let Some(auth_session_id) = auth_session_id else {
        return Ok(AuthState::default());
    };

    let user_id = match state.db.validate_auth_session(auth_session_id).await {
        Ok(user_id) => user_id,
        Err(PortError::Unauthorized | PortError::NotFound(_)) => {
            debug!("Auth session is unknown or expired");
            return Ok(AuthState::default());
        }
        Err(e) => {
            error!("Failed to validate auth session: {:?}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match state.db.get_user_profile(user_id).await {
        Ok(profile) => Ok(AuthState::default().sign_in(Principal::from(&profile))),
        Err(PortError::NotFound(_)) => {
            warn!(%user_id, "Session belongs to a user with no profile");
            Ok(AuthState::default())
        }
        Err(e) => {
            error!(%user_id, "Failed to load the session's profile: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
