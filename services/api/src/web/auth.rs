//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use satyashodh_core::{
    auth::ENTRY_PATH,
    ports::PortError,
    validation, UserProfile,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::web::state::AppState;

/// Name of the cookie carrying the auth session id.
pub const SESSION_COOKIE: &str = "session";

const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<&UserProfile> for AuthResponse {
    fn from(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
        }
    }
}

//=========================================================================================
// Cookie Helpers
//=========================================================================================

/// Builds the `Set-Cookie` value for a fresh auth session.
pub fn session_cookie(session_id: &str, ttl_days: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session_id,
        Duration::days(ttl_days).num_seconds()
    )
}

fn cleared_cookie() -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Reads the auth session id out of the request's `Cookie` header.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (name, value) = c.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
}

/// True when the client is a browser navigating to a page rather than calling the API.
pub fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn normalize_email(email: &str) -> Result<String, (StatusCode, String)> {
    let email = validation::require_text("Email", email)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(email.to_lowercase())
        }
        _ => Err((StatusCode::BAD_REQUEST, "Invalid email address.".to_string())),
    }
}

async fn start_session(
    state: &AppState,
    user_id: Uuid,
) -> Result<String, (StatusCode, String)> {
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_ttl_days);

    state
        .db
        .create_auth_session(&auth_session_id, user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
        })?;

    Ok(session_cookie(&auth_session_id, state.config.session_ttl_days))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid email or password too short"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let email = normalize_email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Password must be at least {} characters.", MIN_PASSWORD_LEN),
        ));
    }
    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create the user and its profile
    let profile = state
        .db
        .create_user_with_email(&email, &password_hash, display_name)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => (
                StatusCode::CONFLICT,
                "An account with this email already exists.".to_string(),
            ),
            other => {
                error!("Failed to create user: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user".to_string())
            }
        })?;
    state.db.upsert_user_profile(&profile).await.map_err(|e| {
        error!("Failed to save user profile: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user".to_string())
    })?;

    // 3. Open the session
    let cookie = start_session(&state, profile.user_id).await?;
    info!(user_id = %profile.user_id, "User signed up");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(&profile)),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string());
    let email = normalize_email(&req.email).map_err(|_| invalid())?;

    // 1. Get user by email
    let user_creds = state.db.get_user_by_email(&email).await.map_err(|e| {
        warn!("Login failed for unknown user: {:?}", e);
        invalid()
    })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    // 3. Make sure the profile exists (created on first sign-in)
    let profile = match state.db.get_user_profile(user_creds.user_id).await {
        Ok(profile) => profile,
        Err(PortError::NotFound(_)) => {
            let profile = UserProfile {
                user_id: user_creds.user_id,
                email: user_creds.email.clone(),
                display_name: None,
                photo_url: None,
                created_at: Utc::now(),
            };
            state.db.upsert_user_profile(&profile).await.map_err(|e| {
                error!("Failed to create user profile: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
            })?;
            profile
        }
        Err(e) => {
            error!("Failed to load user profile: {:?}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string()));
        }
    };

    // 4. Open the session
    let cookie = start_session(&state, user_creds.user_id).await?;
    info!(user_id = %user_creds.user_id, "User logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(&profile)),
    ))
}

/// POST /auth/logout - Logout and invalidate session
///
/// Browsers are sent back to the entry page; API clients get `204`.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logout successful"),
        (status = 303, description = "Logout successful, redirected to the entry page"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, String)> {
    if let Some(auth_session_id) = session_id_from_headers(&headers) {
        state
            .db
            .delete_auth_session(auth_session_id)
            .await
            .map_err(|e| {
                error!("Failed to delete auth session: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
            })?;
    }

    let cookie = [(header::SET_COOKIE, cleared_cookie())];
    if wants_html(&headers) {
        Ok((cookie, Redirect::to(ENTRY_PATH)).into_response())
    } else {
        Ok((StatusCode::NO_CONTENT, cookie).into_response())
    }
}
