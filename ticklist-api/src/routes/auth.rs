/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register a new user
/// - `POST /auth/login` - Login and get a token
/// - `GET /auth/me` - Current user profile (Bearer token required)
/// - `POST /auth/logout` - Stateless logout (Bearer token required)
///
/// Login is side-effect free: no row is written on a successful or failed
/// attempt, and the server keeps no record of issued tokens.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use ticklist_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User},
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (minimum length checked separately)
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Newly created user ID
    pub subject_id: Uuid,

    /// Access token (24h)
    pub token: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (24h)
    pub token: String,

    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Current-user response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Authenticated user ID
    pub subject_id: Uuid,

    /// Account email
    pub email: String,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Instruction for the client
    pub message: String,
}

/// Register a new user
///
/// Creates a user account and immediately issues a token so the client can
/// skip a separate login round-trip.
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {"email": "user@example.com", "password": "secret123"}
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already registered (store-level unique constraint)
/// - `422 Unprocessable Entity`: Invalid email or too-short password
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![crate::error::ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    // Duplicate emails surface as a unique-constraint violation, which the
    // error layer maps to 409. No pre-check, so no lookup/insert race.
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
        },
    )
    .await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            subject_id: user.id,
            token,
        }),
    ))
}

/// Login endpoint
///
/// Verifies the credentials and issues a token with a 24-hour horizon.
///
/// Unknown email and wrong password produce byte-identical responses, and
/// the unknown-email path still runs an Argon2 verification against a dummy
/// hash so the two failures have the same latency profile.
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {"email": "user@example.com", "password": "secret123"}
/// ```
///
/// # Errors
///
/// - `401 Unauthorized` (`invalid_credentials`): Email unknown or password mismatch
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = match User::find_by_email(&state.db, &req.email).await? {
        Some(user) => user,
        None => {
            password::verify_dummy(&req.password);
            return Err(ApiError::InvalidCredentials);
        }
    };

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let claims = jwt::Claims::new(user.id);
    let expires_in = claims
        .seconds_until_expiration()
        .unwrap_or(jwt::token_ttl().num_seconds());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(LoginResponse { token, expires_in }))
}

/// Current-user endpoint
///
/// Returns the profile for the token's subject. Clients use this to verify
/// a stored token on startup.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing/invalid/expired token (middleware)
/// - `404 Not Found`: Token is valid but the account was deleted
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.subject)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        subject_id: user.id,
        email: user.email,
    }))
}

/// Logout endpoint (stateless)
///
/// The server holds no session state and no token blacklist; the token
/// stays valid until its expiry instant. This endpoint exists so clients
/// have an authenticated hook for their own cleanup.
pub async fn logout(Extension(auth): Extension<AuthContext>) -> ApiResult<Json<LogoutResponse>> {
    tracing::debug!(user_id = %auth.subject, "User logged out");

    Ok(Json(LogoutResponse {
        message: "Logout successful. Delete the token from client storage.".to_string(),
    }))
}
