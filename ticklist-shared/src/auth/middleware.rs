/// Authentication middleware for Axum
///
/// Extracts the Bearer token from the `Authorization` header, validates it,
/// and adds an [`AuthContext`] to the request extensions. A request that
/// fails any step is rejected with 401 before it reaches a handler: no
/// handler code and no database query runs for an unauthenticated request.
///
/// # Failure taxonomy
///
/// Every rejection is a 401, but each carries a distinct machine-readable
/// code in the JSON body so clients can react appropriately:
///
/// - `token_missing`: no `Authorization: Bearer` header was presented
/// - `token_invalid`: the token is malformed, has a bad signature, or is
///   missing required claims
/// - `token_expired`: the signature is valid but the expiry instant passed
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use ticklist_shared::auth::middleware::{bearer_auth_layer, AuthContext};
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.subject)
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn(bearer_auth_layer("your-signing-secret")));
/// ```
use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Authentication context added to request extensions
///
/// Holds the subject identifier decoded from the verified token. It is
/// inserted once by the middleware and never mutated afterwards; handlers
/// must scope every query by `subject` and must not accept a client-supplied
/// user id in its place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID (token `sub` claim)
    pub subject: Uuid,
}

impl AuthContext {
    /// Creates an auth context for a verified subject
    pub fn new(subject: Uuid) -> Self {
        Self { subject }
    }
}

/// Error type for the authentication middleware
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header / no Bearer token presented
    TokenMissing,

    /// Malformed token, bad signature, or missing claims
    TokenInvalid,

    /// Signature valid but expiry instant has passed
    TokenExpired,
}

impl AuthError {
    /// Stable machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::TokenMissing => "token_missing",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::TokenExpired => "token_expired",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::TokenMissing => "Missing authentication token",
            AuthError::TokenInvalid => "Invalid authentication token",
            AuthError::TokenExpired => "Authentication token has expired",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.message(),
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Bearer-token authentication middleware
///
/// Per-request state machine: unauthenticated → token presented →
/// verified or rejected. On success the [`AuthContext`] is attached to the
/// request extensions and the request continues; on failure the request
/// terminates here.
///
/// # Errors
///
/// Returns 401 with the matching machine code if the header is absent, the
/// token fails validation, or the token has expired.
pub async fn bearer_auth(secret: String, mut req: Request, next: Next) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::TokenMissing)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::TokenMissing)?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    })?;

    req.extensions_mut().insert(AuthContext::new(claims.sub));

    Ok(next.run(req).await)
}

/// Creates a bearer-token middleware closure
///
/// Helper that captures the signing secret and returns a middleware function
/// suitable for `axum::middleware::from_fn`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use ticklist_shared::auth::middleware::bearer_auth_layer;
///
/// let app: Router = Router::new()
///     .route("/protected", get(|| async { "OK" }))
///     .layer(middleware::from_fn(bearer_auth_layer("secret")));
/// ```
pub fn bearer_auth_layer(
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(bearer_auth(secret, req, next))
    }
}
