/// Token generation and validation module
///
/// This module provides the signed-token functionality for user
/// authentication. Tokens are signed using HS256 (HMAC-SHA256) and carry the
/// authenticated user's identity in the `sub` claim.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Fixed 24-hour horizon from issuance
/// - **Validation**: Signature, expiration, issuer, and required claims
/// - **Secret Management**: The signing secret is process configuration,
///   loaded once at startup and shared by issuer and verifier. Rotating it
///   invalidates every outstanding token; clients must log in again.
///
/// Tokens are never persisted. The server holds no session table and no
/// in-memory session map: the decoded `sub` claim is the sole trust anchor
/// for everything a request is allowed to touch.
///
/// # Example
///
/// ```
/// use ticklist_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "your-secret-key-at-least-32-bytes-long";
///
/// let claims = Claims::new(user_id);
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer embedded in every token and required during validation
pub const ISSUER: &str = "ticklist";

/// How long an issued token stays valid
pub fn token_ttl() -> Duration {
    Duration::hours(24)
}

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired (signature was valid)
    #[error("Token has expired")]
    Expired,

    /// Token is malformed, has a bad signature, or is missing claims
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Token claims
///
/// # Claims
///
/// - `sub`: Subject (user ID), the only identity the server trusts
/// - `iss`: Issuer (always "ticklist")
/// - `iat`: Issued at (Unix timestamp)
/// - `exp`: Expiration time (Unix timestamp, `iat` + 24h)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "ticklist"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates new claims expiring 24 hours from now
    ///
    /// # Example
    ///
    /// ```
    /// use ticklist_shared::auth::jwt::Claims;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::new(Uuid::new_v4());
    /// assert!(!claims.is_expired());
    /// ```
    pub fn new(user_id: Uuid) -> Self {
        Self::with_expiration(user_id, token_ttl())
    }

    /// Creates claims with a custom expiration
    ///
    /// Primarily useful in tests to produce already-expired tokens.
    pub fn with_expiration(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Checks if the claims have expired
    ///
    /// A token is expired from the exact expiry instant onward.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Seconds until expiration, or None if already expired
    pub fn seconds_until_expiration(&self) -> Option<i64> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(self.exp - now)
        } else {
            None
        }
    }
}

/// Creates a signed token from claims
///
/// # Arguments
///
/// * `claims` - Token claims
/// * `secret` - Secret key for signing (should be at least 32 bytes)
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Verifies:
/// - Signature is valid (HS256, shared secret)
/// - Token has not expired (no leeway: `exp <= now` is rejected)
/// - Issuer is "ticklist"
/// - Subject and expiry claims are present
///
/// # Errors
///
/// - `JwtError::Expired` when the signature is valid but the expiry instant
///   has passed
/// - `JwtError::Invalid` for every other failure (malformed token, bad
///   signature, wrong issuer, missing claims)
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, token_ttl().num_seconds());
    }

    #[test]
    fn test_claims_with_custom_expiration() {
        let claims = Claims::with_expiration(Uuid::new_v4(), Duration::hours(1));

        let time_left = claims.seconds_until_expiration().unwrap();
        assert!(time_left > 3500);
        assert!(time_left <= 3600);
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();

        let claims = Claims::new(user_id);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.iss, ISSUER);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4());
        let token = create_token(&claims, "secret-one-that-is-32-bytes-long!!").unwrap();

        let result = validate_token(&token, "secret-two-that-is-32-bytes-long!!");
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        let user_id = Uuid::new_v4();

        // Expired one hour ago
        let claims = Claims::with_expiration(user_id, Duration::seconds(-3600));
        assert!(claims.is_expired());
        assert!(claims.seconds_until_expiration().is_none());

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_expired_is_distinct_from_invalid() {
        // Garbage is Invalid, not Expired
        let result = validate_token("not-a-token", SECRET);
        assert!(matches!(result, Err(JwtError::Invalid(_))));

        // A stale but well-signed token is Expired, not Invalid
        let claims = Claims::with_expiration(Uuid::new_v4(), Duration::seconds(-1));
        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let mut claims = Claims::new(Uuid::new_v4());
        claims.iss = "someone-else".to_string();

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_validate_missing_subject() {
        // A token whose payload lacks `sub` entirely must not validate
        #[derive(Serialize)]
        struct NoSubject {
            iss: String,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now().timestamp();
        let payload = NoSubject {
            iss: ISSUER.to_string(),
            iat: now,
            exp: now + 3600,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_token_roundtrip_preserves_subject() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id), SECRET).unwrap();
        let validated = validate_token(&token, SECRET).unwrap();

        assert_eq!(validated.sub, user_id);
        assert!(validated.seconds_until_expiration().is_some());
    }
}
