/// Authentication utilities
///
/// This module provides the authentication primitives for Ticklist:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Token generation and validation
/// - [`middleware`]: Axum middleware that turns a Bearer token into a
///   request-scoped [`middleware::AuthContext`]
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Tokens**: HS256 signing, fixed 24-hour expiry
/// - **Constant-time Comparison**: All verification uses constant-time operations
///
/// The server keeps no session state: a verified token plus the database is
/// everything a request needs.

pub mod jwt;
pub mod middleware;
pub mod password;
