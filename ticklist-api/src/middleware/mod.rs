/// Middleware modules for the API server
///
/// Authentication middleware lives in `ticklist_shared::auth::middleware`;
/// this module holds the server-local layers.

pub mod security;
