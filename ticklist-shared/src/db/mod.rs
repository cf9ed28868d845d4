/// Database layer for Ticklist
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Embedded migration runner
///
/// The pool is the only shared mutable state in the system; concurrency
/// control for simultaneous edits is delegated to row-level atomicity in
/// Postgres (last write wins).

pub mod migrations;
pub mod pool;

use std::future::Future;

/// Runs a store operation, retrying once on a transient failure
///
/// Transient failures (pool acquire timeout, I/O error) get a single retry
/// before the error propagates to the caller; anything else fails
/// immediately. Callers see at most one extra attempt.
pub async fn with_retry<T, F, Fut>(op: F) -> Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    match op().await {
        Err(e) if is_transient(&e) => {
            tracing::warn!(error = %e, "Transient store failure, retrying once");
            op().await
        }
        other => other,
    }
}

fn is_transient(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
}
