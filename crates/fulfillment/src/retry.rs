//! Transient-conflict classification and retry policy.
//!
//! Row locks under READ COMMITTED make lost updates impossible, but
//! Postgres can still abort a transaction with a deadlock or
//! serialization error under load. Those aborts are safe to re-run from
//! the top, so `place_order` retries them with exponential backoff up to
//! a fixed budget. Everything else surfaces to the caller unchanged.

use std::time::Duration;

use crate::error::FulfillmentError;

/// Total attempts before giving up with `ConflictExhausted`.
pub const MAX_ATTEMPTS: u32 = 5;

/// Backoff before the second attempt; doubles per retry.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(10);

/// SQLSTATE codes Postgres uses for transient concurrency aborts.
///
/// 40001 serialization_failure, 40P01 deadlock_detected,
/// 55P03 lock_not_available.
const RETRYABLE_SQLSTATES: [&str; 3] = ["40001", "40P01", "55P03"];

/// Returns true if the error is a transient conflict worth re-running
/// the whole transaction for.
pub fn is_retryable(err: &FulfillmentError) -> bool {
    match err {
        FulfillmentError::Database(db) => is_retryable_sqlx(db),
        FulfillmentError::Catalog(catalog::CatalogError::Database(db)) => is_retryable_sqlx(db),
        _ => false,
    }
}

fn is_retryable_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| RETRYABLE_SQLSTATES.contains(&code.as_ref()))
            .unwrap_or(false),
        _ => false,
    }
}

/// Backoff duration before the given retry (1-based attempt that just
/// failed).
pub fn backoff_for_attempt(attempt: u32) -> Duration {
    INITIAL_BACKOFF * 2u32.saturating_pow(attempt.saturating_sub(1))
}
