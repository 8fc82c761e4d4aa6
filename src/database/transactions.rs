// ABOUTME: Transaction management with an RAII guard and whole-operation retry
// ABOUTME: Guarantees rollback on early return for the multi-step write paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! Transaction management with RAII guards and retry
//!
//! The two multi-step write paths (composite food creation and the
//! profile/weight target recompute) each run inside one transaction.
//! [`TransactionGuard`] ensures that an early `?` return rolls the
//! transaction back; [`retry_transaction`] retries a complete operation
//! when `SQLite` reports a transient locking failure. Retry always wraps
//! the whole operation, never individual sub-steps, so a failed attempt
//! leaves no partial rows behind.
//!
//! ```text
//! retry_transaction(|| async {
//!     let tx = pool.begin().await?;
//!     let mut guard = TransactionGuard::new(tx);
//!
//!     sqlx::query("INSERT INTO food_items ...").execute(guard.executor()?).await?;
//!     sqlx::query("INSERT INTO recipe_lines ...").execute(guard.executor()?).await?;
//!
//!     guard.commit().await?;
//!     Ok(food_id)
//! }, 3).await
//! ```

use std::future::Future;
use std::time::Duration;

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::errors::{AppError, AppResult};

/// Retry a transactional operation that failed with a transient error
///
/// `SQLite` write contention surfaces as "database is locked" / "busy"
/// errors; those and timeouts are retried with exponential backoff
/// (10ms, 20ms, 40ms, ...). Validation, permission, and constraint
/// failures are never retried and propagate immediately.
///
/// # Errors
/// Returns the last error once `max_retries` attempts are exhausted, or
/// the first non-retryable error.
pub async fn retry_transaction<F, Fut, T>(mut f: F, max_retries: u32) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if attempts >= max_retries {
                    error!(
                        attempts = attempts,
                        max_retries = max_retries,
                        error = %e,
                        "Transaction failed after max retries"
                    );
                    return Err(e);
                }

                let error_msg = format!("{e:?}");
                if is_retryable_error(&error_msg) {
                    let backoff_ms = 10 * (1 << attempts);
                    warn!(
                        attempt = attempts,
                        max_retries = max_retries,
                        backoff_ms = backoff_ms,
                        error = %e,
                        "Transaction failed with retryable error, retrying after backoff"
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                } else {
                    return Err(e);
                }
            }
        }
    }
}

/// Check if a database error is transient and safe to retry
///
/// Retryable: `SQLite` locking/busy errors and timeouts. Everything else
/// (constraint violations, validation failures, permission errors) is
/// treated as permanent.
fn is_retryable_error(error_msg: &str) -> bool {
    let error_lower = error_msg.to_lowercase();

    if error_lower.contains("database is locked")
        || error_lower.contains("database table is locked")
        || error_lower.contains("busy")
    {
        return true;
    }

    if error_lower.contains("timeout") || error_lower.contains("timed out") {
        return true;
    }

    false
}

/// RAII guard for `SQLite` transactions ensuring automatic rollback on drop
///
/// Wraps a `sqlx` [`Transaction`] so that dropping the guard without
/// calling [`TransactionGuard::commit`] rolls the transaction back.
/// `commit` consumes the guard, which makes double-commit a compile
/// error rather than a runtime one.
pub struct TransactionGuard<'c> {
    transaction: Option<Transaction<'c, Sqlite>>,
    committed: bool,
}

impl<'c> TransactionGuard<'c> {
    /// Create a new guard from a transaction obtained via `pool.begin()`
    #[must_use]
    pub fn new(transaction: Transaction<'c, Sqlite>) -> Self {
        debug!("TransactionGuard created - transaction will auto-rollback if not committed");
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    /// Returns an error if the transaction was already consumed or the
    /// commit itself fails.
    pub async fn commit(mut self) -> AppResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::database(format!("Transaction commit failed: {e}")))?;
                self.committed = true;
                debug!("TransactionGuard committed successfully");
                Ok(())
            }
            None => Err(AppError::internal(
                "Transaction already consumed - cannot commit",
            )),
        }
    }

    /// Explicitly roll back the transaction and consume the guard
    ///
    /// Dropping the guard rolls back as well; this method exists for the
    /// cases where the rollback error itself matters.
    ///
    /// # Errors
    /// Returns an error if the transaction was already consumed or the
    /// rollback fails.
    pub async fn rollback(mut self) -> AppResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.rollback()
                    .await
                    .map_err(|e| AppError::database(format!("Transaction rollback failed: {e}")))?;
                debug!("TransactionGuard rolled back explicitly");
                Ok(())
            }
            None => Err(AppError::internal(
                "Transaction already consumed - cannot rollback",
            )),
        }
    }

    /// Check if the transaction has been committed
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Get the connection for executing queries inside the transaction
    ///
    /// # Errors
    /// Returns an error if the transaction has already been committed or
    /// rolled back.
    pub fn executor(&mut self) -> AppResult<&mut SqliteConnection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::internal("Transaction already consumed - guard used after commit/rollback")
        })
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            // SQLx rolls the inner transaction back on drop; log it so
            // aborted write paths are visible in traces
            warn!("TransactionGuard dropped without commit - transaction will be rolled back");
        }
    }
}
