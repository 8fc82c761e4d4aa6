// ABOUTME: SQLite database handle, schema migrations, and entity store managers
// ABOUTME: One pool shared by the per-entity managers and the transactional services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 kcal-engine contributors

//! # Database Management
//!
//! One [`Database`] handle owns the `SQLite` pool; schema creation is
//! code-driven and idempotent (`CREATE TABLE IF NOT EXISTS`, safe to run
//! at every startup). Entity access goes through the per-entity managers
//! ([`UserStore`], [`FoodCatalog`], [`MealLedger`], [`WeightTracker`]);
//! the multi-step write paths build on [`transactions::TransactionGuard`].

pub mod catalog;
pub mod meals;
pub mod transactions;
pub mod users;
pub mod weight;

pub use catalog::FoodCatalog;
pub use meals::MealLedger;
pub use transactions::{retry_transaction, TransactionGuard};
pub use users::UserStore;
pub use weight::WeightTracker;

use sqlx::{Pool, Sqlite, SqlitePool};
use tracing::info;

use crate::errors::{AppError, AppResult};

/// Database handle over the shared `SQLite` pool
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open a database connection pool
    ///
    /// For `sqlite:` URLs the file is created if it does not exist;
    /// `sqlite::memory:` gives an isolated in-memory instance (tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be established
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        Ok(Self { pool })
    }

    /// Get a reference to the pool for transactional operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// Ordered so foreign-key targets exist before their referrers.
    ///
    /// # Errors
    ///
    /// Returns an error if any schema migration fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_catalog().await?;
        self.migrate_meals().await?;
        self.migrate_weight().await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// User store bound to this pool
    #[must_use]
    pub fn user_store(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Food catalog bound to this pool
    #[must_use]
    pub fn catalog(&self) -> FoodCatalog {
        FoodCatalog::new(self.pool.clone())
    }

    /// Meal ledger bound to this pool
    #[must_use]
    pub fn meal_ledger(&self) -> MealLedger {
        MealLedger::new(self.pool.clone())
    }

    /// Weight tracker bound to this pool
    #[must_use]
    pub fn weight_tracker(&self) -> WeightTracker {
        WeightTracker::new(self.pool.clone())
    }
}
