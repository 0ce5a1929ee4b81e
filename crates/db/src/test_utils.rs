//! Test utilities for database operations.
//!
//! Provides an in-memory SQLite database with every migration applied, so
//! repository and service tests run without an external server.

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// A migrated in-memory test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
}

impl TestDatabase {
    /// Create a fresh in-memory database and run all migrations.
    ///
    /// The pool is pinned to a single connection: every SQLite `:memory:`
    /// connection is its own database.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!("Created in-memory test database");

        Ok(Self { conn })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Hand the connection out in the shape repositories expect.
    #[must_use]
    pub fn into_shared(self) -> Arc<DatabaseConnection> {
        Arc::new(self.conn)
    }
}
