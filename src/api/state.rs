//! Shared state handed to every handler.

use sea_orm::DatabaseConnection;

/// Application state
#[derive(Debug)]
pub struct AppState {
    /// Pooled database connection
    pub db: DatabaseConnection,
}

impl AppState {
    /// Wraps a database connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}
