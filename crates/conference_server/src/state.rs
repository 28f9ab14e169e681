//! Shared handler state.

use crate::error::ApiError;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;

/// State cloned into every handler.
///
/// SQLite access is serialized through one connection; closures passed to
/// [`AppState::with_conn`] run on the blocking pool, never on async workers.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
    application_name: Arc<str>,
}

impl AppState {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, application_name: impl Into<Arc<str>>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            application_name: application_name.into(),
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Runs `f` with exclusive access to the connection.
    pub async fn with_conn<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|err| ApiError::internal(format!("blocking task failed: {err}")))?
    }
}
