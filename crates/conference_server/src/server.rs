//! Server bootstrap: open storage, bind, serve until shutdown.

use crate::api::router;
use crate::config::{ConfigError, ServerConfig};
use crate::state::AppState;
use axum::Router;
use conference_core::db::{open_db, DbError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::net::TcpListener;

#[derive(Debug)]
pub enum ServerError {
    Config(ConfigError),
    Db(DbError),
    Io(std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "failed to open conference database: {err}"),
            Self::Io(err) => write!(f, "server i/o failure: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for ServerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Opens the configured database and builds the application router.
pub fn build_app(config: &ServerConfig) -> Result<Router, ServerError> {
    config.validate()?;
    let conn = open_db(&config.database_path)?;
    let state = AppState::new(conn, config.application_name.as_str());
    Ok(router(state, config.cors_permissive))
}

/// Runs the server until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let app = build_app(&config)?;
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    if !addr.ip().is_loopback() {
        warn!("event=server_bind module=server status=warn addr={addr} reason=non_loopback");
    }
    info!(
        "event=server_start module=server status=ok addr={} database={}",
        listener.local_addr()?,
        config.database_path.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_signal module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
