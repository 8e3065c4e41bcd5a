use std::{net::SocketAddr, path::Path, sync::Arc};

use anyhow::Context;
use axum::{middleware, Router};
use derivative::Derivative;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    decompression::RequestDecompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use crate::{
    error::ErrorVerbosity,
    middleware::{
        method_not_allowed::method_not_allowed, not_found::not_found, trace_headers::trace_headers,
        trace_response_body::trace_response_body,
    },
    route,
    state::ApiState,
    store::postgres::PgBookStore,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[source] serde_yaml::Error),
}

#[derive(Derivative, Clone, Deserialize)]
#[derivative(Debug)]
pub struct DatabaseConfig {
    /// Postgres connection URL. Masked in `Debug` output since it may carry a password.
    #[derivative(Debug(format_with = "crate::utils::mask_fmt"))]
    pub url: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "DatabaseConfig::default_acquire_timeout_in_seconds")]
    pub acquire_timeout_in_seconds: u64,
    /// Apply the embedded migrations before serving.
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    fn default_max_connections() -> u32 {
        5
    }

    fn default_acquire_timeout_in_seconds() -> u64 {
        5
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub socket_address: SocketAddr,
    pub error_verbosity: ErrorVerbosity,
    /// Logs every response body. Expensive.
    #[serde(default)]
    pub trace_response_body: bool,
    pub database: DatabaseConfig,
}

impl ServerConfig {
    pub async fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(ConfigError::Read)?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// Builds the application router on top of the given state.
pub fn app(state: ApiState, trace_body: bool) -> Router {
    let router = Router::new()
        .nest("/books", route::books::app::app())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            method_not_allowed::<ApiState>,
        ))
        .layer(middleware::from_fn(trace_headers));

    let router = match trace_body {
        true => router.layer(middleware::from_fn_with_state(
            state.clone(),
            trace_response_body,
        )),
        false => router,
    };

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                    .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                    .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
            )
            .layer(RequestDecompressionLayer::new())
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive()),
    )
}

pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::debug!(config = ?self.config, "Running");

        let store = PgBookStore::connect(&self.config.database)
            .await
            .context("Database connection failed")?;

        if self.config.database.run_migrations {
            store.migrate().await.context("Migrations failed")?;
        }

        let state = ApiState::new(self.config.error_verbosity, Arc::new(store.clone()));
        let app = app(state, self.config.trace_response_body);

        tracing::info!(addr = %self.config.socket_address, "Starting server");

        let listener = TcpListener::bind(&self.config.socket_address)
            .await
            .context("Bind failed")?;

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

        store.close().await;

        tracing::info!("Database connections closed");

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "Failed to install CTRL+C signal handler");

            std::future::pending::<()>().await;
        }

        tracing::info!("CTRL+C received");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;

                tracing::info!("SIGTERM received");
            }
            Err(err) => {
                tracing::error!(%err, "Failed to install SIGTERM signal handler");

                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
