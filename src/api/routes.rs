//! HTTP surface assembly and serve loop.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::startup::StartupGate;
use crate::storage::{SqliteTaskStore, TaskStore};

use super::cors::{cors_layer, OriginPolicy};
use super::tasks;
use super::types::HealthResponse;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn TaskStore>,
}

/// Start the HTTP server.
///
/// The listener is not bound until the startup gate has confirmed the store
/// is reachable; until then connections are refused by the OS. Probe and
/// bind failures are retried indefinitely and never surface here.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::open(&config.database_path)?);

    let gate = StartupGate::new(config.startup_retry_delay);
    let listener = gate.run(store.as_ref(), &config.bind_addr()).await;

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
    });
    let app = build_router(Arc::clone(&state));

    tracing::info!("Task Board API listening on {}", config.bind_addr());
    tracing::info!("Environment: {}", config.environment);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Assemble the full router: health, API description, task sub-router,
/// catch-all 404, CORS and request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(OriginPolicy::new(), state.config.cors_enforce);

    Router::new()
        .route("/api/health", get(health))
        .route("/api", get(api_info))
        .nest("/api/tasks", tasks::routes())
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// GET /api/health - Probe the store and report overall health.
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.store.health_check().await;
    let healthy = database.is_healthy();

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.config.environment.clone(),
            database,
        }),
    )
}

/// GET /api - Static description of the API.
async fn api_info() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Task Board API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "health": "GET /api/health",
            "tasks": {
                "list": "GET /api/tasks",
                "get": "GET /api/tasks/:id",
                "create": "POST /api/tasks",
                "update": "PUT /api/tasks/:id",
                "delete": "DELETE /api/tasks/:id",
                "stats": "GET /api/tasks/stats"
            }
        }
    }))
}

/// Catch-all for unmatched paths.
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}
