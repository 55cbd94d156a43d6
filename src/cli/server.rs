//! HTTP trigger for on-demand ingestion runs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::jobs::{run_job, Job};
use crate::sink::{RestStore, UpsertStore};

/// Shared state for the trigger handlers
#[derive(Clone)]
pub struct TriggerState {
    config: Arc<IngestConfig>,
    secret: Arc<str>,
    client: HttpClient,
    store: Arc<dyn UpsertStore>,
    run_lock: Arc<Mutex<()>>,
}

impl TriggerState {
    /// State writing through `store`; fails without a trigger secret
    pub fn new(config: IngestConfig, client: HttpClient, store: Arc<dyn UpsertStore>) -> Result<Self> {
        let secret = Arc::from(config.require_trigger_secret()?);
        Ok(Self {
            config: Arc::new(config),
            secret,
            client,
            store,
            run_lock: Arc::new(Mutex::new(())),
        })
    }
}

/// Query string of the trigger
#[derive(Debug, Deserialize)]
struct TriggerParams {
    token: Option<String>,
    job: Option<String>,
}

/// Build the trigger router
pub fn router(state: TriggerState) -> Router {
    Router::new()
        .route("/", get(trigger))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the trigger server
pub async fn serve(config: IngestConfig, port: u16) -> Result<()> {
    let client = HttpClient::with_config(config.http_config())?;
    let store = RestStore::new(client.clone(), &config.store_url, config.store_key.clone())?;
    let app = router(TriggerState::new(config, client, Arc::new(store))?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting trigger server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Authenticate, then run the requested job to completion
async fn trigger(State(state): State<TriggerState>, Query(params): Query<TriggerParams>) -> Response {
    let authorized = params
        .token
        .as_deref()
        .is_some_and(|token| tokens_match(token, &state.secret));
    if !authorized {
        warn!("rejected trigger with missing or bad token");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response();
    }

    let job = match params.job.as_deref().map_or(Ok(Job::All), str::parse::<Job>) {
        Ok(job) => job,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response();
        }
    };

    let _guard = state.run_lock.lock().await;
    info!(%job, "triggered run");

    match run_job(&state.config, job, &state.client, state.store.clone()).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            error!(%job, error = %e, "triggered run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Compares two tokens in constant time
/// Compare in time that depends only on the secret's length
fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    let mut padded = vec![0u8; expected.len()];
    let shared = given.len().min(expected.len());
    padded[..shared].copy_from_slice(&given[..shared]);

    let same_len = (given.len() as u64).ct_eq(&(expected.len() as u64));
    (padded.as_slice().ct_eq(expected) & same_len).into()
}
