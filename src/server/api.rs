//! Webhook receiver for Telegram updates

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::config::ServerConfig;
use crate::telegram::client::TelegramClient;
use crate::telegram::router::UpdateRouter;
use crate::telegram::types::Update;

/// Header Telegram uses to echo the webhook secret
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

const QUEUE_CAPACITY: usize = 1024;

/// Application state
#[derive(Clone)]
pub struct AppState {
    queue: mpsc::Sender<Update>,
    secret_token: Option<String>,
}

impl AppState {
    pub fn new(queue: mpsc::Sender<Update>, secret_token: Option<String>) -> Self {
        Self {
            queue,
            secret_token,
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn error(status: StatusCode, message: &str, code: &str) -> (StatusCode, axum::Json<ErrorResponse>) {
    (
        status,
        axum::Json(ErrorResponse {
            error: ErrorDetail {
                message: message.to_string(),
                code: Some(code.to_string()),
            },
        }),
    )
}

/// Health check handler
async fn health_check() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Webhook handler: queue the update and acknowledge at once
async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Result<StatusCode, (StatusCode, axum::Json<ErrorResponse>)> {
    if let Some(expected) = &state.secret_token {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            warn!("Rejected webhook call with a wrong secret token");
            return Err(error(StatusCode::UNAUTHORIZED, "invalid secret token", "unauthorized"));
        }
    }

    // Unknown shapes are acknowledged so Telegram does not redeliver them
    let update: Update = match serde_json::from_value(payload) {
        Ok(update) => update,
        Err(e) => {
            warn!("Ignoring malformed update: {}", e);
            return Ok(StatusCode::OK);
        }
    };

    if state.queue.send(update).await.is_err() {
        return Err(error(
            StatusCode::SERVICE_UNAVAILABLE,
            "relay worker stopped",
            "unavailable",
        ));
    }

    Ok(StatusCode::OK)
}

/// Build the HTTP router
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/webhook", post(webhook))
        .with_state(state)
}

/// Handle queued updates one at a time, in arrival order
pub fn spawn_worker(router: UpdateRouter, mut queue: mpsc::Receiver<Update>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(update) = queue.recv().await {
            router.handle(&update).await;
        }
        debug!("Relay worker stopped");
    })
}

/// Run the HTTP server until `shutdown` resolves
pub async fn run_server<F>(
    config: &ServerConfig,
    telegram: &TelegramClient,
    router: UpdateRouter,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    match &config.public_url {
        Some(url) => {
            let url = format!("{}/webhook", url.trim_end_matches('/'));
            telegram
                .set_webhook(&url, config.secret_token.as_deref())
                .await?;
        }
        None => warn!("No public URL configured, the webhook must be registered manually"),
    }

    let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
    let worker = spawn_worker(router, receiver);

    let state = Arc::new(AppState::new(sender, config.secret_token.clone()));
    let app = app(state);

    // Bind address
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("Starting server on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // The router owned the only sender; the worker drains what is left and exits
    worker.await?;

    Ok(())
}
