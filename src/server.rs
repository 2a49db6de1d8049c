//! HTTP delivery layer for the presence feed.
//!
//! Exposes each detector both as a one-shot JSON snapshot and as a
//! server-sent-event stream that emits one snapshot per fixed interval for
//! as long as the subscriber stays connected, plus the ingestion endpoints
//! the phone-side automation client pushes to.
//!
//! ```text
//! phone automation ──→ POST /macrodroid ──→ MobileAppIngester
//! dashboard        ──→ GET  /stream, /song/stream, /mobile/stream (SSE)
//! ```

use crate::config::Config;
use crate::platform::Platform;
use crate::tracker::{MobileAppIngester, MusicDetector, WindowTracker};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

/// Shared server state: the three engines behind every route.
pub struct ServerState {
    window: WindowTracker<Platform>,
    music: MusicDetector<Platform>,
    mobile: MobileAppIngester,
    config: Config,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        let system = Arc::new(Platform::default());
        Self {
            window: WindowTracker::new(Arc::clone(&system)),
            music: MusicDetector::new(system),
            mobile: MobileAppIngester::new(),
            config,
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Acknowledgement for the full ingestion endpoint, echoing the payload.
#[derive(Serialize)]
pub struct IngestAck {
    pub status: &'static str,
    pub message: String,
    pub received_data: Value,
}

/// Acknowledgement for the simplified ingestion endpoint.
#[derive(Serialize)]
pub struct SimpleAck {
    pub status: &'static str,
    pub message: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /snapshot
async fn window_snapshot(State(state): State<Arc<ServerState>>) -> Json<Value> {
    Json(encode(&state.window.sample()))
}

/// GET /stream
async fn window_stream(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let period = Duration::from_secs(state.config.window_interval_secs.max(1));
    sse_every(period, move || encode(&state.window.sample()))
}

/// GET /song
async fn song_snapshot(State(state): State<Arc<ServerState>>) -> Json<Value> {
    Json(encode(&state.music.sample()))
}

/// GET /song/stream
async fn song_stream(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let period = Duration::from_secs(state.config.music_interval_secs.max(1));
    sse_every(period, move || encode(&state.music.sample()))
}

/// GET /mobile
async fn mobile_snapshot(State(state): State<Arc<ServerState>>) -> Json<Value> {
    Json(encode(&state.mobile.snapshot()))
}

/// GET /mobile/stream
async fn mobile_stream(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let period = Duration::from_secs(state.config.mobile_interval_secs.max(1));
    sse_every(period, move || encode(&state.mobile.snapshot()))
}

/// POST /macrodroid
///
/// Accepts the automation client's push as JSON or form fields. Malformed
/// payloads are acknowledged with an error status rather than an HTTP
/// failure; the held app identity is never blanked by a bad push.
async fn ingest_mobile(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<IngestAck> {
    let payload = decode_payload(&headers, &body);
    let (status, message) = match state.mobile.ingest(&payload) {
        Ok(message) => ("success", message),
        Err(err) => {
            tracing::warn!("mobile ingestion failed: {err}");
            ("error", err.to_string())
        }
    };
    Json(IngestAck {
        status,
        message,
        received_data: payload,
    })
}

/// GET /macrodroid/test
async fn ingest_help(State(state): State<Arc<ServerState>>) -> Json<Value> {
    Json(json!({
        "message": "手机应用推送接口测试",
        "example_request": {
            "method": "POST",
            "url": "/macrodroid",
            "content_type": "application/json",
            "data": {"app_name": "微信", "package_name": "com.tencent.mm"},
        },
        "current_data": state.mobile.snapshot(),
    }))
}

/// GET /macrodroid/simple
async fn ingest_simple_query(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<SimpleAck> {
    let name = params.get("app").or_else(|| params.get("name"));
    simple_ack(&state, name.map(String::as_str))
}

/// POST /macrodroid/simple
async fn ingest_simple_body(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Json<SimpleAck> {
    let name = simple_name(&body);
    simple_ack(&state, name.as_deref())
}

fn simple_ack(state: &ServerState, name: Option<&str>) -> Json<SimpleAck> {
    match state.mobile.ingest_simple(name) {
        Ok(message) => Json(SimpleAck {
            status: "success",
            message,
        }),
        Err(err) => {
            tracing::warn!("simple mobile ingestion failed: {err}");
            Json(SimpleAck {
                status: "error",
                message: err.to_string(),
            })
        }
    }
}

/// Decode a push body: JSON when declared (or parseable), form fields
/// otherwise. Undecodable bodies become `null`, which the ingester reports
/// as malformed.
fn decode_payload(headers: &HeaderMap, body: &Bytes) -> Value {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/json") {
        if let Ok(value) = serde_json::from_slice::<Value>(body) {
            return value;
        }
    }

    if let Ok(fields) = serde_urlencoded::from_bytes::<HashMap<String, String>>(body) {
        let mut object = serde_json::Map::new();
        if let Some(name) = fields.get("app_name").or_else(|| fields.get("name")) {
            object.insert("app_name".to_string(), Value::String(name.clone()));
        }
        if let Some(package) = fields.get("package_name").or_else(|| fields.get("package")) {
            object.insert("package_name".to_string(), Value::String(package.clone()));
        }
        if !object.is_empty() {
            return Value::Object(object);
        }
    }

    // Clients that omit the content type still mostly send JSON.
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// Pull the single app name out of a simplified POST body (JSON or form).
fn simple_name(body: &Bytes) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(name) = value
            .get("app")
            .and_then(Value::as_str)
            .or_else(|| value.get("name").and_then(Value::as_str))
        {
            return Some(name.to_string());
        }
        if value.is_object() {
            return None;
        }
    }
    let fields = serde_urlencoded::from_bytes::<HashMap<String, String>>(body).ok()?;
    fields
        .get("app")
        .or_else(|| fields.get("name"))
        .cloned()
}

/// One SSE stream emitting a freshly sampled snapshot per interval.
fn sse_every<F>(
    period: Duration,
    mut sample: F,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    F: FnMut() -> Value + Send + 'static,
{
    let stream = IntervalStream::new(tokio::time::interval(period)).map(move |_| {
        let data = serde_json::to_string(&sample()).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().data(data))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn encode<T: Serialize>(snapshot: &T) -> Value {
    serde_json::to_value(snapshot).unwrap_or(Value::Null)
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(window_snapshot))
        .route("/stream", get(window_stream))
        .route("/song", get(song_snapshot))
        .route("/song/stream", get(song_stream))
        .route("/mobile", get(mobile_snapshot))
        .route("/mobile/stream", get(mobile_stream))
        .route("/macrodroid", post(ingest_mobile))
        .route("/macrodroid/test", get(ingest_help))
        .route(
            "/macrodroid/simple",
            get(ingest_simple_query).post(ingest_simple_body),
        )
        .layer(
            // Pushes come from LAN automation clients with arbitrary origins.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let bind = format!("{}:{}", config.host, config.port);
    let state = Arc::new(ServerState::new(config));
    let app = router(state);

    let listener = TcpListener::bind(&bind).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("presence agent listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
