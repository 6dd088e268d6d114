use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{delete, get, post},
    Json, Router,
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::bus::EventBus;
use crate::config::AppConfig;
use crate::constants;
use crate::error::SignalError;
use crate::events::Event;
use crate::services::monitor::EngineHandle;
use crate::services::notifications::NotificationCenter;
use crate::signals::types::{Signal, SignalDraft, SignalStatus};

pub struct AppState {
    pub engine: EngineHandle,
    pub notifications: NotificationCenter,
    pub bus: EventBus,
    pub config: AppConfig,
}

/// A signal plus the derived fields the dashboard renders.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignalView {
    #[serde(flatten)]
    signal: Signal,
    pnl_pct: f64,
    pnl_display: String,
    display_price: f64,
}

impl From<Signal> for SignalView {
    fn from(signal: Signal) -> Self {
        Self {
            pnl_pct: signal.pnl_pct(),
            pnl_display: signal.pnl_display(),
            display_price: signal.display_price(),
            signal,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/signals", get(list_signals).post(create_signal))
        .route("/signals/{id}", delete(delete_signal))
        .route("/stats", get(get_stats))
        .route("/monitoring/start", post(start_monitoring))
        .route("/monitoring/stop", post(stop_monitoring))
        .route("/notifications", get(list_notifications).delete(clear_notifications))
        .route("/events", get(events))
        .with_state(state)
}

/// Bind `server.bind_addr` and serve until `shutdown` resolves.
pub async fn run_server(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(&state.config.server.bind_addr).await?;
    serve(listener, state, shutdown).await
}

pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!("🌐 [API] Server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

fn error_response(e: SignalError) -> Response {
    let status = match e {
        SignalError::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({"error": e.to_string()}))).into_response()
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

#[derive(Deserialize)]
struct SignalParams {
    status: Option<String>,
}

async fn list_signals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SignalParams>,
) -> Response {
    let filter = match SignalStatus::parse_filter(params.status.as_deref().unwrap_or("all")) {
        Ok(filter) => filter,
        Err(msg) => return (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))).into_response(),
    };
    match state.engine.list_signals(filter).await {
        Ok(signals) => {
            let views: Vec<SignalView> = signals.into_iter().map(SignalView::from).collect();
            Json(views).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn create_signal(State(state): State<Arc<AppState>>, Json(draft): Json<SignalDraft>) -> Response {
    match state.engine.create_signal(draft).await {
        Ok(signal) => {
            info!("🌐 [API] Created signal {} ({})", signal.id, signal.symbol);
            (StatusCode::CREATED, Json(SignalView::from(signal))).into_response()
        }
        Err(e) => {
            warn!("⚠️ [API] Create rejected: {}", e);
            error_response(e)
        }
    }
}

async fn delete_signal(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.engine.delete_signal(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, Json(json!({"error": format!("no signal {}", id)}))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    match state.engine.stats().await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => error_response(e),
    }
}

async fn start_monitoring(State(state): State<Arc<AppState>>) -> Response {
    match state.engine.start_monitoring().await {
        Ok(true) => Json(json!({"status": "started"})).into_response(),
        Ok(false) => Json(json!({"status": "already_running"})).into_response(),
        Err(e) => error_response(e),
    }
}

async fn stop_monitoring(State(state): State<Arc<AppState>>) -> Response {
    match state.engine.stop_monitoring().await {
        Ok(true) => Json(json!({"status": "stopped"})).into_response(),
        Ok(false) => Json(json!({"status": "not_running"})).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
struct NotificationParams {
    limit: Option<usize>,
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NotificationParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(constants::notifications::HISTORY_LIMIT);
    Json(json!({
        "badge": state.notifications.badge(),
        "count": state.notifications.count(),
        "notifications": state.notifications.recent(limit),
    }))
}

async fn clear_notifications(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cleared = state.notifications.clear();
    Json(json!({"cleared": cleared}))
}

/// Server-sent events: `notification` carries the payload, `refresh` asks
/// the view to re-fetch.
async fn events(State(state): State<Arc<AppState>>) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.bus.subscribe();
    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Ok::<_, Infallible>(to_sse(&event)), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("⚠️ [API] Event stream lagged, {} event(s) dropped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse(event: &Event) -> SseEvent {
    match event {
        Event::Notification(notice) => SseEvent::default()
            .event("notification")
            .data(serde_json::to_string(notice).unwrap_or_default()),
        Event::Refresh => SseEvent::default().event("refresh").data("{}"),
    }
}
