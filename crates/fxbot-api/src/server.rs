//! HTTP server implementation using axum.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use fxbot_core::{Channel, NewChannel, TradingSignal};
use fxbot_listener::BotService;
use fxbot_telemetry::Metrics;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    ChannelCreate, ListenersResponse, LogsResponse, ManualTradeResponse, MessageResponse,
    Pagination,
};

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<BotService>,
}

impl AppState {
    pub fn new(service: Arc<BotService>) -> Self {
        Self { service }
    }
}

/// Create the axum router.
pub fn create_router(service: Arc<BotService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/channels", post(create_channel).get(list_channels))
        .route("/channels/", post(create_channel).get(list_channels))
        .route("/channels/{id}", get(get_channel).delete(delete_channel))
        .route("/start", post(start_bot))
        .route("/stop", post(stop_bot))
        .route("/manual_trade", post(manual_trade))
        .route("/logs", get(get_logs))
        .route("/listeners", get(get_listeners))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(service))
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Telegram Forex Bot is running"))
}

async fn create_channel(
    State(state): State<AppState>,
    body: Result<Json<ChannelCreate>, JsonRejection>,
) -> ApiResult<Json<Channel>> {
    let Json(body) = body?;
    let new = NewChannel::try_from(body)?;
    Ok(Json(state.service.create_channel(new).await?))
}

async fn list_channels(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<Json<Vec<Channel>>> {
    let Query(page) = query?;
    Ok(Json(state.service.list_channels(page.skip, page.limit)?))
}

async fn get_channel(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<Channel>> {
    let Path(id) = id?;
    Ok(Json(state.service.get_channel(id)?))
}

async fn delete_channel(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<Channel>> {
    let Path(id) = id?;
    Ok(Json(state.service.delete_channel(id).await?))
}

async fn start_bot(State(state): State<AppState>) -> ApiResult<Json<MessageResponse>> {
    state.service.start_bot().await?;
    Ok(Json(MessageResponse::new(
        "Bot started listening to all channels",
    )))
}

async fn stop_bot(State(state): State<AppState>) -> Json<MessageResponse> {
    state.service.stop_bot().await;
    Json(MessageResponse::new("Bot stopped listening to all channels"))
}

async fn manual_trade(
    State(state): State<AppState>,
    body: Result<Json<TradingSignal>, JsonRejection>,
) -> ApiResult<Json<ManualTradeResponse>> {
    let Json(signal) = body?;
    let report = state.service.manual_trade(signal).await?;
    Ok(Json(ManualTradeResponse {
        message: "Trade executed successfully".to_string(),
        report,
    }))
}

async fn get_logs(State(state): State<AppState>) -> Json<LogsResponse> {
    let logs = state
        .service
        .get_logs()
        .into_iter()
        .map(|event| event.to_string())
        .collect();
    Json(LogsResponse { logs })
}

async fn get_listeners(State(state): State<AppState>) -> Json<ListenersResponse> {
    let registry = state.service.registry();
    Json(ListenersResponse {
        running: registry.running_count(),
        listeners: registry.snapshot(),
    })
}

async fn get_metrics() -> ApiResult<Response> {
    let text = Metrics::gather_text().map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

/// Run the API server until `shutdown` is cancelled.
pub async fn run_server(
    service: Arc<BotService>,
    config: ApiConfig,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let mut app = create_router(service);
    if config.permissive_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Starting API server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use fxbot_executor::MockExecutor;
    use fxbot_listener::ListenerConfig;
    use fxbot_persistence::InMemoryChannelStore;
    use fxbot_telemetry::AuditLog;
    use fxbot_transport::MockTransport;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let service = BotService::new(
            Arc::new(InMemoryChannelStore::new()),
            Arc::new(MockTransport::new()),
            Arc::new(MockExecutor::new()),
            Arc::new(AuditLog::in_memory(100)),
            &ListenerConfig::default(),
        );
        create_router(Arc::new(service))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_root() {
        let app = app();
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Telegram Forex Bot is running");
    }

    #[tokio::test]
    async fn test_channel_crud() {
        let app = app();
        let (status, created) = send(
            &app,
            "POST",
            "/channels/",
            Some(json!({"channel_id": "-1001234567890", "name": "FX Signals"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["id"], 1);
        assert_eq!(created["channel_id"], "-1001234567890");

        let (status, body) = send(
            &app,
            "POST",
            "/channels/",
            Some(json!({"channel_id": "-1001234567890", "name": "again"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["detail"].is_string());

        let (status, list) = send(&app, "GET", "/channels/?skip=0&limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "GET", "/channels/1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, deleted) = send(&app, "DELETE", "/channels/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["name"], "FX Signals");

        let (status, body) = send(&app, "GET", "/channels/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Channel not found");
    }

    #[tokio::test]
    async fn test_invalid_channel_id_is_unprocessable() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/channels/",
            Some(json!({"channel_id": "  ", "name": "blank"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (status, _) = send(&app, "GET", "/channels/abc", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_manual_trade() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/manual_trade",
            Some(json!({
                "action": "BUY",
                "pair": "EUR/USD",
                "price": "1.05",
                "stop_loss": "1.04",
                "take_profit": "1.06"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Trade executed successfully");
        assert_eq!(body["trade"]["pair"], "EURUSD");
        assert_eq!(body["trade"]["source"]["type"], "manual");

        let (status, body) = send(
            &app,
            "POST",
            "/manual_trade",
            Some(json!({
                "action": "BUY",
                "pair": "EURUSD",
                "price": "1.05",
                "stop_loss": "1.06",
                "take_profit": "1.04"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("Inconsistent"));
    }

    #[tokio::test]
    async fn test_start_stop_and_logs() {
        let app = app();
        let (status, body) = send(&app, "POST", "/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Bot started listening to all channels");

        // repeated start is still acknowledged
        let (status, _) = send(&app, "POST", "/start", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "POST", "/stop", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", "/logs", None).await;
        let logs = body["logs"].as_array().unwrap();
        assert!(logs.iter().any(|l| l.as_str().unwrap().contains("Bot stopped")));

        let (_, body) = send(&app, "GET", "/logs", None).await;
        assert!(body["logs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listeners() {
        let app = app();
        send(
            &app,
            "POST",
            "/channels/",
            Some(json!({"channel_id": "@fxsignals", "name": "public"})),
        )
        .await;
        let (status, body) = send(&app, "GET", "/listeners", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["listeners"][0]["channel_id"], "@fxsignals");
    }
}
