//! fxbot-api - REST interface for the signal relay.
//!
//! A thin axum adapter over [`fxbot_listener::BotService`]:
//!
//! | route | operation |
//! |---|---|
//! | `GET /` | liveness message |
//! | `POST /channels/`, `GET /channels/` | create / list (`skip`, `limit`) |
//! | `GET /channels/{id}`, `DELETE /channels/{id}` | read / delete |
//! | `POST /start`, `POST /stop` | start or stop all listeners |
//! | `POST /manual_trade` | execute a signal, bypassing the parser |
//! | `GET /logs` | drain the audit queue |
//! | `GET /listeners` | registry snapshot |
//! | `GET /metrics` | Prometheus text format |
//!
//! Errors are returned as `{"detail": "..."}`.
//!
//! # Usage
//!
//! ```ignore
//! use fxbot_api::{run_server, ApiConfig};
//!
//! let token = CancellationToken::new();
//! tokio::spawn(run_server(service.clone(), ApiConfig::default(), token.clone()));
//! ```

mod config;
mod error;
mod server;
mod types;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use server::{create_router, run_server, AppState};
pub use types::{
    ChannelCreate, ListenersResponse, LogsResponse, ManualTradeResponse, MessageResponse,
    Pagination,
};
