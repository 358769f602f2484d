//! Webhook executor.
//!
//! Posts each trade as JSON to a configured endpoint. Any 2xx response
//! counts as accepted; other statuses become [`ExecutionError::Rejected`].

use std::sync::Arc;
use std::time::Duration;

use fxbot_core::{TradeRecord, TradeSource, TradingSignal};
use fxbot_persistence::TradeJournal;
use tracing::{info, warn};

use crate::error::{ExecutionError, ExecutionResult};
use crate::executor::{BoxFuture, ExecutionReport, TradeExecutor};

/// Longest response body kept in a rejection message.
const MAX_ERROR_BODY: usize = 512;

/// Webhook endpoint configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout_ms: u64,
    /// Sent as the `Authorization` header when set.
    pub authorization: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: 5000,
            authorization: None,
        }
    }
}

pub struct WebhookExecutor {
    config: WebhookConfig,
    client: reqwest::Client,
    journal: Option<Arc<TradeJournal>>,
}

impl WebhookExecutor {
    pub fn new(config: WebhookConfig) -> ExecutionResult<Self> {
        if config.url.is_empty() {
            return Err(ExecutionError::Unavailable(
                "webhook url is not configured".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            config,
            client,
            journal: None,
        })
    }

    /// Also journal accepted trades.
    pub fn with_journal(mut self, journal: Arc<TradeJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    async fn post(&self, trade: &TradeRecord) -> ExecutionResult<String> {
        let mut request = self.client.post(&self.config.url).json(trade);
        if let Some(auth) = &self.config.authorization {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ExecutionError::Unavailable(e.to_string())
            } else {
                ExecutionError::Http(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!(%status, trade_id = %trade.id, body = %body, "Webhook rejected trade");
            return Err(ExecutionError::Rejected(format!("HTTP {status}: {body}")));
        }
        Ok(format!("HTTP {}", status.as_u16()))
    }
}

impl TradeExecutor for WebhookExecutor {
    fn execute<'a>(
        &'a self,
        signal: &'a TradingSignal,
        source: TradeSource,
    ) -> BoxFuture<'a, ExecutionResult<ExecutionReport>> {
        Box::pin(async move {
            let trade = TradeRecord::from_signal(signal, source);
            let reference = self.post(&trade).await?;
            if let Some(journal) = &self.journal {
                journal.record(&trade)?;
            }
            info!(trade_id = %trade.id, signal = %signal, url = %self.config.url, "Webhook accepted trade");
            Ok(ExecutionReport::new(trade, self.name()).with_reference(reference))
        })
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use fxbot_core::TradeAction;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}/hook")
    }

    fn signal() -> TradingSignal {
        TradingSignal::new(TradeAction::Sell, "XAUUSD", dec!(2350), dec!(2360), dec!(2330)).unwrap()
    }

    #[test]
    fn test_requires_url() {
        assert!(matches!(
            WebhookExecutor::new(WebhookConfig::default()),
            Err(ExecutionError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_accepted_trade_posts_json() {
        let received: Arc<Mutex<Vec<Value>>> = Arc::default();
        let sink = received.clone();
        let router = Router::new().route(
            "/hook",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().push(body);
                    StatusCode::ACCEPTED
                }
            }),
        );
        let url = serve(router).await;

        let executor = WebhookExecutor::new(WebhookConfig {
            url,
            ..Default::default()
        })
        .unwrap();
        let report = executor.execute(&signal(), TradeSource::Manual).await.unwrap();
        assert_eq!(report.venue, "webhook");
        assert_eq!(report.reference.as_deref(), Some("HTTP 202"));

        let bodies = received.lock().clone();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["pair"], "XAUUSD");
        assert_eq!(bodies[0]["action"], "SELL");
        assert_eq!(bodies[0]["source"]["type"], "manual");
    }

    #[tokio::test]
    async fn test_non_2xx_is_rejected() {
        let router = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "market closed") }),
        );
        let url = serve(router).await;

        let executor = WebhookExecutor::new(WebhookConfig {
            url,
            ..Default::default()
        })
        .unwrap();
        let err = executor.execute(&signal(), TradeSource::Manual).await.unwrap_err();
        match err {
            ExecutionError::Rejected(msg) => assert!(msg.contains("market closed"), "{msg}"),
            other => panic!("expected rejection, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let executor = WebhookExecutor::new(WebhookConfig {
            url: format!("http://{addr}/hook"),
            timeout_ms: 1000,
            ..Default::default()
        })
        .unwrap();
        let err = executor.execute(&signal(), TradeSource::Manual).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Unavailable(_)), "{err}");
    }
}
