//! Main application orchestration.
//!
//! Builds the collaborators from [`AppConfig`], seeds channels, starts the
//! listeners and the API server, and runs until Ctrl-C or until the
//! shutdown token is cancelled.

use crate::config::{AppConfig, ExecutorKind};
use crate::error::AppResult;
use fxbot_api::run_server;
use fxbot_core::NewChannel;
use fxbot_executor::{DynTradeExecutor, PaperExecutor, WebhookExecutor};
use fxbot_listener::BotService;
use fxbot_persistence::{DynChannelStore, JsonChannelStore, TradeJournal};
use fxbot_telemetry::AuditLog;
use fxbot_transport::{DynChannelTransport, TelegramTransport};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    store: DynChannelStore,
    service: Arc<BotService>,
    journal: Option<Arc<TradeJournal>>,
    shutdown: CancellationToken,
}

impl Application {
    /// Build the production collaborators from `config`.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let store: DynChannelStore = Arc::new(JsonChannelStore::open(
            &config.persistence.channels_path,
        )?);

        if config.telegram.bot_token.is_empty() {
            warn!("Telegram bot token is not configured, listeners will not start");
        }
        let transport: DynChannelTransport =
            Arc::new(TelegramTransport::new(config.telegram.clone().into())?);

        let journal = Arc::new(TradeJournal::new(&config.persistence.trades_dir));
        let executor: DynTradeExecutor = match config.executor.kind {
            ExecutorKind::Paper => Arc::new(PaperExecutor::new(journal.clone())),
            ExecutorKind::Webhook => Arc::new(
                WebhookExecutor::new(config.executor.webhook())?.with_journal(journal.clone()),
            ),
        };
        info!(kind = ?config.executor.kind, "Executor configured");

        let audit = Arc::new(AuditLog::new(&config.audit.dir, config.audit.queue_capacity));

        let mut app = Self::with_components(config, store, transport, executor, audit);
        app.journal = Some(journal);
        Ok(app)
    }

    /// Build around caller-supplied collaborators.
    pub fn with_components(
        config: AppConfig,
        store: DynChannelStore,
        transport: DynChannelTransport,
        executor: DynTradeExecutor,
        audit: Arc<AuditLog>,
    ) -> Self {
        let service = Arc::new(BotService::new(
            store.clone(),
            transport,
            executor,
            audit,
            &config.listener,
        ));
        Self {
            config,
            store,
            service,
            journal: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn service(&self) -> &Arc<BotService> {
        &self.service
    }

    /// Cancelling this token stops [`Application::run`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Insert configured seed channels that are not yet persisted.
    /// Returns the number inserted.
    pub fn seed_channels(&self) -> AppResult<usize> {
        let mut inserted = 0;
        for seed in &self.config.channels {
            if self.store.find_by_channel_id(&seed.channel_id)?.is_some() {
                continue;
            }
            let channel = self.store.create(NewChannel::from(seed))?;
            info!(id = channel.id, channel = %channel.channel_id, "Seed channel added");
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Seed, autostart, serve the API and wait for shutdown.
    pub async fn run(self) -> AppResult<()> {
        let seeded = self.seed_channels()?;
        info!(seeded, "Channels seeded");
        self.service.audit().lifecycle("Application started");

        if self.config.listener.autostart {
            match self.service.start_bot().await {
                Ok(started) => info!(started, "Listeners autostarted"),
                Err(e) => {
                    error!(error = %e, "Autostart failed");
                    self.service.audit().lifecycle(format!("Autostart failed: {e}"));
                }
            }
        }

        let api_handle = if self.config.api.enabled {
            let service = self.service.clone();
            let config = self.config.api.clone();
            let token = self.shutdown.child_token();
            Some(tokio::spawn(async move {
                if let Err(e) = run_server(service, config, token).await {
                    error!(error = %e, "API server failed");
                }
            }))
        } else {
            info!("API server disabled");
            None
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
            () = self.shutdown.cancelled() => info!("Shutdown requested"),
        }

        // Cleanup
        self.shutdown.cancel();
        if let Some(handle) = api_handle {
            if let Err(e) = handle.await {
                warn!(?e, "API task ended abnormally");
            }
        }
        self.service.shutdown().await;
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.close() {
                warn!(?e, "Failed to close trade journal");
            }
        }

        info!("Shutdown complete");
        Ok(())
    }
}
