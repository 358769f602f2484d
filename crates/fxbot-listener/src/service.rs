//! Bot service facade.
//!
//! The operations exposed to the REST adapter and the binary. Owns the
//! registry and dispatcher and talks to the transport, store and executor
//! collaborators only through their traits.
//!
//! `start_bot`, `stop_bot`, `create_channel` and `delete_channel` run one at
//! a time, so the set of stored channels cannot change while listeners are
//! being started or stopped for it.

use std::sync::Arc;

use fxbot_core::{AuditEvent, AuditKind, Channel, ChannelId, NewChannel, TradeSource, TradingSignal};
use fxbot_executor::{DynTradeExecutor, ExecutionReport};
use fxbot_persistence::DynChannelStore;
use fxbot_telemetry::AuditLog;
use fxbot_transport::DynChannelTransport;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ListenerConfig;
use crate::dispatch::Dispatcher;
use crate::error::{RegistryConflict, ServiceError, ServiceResult};
use crate::registry::{ListenerInfo, ListenerRegistry};

pub struct BotService {
    store: DynChannelStore,
    transport: DynChannelTransport,
    registry: ListenerRegistry,
    dispatcher: Arc<Dispatcher>,
    audit: Arc<AuditLog>,
    /// Held for the whole of each channel or bot lifecycle operation.
    lifecycle: Mutex<()>,
}

impl BotService {
    pub fn new(
        store: DynChannelStore,
        transport: DynChannelTransport,
        executor: DynTradeExecutor,
        audit: Arc<AuditLog>,
        config: &ListenerConfig,
    ) -> Self {
        let dispatcher = Arc::new(
            Dispatcher::new(executor, audit.clone(), config.message_log_limit)
                .with_parser(config.parser()),
        );
        Self::with_dispatcher(store, transport, dispatcher, config)
    }

    /// Build around an existing dispatcher (e.g. one with a custom parser).
    pub fn with_dispatcher(
        store: DynChannelStore,
        transport: DynChannelTransport,
        dispatcher: Arc<Dispatcher>,
        config: &ListenerConfig,
    ) -> Self {
        let registry = ListenerRegistry::new(
            transport.clone(),
            dispatcher.clone(),
            config.grace_period(),
            config.max_consecutive_errors,
        );
        let audit = dispatcher.audit().clone();
        Self {
            store,
            transport,
            registry,
            dispatcher,
            audit,
            lifecycle: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Start a listener for every persisted channel.
    ///
    /// Channels that already have a listener are skipped. Returns the number
    /// of listeners started by this call.
    pub async fn start_bot(&self) -> ServiceResult<usize> {
        let _lifecycle = self.lifecycle.lock().await;
        self.ensure_connected().await?;

        let ids = self.store.channel_ids()?;
        let mut started = 0;
        for id in &ids {
            match self.registry.start(id) {
                Ok(()) => started += 1,
                Err(conflict) => debug!(%conflict, "Skipping channel"),
            }
        }
        info!(channels = ids.len(), started, "Bot started");
        self.audit
            .lifecycle(format!("Bot started ({started} of {} channels)", ids.len()));
        Ok(started)
    }

    /// Stop every listener and disconnect the transport.
    pub async fn stop_bot(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        self.registry.stop_all().await;
        self.transport.disconnect().await;
        info!("Bot stopped");
        self.audit.lifecycle("Bot stopped");
    }

    /// Execute a signal submitted by an operator, bypassing the parser.
    pub async fn manual_trade(&self, signal: TradingSignal) -> ServiceResult<ExecutionReport> {
        info!(signal = %signal, "Manual trade submitted");
        Ok(self.dispatcher.execute(&signal, TradeSource::Manual).await?)
    }

    /// Remove and return all queued audit events.
    pub fn get_logs(&self) -> Vec<AuditEvent> {
        self.audit.drain()
    }

    /// Persist a channel, then start its listener.
    ///
    /// A transport that cannot connect does not undo the insert; the failure
    /// is audited and the listener can be started later with `start_bot`.
    pub async fn create_channel(&self, channel: NewChannel) -> ServiceResult<Channel> {
        let _lifecycle = self.lifecycle.lock().await;
        let channel = self.store.create(channel)?;
        info!(id = channel.id, channel = %channel.channel_id, "Channel created");
        self.audit.channel(
            &channel.channel_id,
            AuditKind::Lifecycle,
            format!("Channel registered: {}", channel.name),
        );

        if let Err(e) = self.ensure_connected().await {
            warn!(channel = %channel.channel_id, error = %e, "Listener not started");
            self.audit.channel(
                &channel.channel_id,
                AuditKind::Operational,
                format!("Listener not started: {e}"),
            );
            return Ok(channel);
        }
        if let Err(conflict) = self.registry.start(&channel.channel_id) {
            debug!(%conflict, "Listener already running");
        }
        Ok(channel)
    }

    pub fn list_channels(&self, skip: usize, limit: usize) -> ServiceResult<Vec<Channel>> {
        Ok(self.store.list(skip, limit)?)
    }

    pub fn get_channel(&self, id: u64) -> ServiceResult<Channel> {
        self.store.get(id)?.ok_or(ServiceError::ChannelNotFound(id))
    }

    /// Stop the channel's listener, then delete the row.
    pub async fn delete_channel(&self, id: u64) -> ServiceResult<Channel> {
        let _lifecycle = self.lifecycle.lock().await;
        let channel = self.get_channel(id)?;
        match self.registry.stop(&channel.channel_id).await {
            Ok(()) | Err(RegistryConflict::NotRunning(_)) => {}
            Err(conflict) => return Err(conflict.into()),
        }
        let removed = self.store.delete(id)?;
        info!(id, channel = %removed.channel_id, "Channel deleted");
        self.audit.channel(
            &removed.channel_id,
            AuditKind::Lifecycle,
            format!("Channel removed: {}", removed.name),
        );
        Ok(removed)
    }

    /// Current listeners, ordered by channel id.
    pub fn listeners(&self) -> Vec<ListenerInfo> {
        self.registry.snapshot()
    }

    pub fn is_listening(&self, channel_id: &ChannelId) -> bool {
        self.registry.state(channel_id).is_some()
    }

    /// Stop everything and flush the audit file.
    pub async fn shutdown(&self) {
        self.stop_bot().await;
        self.audit.lifecycle("Shutdown complete");
        self.audit.close();
    }

    async fn ensure_connected(&self) -> ServiceResult<()> {
        if !self.transport.is_connected() {
            self.transport.connect().await?;
        }
        Ok(())
    }
}
