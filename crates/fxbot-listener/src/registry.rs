//! Channel listener registry.
//!
//! Holds at most one listener per [`ChannelId`]. The handle map is the only
//! state shared between listeners; every check, insert and removal happens
//! under its mutex, which is never held across an `.await`.
//!
//! Stopping is cooperative: the listener's token is cancelled and the task
//! is given the grace period to finish its current message. Only after the
//! grace period elapses is the task aborted. The entry is removed once the
//! task has ended, so a later `start` always creates a fresh listener.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use fxbot_core::{AuditKind, ChannelId};
use fxbot_telemetry::{AuditLog, Metrics};
use fxbot_transport::DynChannelTransport;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::error::RegistryConflict;
use crate::listener::{Listener, Termination};

/// Listener lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerState {
    Starting,
    Running,
    Cancelling,
    Stopped,
}

/// Point-in-time view of one listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerInfo {
    pub channel_id: ChannelId,
    pub state: ListenerState,
    pub started_at: DateTime<Utc>,
}

struct Handle {
    /// Distinguishes this listener from later ones on the same channel.
    generation: u64,
    state: ListenerState,
    started_at: DateTime<Utc>,
    token: CancellationToken,
    abort: AbortHandle,
    /// Becomes `true` (or closes) when the task has ended.
    done: watch::Receiver<bool>,
}

struct Inner {
    handles: Mutex<HashMap<ChannelId, Handle>>,
    next_generation: Mutex<u64>,
    transport: DynChannelTransport,
    dispatcher: Arc<Dispatcher>,
    audit: Arc<AuditLog>,
    grace_period: Duration,
    max_consecutive_errors: u32,
}

/// Registry of running channel listeners.
#[derive(Clone)]
pub struct ListenerRegistry {
    inner: Arc<Inner>,
}

impl ListenerRegistry {
    pub fn new(
        transport: DynChannelTransport,
        dispatcher: Arc<Dispatcher>,
        grace_period: Duration,
        max_consecutive_errors: u32,
    ) -> Self {
        let audit = dispatcher.audit().clone();
        Self {
            inner: Arc::new(Inner {
                handles: Mutex::new(HashMap::new()),
                next_generation: Mutex::new(0),
                transport,
                dispatcher,
                audit,
                grace_period,
                max_consecutive_errors,
            }),
        }
    }

    /// Start a listener for `channel_id`.
    ///
    /// Check and insert are atomic: of two concurrent starts exactly one
    /// succeeds and the other gets [`RegistryConflict::AlreadyRunning`].
    pub fn start(&self, channel_id: &ChannelId) -> Result<(), RegistryConflict> {
        let mut handles = self.inner.handles.lock();
        if handles.contains_key(channel_id) {
            debug!(channel = %channel_id, "Listener already running");
            return Err(RegistryConflict::AlreadyRunning(channel_id.clone()));
        }

        let generation = {
            let mut next = self.inner.next_generation.lock();
            *next += 1;
            *next
        };
        let token = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);

        let listener = Listener {
            channel_id: channel_id.clone(),
            transport: self.inner.transport.clone(),
            dispatcher: self.inner.dispatcher.clone(),
            token: token.clone(),
            max_consecutive_errors: self.inner.max_consecutive_errors,
        };
        // recorded before the task exists, so it precedes any exit entry
        info!(channel = %channel_id, "Listener starting");
        self.inner
            .audit
            .channel(channel_id, AuditKind::Lifecycle, "Listener started");

        let inner = self.inner.clone();
        let id = channel_id.clone();
        let task = tokio::spawn(async move {
            let running = inner.clone();
            let running_id = id.clone();
            let termination = listener
                .run(move || running.mark_running(&running_id, generation))
                .await;
            inner.on_exit(&id, generation, &termination);
            let _ = done_tx.send(true);
        });

        handles.insert(
            channel_id.clone(),
            Handle {
                generation,
                state: ListenerState::Starting,
                started_at: Utc::now(),
                token,
                abort: task.abort_handle(),
                done: done_rx,
            },
        );
        Metrics::active_listeners_set(handles.len());
        Ok(())
    }

    /// Stop the listener for `channel_id` and wait until it has ended.
    ///
    /// A second concurrent stop waits for the same termination.
    pub async fn stop(&self, channel_id: &ChannelId) -> Result<(), RegistryConflict> {
        let (generation, abort, mut done) = {
            let mut handles = self.inner.handles.lock();
            let handle = handles
                .get_mut(channel_id)
                .ok_or_else(|| RegistryConflict::NotRunning(channel_id.clone()))?;
            if handle.state != ListenerState::Stopped {
                handle.state = ListenerState::Cancelling;
            }
            handle.token.cancel();
            (handle.generation, handle.abort.clone(), handle.done.clone())
        };
        debug!(channel = %channel_id, "Listener cancelling");

        let mut aborted = false;
        if tokio::time::timeout(self.inner.grace_period, wait_done(&mut done))
            .await
            .is_err()
        {
            warn!(
                channel = %channel_id,
                grace_ms = self.inner.grace_period.as_millis(),
                "Listener did not stop within grace period, aborting"
            );
            abort.abort();
            aborted = true;
            wait_done(&mut done).await;
        }

        let removed = {
            let mut handles = self.inner.handles.lock();
            let removed = handles
                .get(channel_id)
                .is_some_and(|h| h.generation == generation);
            if removed {
                handles.remove(channel_id);
            }
            Metrics::active_listeners_set(handles.len());
            removed
        };

        if removed {
            if aborted {
                Metrics::listener_terminated("aborted");
                self.inner.audit.channel(
                    channel_id,
                    AuditKind::Operational,
                    "Listener aborted after grace period",
                );
            } else {
                Metrics::listener_terminated(Termination::Cancelled.cause());
                self.inner
                    .audit
                    .channel(channel_id, AuditKind::Lifecycle, "Listener stopped");
            }
            info!(channel = %channel_id, aborted, "Listener stopped");
        }
        Ok(())
    }

    /// Stop every listener, waiting for all of them.
    pub async fn stop_all(&self) {
        let ids: Vec<ChannelId> = self.inner.handles.lock().keys().cloned().collect();
        if ids.is_empty() {
            return;
        }
        info!(count = ids.len(), "Stopping all listeners");
        join_all(ids.iter().map(|id| self.stop(id))).await;
    }

    pub fn state(&self, channel_id: &ChannelId) -> Option<ListenerState> {
        self.inner.handles.lock().get(channel_id).map(|h| h.state)
    }

    /// All listeners, ordered by channel id.
    pub fn snapshot(&self) -> Vec<ListenerInfo> {
        let mut infos: Vec<ListenerInfo> = self
            .inner
            .handles
            .lock()
            .iter()
            .map(|(id, h)| ListenerInfo {
                channel_id: id.clone(),
                state: h.state,
                started_at: h.started_at,
            })
            .collect();
        infos.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        infos
    }

    /// Listeners that are starting or running.
    pub fn running_count(&self) -> usize {
        self.inner
            .handles
            .lock()
            .values()
            .filter(|h| matches!(h.state, ListenerState::Starting | ListenerState::Running))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.handles.lock().is_empty()
    }
}

impl Inner {
    fn mark_running(&self, channel_id: &ChannelId, generation: u64) {
        let mut handles = self.handles.lock();
        if let Some(handle) = handles.get_mut(channel_id) {
            if handle.generation == generation && handle.state == ListenerState::Starting {
                handle.state = ListenerState::Running;
            }
        }
    }

    /// Bookkeeping when a listener task ends. A listener that ended on its
    /// own removes itself; one being stopped is left for `stop` to remove.
    fn on_exit(&self, channel_id: &ChannelId, generation: u64, termination: &Termination) {
        let self_terminated = {
            let mut handles = self.handles.lock();
            let Some(handle) = handles.get_mut(channel_id) else {
                return;
            };
            if handle.generation != generation {
                return;
            }
            if handle.state == ListenerState::Cancelling {
                handle.state = ListenerState::Stopped;
                false
            } else {
                handles.remove(channel_id);
                Metrics::active_listeners_set(handles.len());
                true
            }
        };

        if self_terminated {
            warn!(channel = %channel_id, cause = termination.cause(), "Listener terminated");
            Metrics::listener_terminated(termination.cause());
            self.audit.channel(
                channel_id,
                AuditKind::Operational,
                format!("Listener terminated: {}", termination.describe()),
            );
        }
    }
}

async fn wait_done(done: &mut watch::Receiver<bool>) {
    // a closed channel means the task is gone
    let _ = done.wait_for(|finished| *finished).await;
}
