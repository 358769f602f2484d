//! Audit log sink.
//!
//! Every recorded [`AuditEvent`] goes to three places:
//! 1. the audit file (`audit_YYYY-MM-DD.jsonl`), flushed per event
//! 2. a bounded in-memory queue drained by polling clients; when full the
//!    oldest event is dropped
//! 3. a `tracing` event
//!
//! The file is the durable record. The queue is lost on restart.

use fxbot_core::{AuditEvent, AuditKind, ChannelId};
use fxbot_persistence::JsonLinesWriter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

pub struct AuditLog {
    file: Option<Mutex<JsonLinesWriter<AuditEvent>>>,
    queue: Mutex<VecDeque<AuditEvent>>,
    capacity: usize,
}

impl AuditLog {
    /// Audit log writing to `dir`.
    pub fn new(dir: impl AsRef<Path>, capacity: usize) -> Self {
        Self {
            file: Some(Mutex::new(JsonLinesWriter::new(dir, "audit", 1))),
            ..Self::in_memory(capacity)
        }
    }

    /// Audit log without a file.
    pub fn in_memory(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            file: None,
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_QUEUE_CAPACITY))),
            capacity,
        }
    }

    pub fn record(&self, event: AuditEvent) {
        let channel = event.channel_id.as_ref().map(ChannelId::as_str);
        match event.kind {
            AuditKind::ParseFailure | AuditKind::Operational => {
                warn!(kind = %event.kind, channel = ?channel, message = %event.message, "Audit");
            }
            _ => info!(kind = %event.kind, channel = ?channel, message = %event.message, "Audit"),
        }

        if let Some(file) = &self.file {
            if let Err(e) = file.lock().add_record(&event) {
                warn!(?e, "Failed to write audit event");
            }
        }

        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(event);
    }

    /// Record an event without a channel.
    pub fn lifecycle(&self, message: impl Into<String>) {
        self.record(AuditEvent::new(AuditKind::Lifecycle, message));
    }

    /// Record an event scoped to a channel.
    pub fn channel(&self, channel_id: &ChannelId, kind: AuditKind, message: impl Into<String>) {
        self.record(AuditEvent::for_channel(channel_id, kind, message));
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain(&self) -> Vec<AuditEvent> {
        self.queue.lock().drain(..).collect()
    }

    /// Copy of the queue without draining it.
    pub fn snapshot(&self) -> Vec<AuditEvent> {
        self.queue.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Flush and close the audit file.
    pub fn close(&self) {
        if let Some(file) = &self.file {
            if let Err(e) = file.lock().close() {
                warn!(?e, "Failed to close audit file");
            }
        }
    }
}
