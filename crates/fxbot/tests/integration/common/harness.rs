//! Application assembled over mock collaborators.

#![allow(dead_code)]

use fxbot::config::SeedChannel;
use fxbot::{AppConfig, Application};
use fxbot_core::ChannelId;
use fxbot_executor::MockExecutor;
use fxbot_persistence::JsonChannelStore;
use fxbot_telemetry::AuditLog;
use fxbot_transport::MockTransport;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const WAIT: Duration = Duration::from_secs(2);

pub struct TestHarness {
    pub app: Application,
    pub transport: Arc<MockTransport>,
    pub executor: Arc<MockExecutor>,
    pub audit: Arc<AuditLog>,
    pub dir: TempDir,
}

impl TestHarness {
    /// Harness with the given seed channels, API disabled and a short grace period.
    pub fn new(seeds: &[i64]) -> Self {
        let dir = TempDir::new().unwrap();
        Self::in_dir(dir, seeds)
    }

    pub fn in_dir(dir: TempDir, seeds: &[i64]) -> Self {
        let mut config = AppConfig::default();
        config.api.enabled = false;
        config.listener.grace_period_ms = 500;
        config.channels = seeds
            .iter()
            .map(|&id| SeedChannel {
                channel_id: ChannelId::from_chat_id(id),
                name: format!("channel {id}"),
            })
            .collect();

        let store = Arc::new(JsonChannelStore::open(dir.path().join("channels.json")).unwrap());
        let transport = Arc::new(MockTransport::new());
        let executor = Arc::new(MockExecutor::new());
        let audit = Arc::new(AuditLog::new(dir.path().join("audit"), 1000));

        let app = Application::with_components(
            config,
            store,
            transport.clone(),
            executor.clone(),
            audit.clone(),
        );
        Self {
            app,
            transport,
            executor,
            audit,
            dir,
        }
    }

    pub fn audit_dir(&self) -> PathBuf {
        self.dir.path().join("audit")
    }
}

/// Poll `cond` until it holds or [`WAIT`] elapses.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
