//! Bot lifecycle state shared between the runtime, its run-loop task, and
//! command handlers.
//!
//! Every start opens a new run *generation*. A run-loop reporting its own
//! failure only takes effect while its generation is still current, so a
//! late failure from an old run can never stop a freshly restarted bot.

use chrono::{DateTime, Utc};
use meshbot_types::bot::BotState;
use tokio::sync::RwLock;

/// Point-in-time view of a bot's lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleSnapshot {
    pub state: BotState,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl LifecycleSnapshot {
    /// Time since the current run started; `None` unless running.
    pub fn uptime(&self) -> Option<std::time::Duration> {
        if self.state != BotState::Running {
            return None;
        }
        let started_at = self.started_at?;
        (Utc::now() - started_at).to_std().ok()
    }
}

#[derive(Debug, Default)]
struct LifecycleInner {
    snapshot: LifecycleSnapshot,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    inner: RwLock<LifecycleInner>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> LifecycleSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn state(&self) -> BotState {
        self.inner.read().await.snapshot.state
    }

    /// Enter `Running` and open a new generation.
    pub(crate) async fn begin_run(&self) -> u64 {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.snapshot = LifecycleSnapshot {
            state: BotState::Running,
            started_at: Some(Utc::now()),
            last_error: None,
        };
        inner.generation
    }

    /// Enter `Stopped` on request, whatever the generation.
    ///
    /// Returns `false` if the run had already settled on its own.
    pub(crate) async fn end_run(&self, error: Option<String>) -> bool {
        let mut inner = self.inner.write().await;
        if inner.snapshot.state != BotState::Running {
            return false;
        }
        inner.snapshot.state = BotState::Stopped;
        if error.is_some() {
            inner.snapshot.last_error = error;
        }
        true
    }

    /// Stop after a run-loop failure. Returns `false` if the run was already
    /// superseded or stopped.
    pub(crate) async fn fail(&self, generation: u64, error: String) -> bool {
        self.settle(generation, Some(error)).await
    }

    /// Stop after a run-loop returned on its own.
    pub(crate) async fn finish(&self, generation: u64) -> bool {
        self.settle(generation, None).await
    }

    async fn settle(&self, generation: u64, error: Option<String>) -> bool {
        let mut inner = self.inner.write().await;
        if inner.generation != generation || inner.snapshot.state != BotState::Running {
            return false;
        }
        inner.snapshot.state = BotState::Stopped;
        inner.snapshot.last_error = error;
        true
    }
}
