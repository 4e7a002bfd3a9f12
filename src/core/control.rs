use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// User-facing run/pause switch.
///
/// Every resume hands out a fresh token derived from a root token; pausing
/// cancels the current one. A paused run is never continued, the next resume
/// starts a new run with fresh discovery.
#[derive(Debug, Clone, Default)]
pub struct RunToggle {
    root: CancellationToken,
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl RunToggle {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts (or restarts) running and returns the token for the new run.
    pub fn resume(&self) -> CancellationToken {
        let mut slot = self.slot();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        let token = self.root.child_token();
        *slot = Some(token.clone());
        token
    }

    pub fn pause(&self) {
        if let Some(token) = self.slot().take() {
            tracing::info!("⏸️ Pausing enrichment");
            token.cancel();
        }
    }

    /// Flips the state; returns the new run's token when switching to running.
    pub fn toggle(&self) -> Option<CancellationToken> {
        if self.is_running() {
            self.pause();
            None
        } else {
            Some(self.resume())
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot()
            .as_ref()
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }

    /// 第一次中斷時暫停；回傳 `true` 表示又收到第二次中斷
    pub async fn pause_on_interrupt<F, Fut>(&self, mut interrupt: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        if !interrupt().await {
            return false;
        }
        self.pause();
        interrupt().await
    }

    /// Cancels the current run and every future one.
    pub fn shutdown(&self) {
        self.root.cancel();
        self.slot().take();
    }
}
