//! Running/paused state of the miner

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Whether the miner dispatches new files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinerStatus {
    /// New files are dispatched
    Running,
    /// New files wait; files already in flight finish
    Paused,
}

impl fmt::Display for MinerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinerStatus::Running => write!(f, "running"),
            MinerStatus::Paused => write!(f, "paused"),
        }
    }
}

/// Shared pause switch
///
/// Clones observe and control the same state.
#[derive(Debug, Clone)]
pub struct MinerState {
    tx: Arc<watch::Sender<MinerStatus>>,
}

impl MinerState {
    /// Create a state that starts running
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(MinerStatus::Running);
        Self { tx: Arc::new(tx) }
    }

    /// Stop dispatching new files
    pub fn pause(&self) {
        if self.tx.send_replace(MinerStatus::Paused) == MinerStatus::Running {
            info!("Miner paused");
        }
    }

    /// Resume dispatching
    pub fn resume(&self) {
        if self.tx.send_replace(MinerStatus::Running) == MinerStatus::Paused {
            info!("Miner resumed");
        }
    }

    /// Current status
    pub fn status(&self) -> MinerStatus {
        *self.tx.borrow()
    }

    /// Check if the miner is paused
    pub fn is_paused(&self) -> bool {
        self.status() == MinerStatus::Paused
    }

    /// Wait until the miner is running
    ///
    /// Returns immediately when it already is.
    pub async fn wait_until_running(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|status| *status == MinerStatus::Running).await;
    }
}

impl Default for MinerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_running() {
        let state = MinerState::new();
        assert_eq!(state.status(), MinerStatus::Running);
        assert!(!state.is_paused());
    }

    #[test]
    fn test_pause_resume() {
        let state = MinerState::new();
        let observer = state.clone();

        state.pause();
        assert_eq!(observer.status(), MinerStatus::Paused);

        state.pause();
        assert!(observer.is_paused());

        observer.resume();
        assert_eq!(state.status(), MinerStatus::Running);
    }

    #[test]
    fn test_display() {
        assert_eq!(MinerStatus::Running.to_string(), "running");
        assert_eq!(MinerStatus::Paused.to_string(), "paused");
    }

    #[tokio::test]
    async fn test_wait_returns_when_running() {
        let state = MinerState::new();
        tokio::time::timeout(Duration::from_secs(1), state.wait_until_running())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_blocks_until_resumed() {
        let state = MinerState::new();
        state.pause();

        let waiter = state.clone();
        let handle = tokio::spawn(async move { waiter.wait_until_running().await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        state.resume();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
