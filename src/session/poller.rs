//! Session keep-alive poller.
//!
//! # Responsibilities
//! - Periodically refresh the session while it is still valid
//! - Own its lifecycle: explicit start/stop, no process-wide flags
//!
//! # Design Decisions
//! - Refresh capability and validity predicate are injected
//! - Starting twice is an error; stopping a stopped poller is a no-op
//! - A failed refresh is logged and polling continues; the request path
//!   handles the forced logout
//! - The poller stops itself once the predicate reports no session

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::session::refresh::Refresh;

/// Predicate telling the poller whether a session is still worth keeping alive.
pub type SessionCheck = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollerError {
    #[error("session poller is already running")]
    AlreadyRunning,

    #[error("session poller interval must be non-zero")]
    ZeroInterval,
}

struct Running {
    stop_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

/// Owned keep-alive task.
pub struct SessionPoller {
    interval: Duration,
    refresher: Arc<dyn Refresh>,
    is_valid: SessionCheck,
    running: Mutex<Option<Running>>,
}

impl SessionPoller {
    /// Create a stopped poller. The interval is checked by `start`.
    pub fn new(interval: Duration, refresher: Arc<dyn Refresh>, is_valid: SessionCheck) -> Self {
        Self {
            interval,
            refresher,
            is_valid,
            running: Mutex::new(None),
        }
    }

    /// Spawn the polling task. Must be called inside a Tokio runtime.
    pub fn start(&self) -> Result<(), PollerError> {
        if self.interval.is_zero() {
            return Err(PollerError::ZeroInterval);
        }

        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            return Err(PollerError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let task = tokio::spawn(poll_loop(
            self.interval,
            self.refresher.clone(),
            self.is_valid.clone(),
            stop_rx,
        ));

        tracing::info!(interval_secs = self.interval.as_secs(), "Session poller started");
        *running = Some(Running { stop_tx, task });
        Ok(())
    }

    /// Signal the task to stop. Returns the task handle so callers can await it.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        let _ = running.stop_tx.send(());
        Some(running.task)
    }

    /// Whether the polling task is alive.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }
}

impl Drop for SessionPoller {
    fn drop(&mut self) {
        if let Some(running) = self
            .running
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            running.task.abort();
        }
    }
}

async fn poll_loop(
    interval: Duration,
    refresher: Arc<dyn Refresh>,
    is_valid: SessionCheck,
    mut stop: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !is_valid() {
                    tracing::info!("No active session, session poller exiting");
                    break;
                }
                if let Err(e) = refresher.refresh().await {
                    tracing::warn!(error = %e, "Keep-alive refresh failed");
                }
            }
            _ = stop.recv() => {
                tracing::info!("Session poller received stop signal, exiting loop");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::HttpResult;
    use futures_util::future::{BoxFuture, FutureExt};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingRefresh {
        calls: AtomicU32,
    }

    impl Refresh for CountingRefresh {
        fn refresh(&self) -> BoxFuture<'_, HttpResult<()>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }.boxed()
        }
    }

    fn always_valid() -> SessionCheck {
        Arc::new(|| true)
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_each_tick() {
        let refresh = Arc::new(CountingRefresh::default());
        let poller = SessionPoller::new(Duration::from_secs(60), refresh.clone(), always_valid());
        poller.start().unwrap();

        time::sleep(Duration::from_secs(185)).await;
        assert_eq!(refresh.calls.load(Ordering::SeqCst), 3);

        poller.stop().unwrap().await.unwrap();
        assert!(!poller.is_running());
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let poller = SessionPoller::new(
            Duration::from_secs(60),
            Arc::new(CountingRefresh::default()),
            always_valid(),
        );
        poller.start().unwrap();
        assert_eq!(poller.start(), Err(PollerError::AlreadyRunning));
        poller.stop();
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let poller = SessionPoller::new(
            Duration::from_secs(60),
            Arc::new(CountingRefresh::default()),
            always_valid(),
        );
        assert!(poller.stop().is_none());
        poller.start().unwrap();
        assert!(poller.stop().is_some());
        assert!(poller.stop().is_none());
        poller.start().unwrap();
        assert!(poller.is_running());
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let refresh = Arc::new(CountingRefresh::default());
        let poller = SessionPoller::new(Duration::ZERO, refresh.clone(), always_valid());

        assert_eq!(poller.start(), Err(PollerError::ZeroInterval));
        assert!(!poller.is_running());
        assert!(poller.stop().is_none());
        assert_eq!(refresh.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_session_gone() {
        let refresh = Arc::new(CountingRefresh::default());
        let valid = Arc::new(AtomicBool::new(true));
        let flag = valid.clone();
        let poller = SessionPoller::new(
            Duration::from_secs(10),
            refresh.clone(),
            Arc::new(move || flag.load(Ordering::SeqCst)),
        );
        poller.start().unwrap();

        time::sleep(Duration::from_secs(15)).await;
        valid.store(false, Ordering::SeqCst);
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(refresh.calls.load(Ordering::SeqCst), 1);
        assert!(!poller.is_running());
    }
}
