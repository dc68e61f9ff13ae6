//! Detached search-engine notification.
//!
//! Property writes announce changed URLs to search engines without waiting
//! for the result. [`NotificationDispatcher`] spawns each announcement as a
//! tracked background task, logs failures and never reports them to callers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::task::TaskTracker;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Request(String),

    #[error("Search engine returned HTTP {0}")]
    HttpStatus(u16),
}

/// Announces changed canonical URLs to search engines.
#[async_trait]
pub trait SearchNotifier: Send + Sync {
    async fn notify(&self, urls: &[String]) -> Result<(), NotifyError>;
}

/// Spawns notifications as background tasks.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn SearchNotifier>,
    tracker: TaskTracker,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn SearchNotifier>) -> Self {
        Self {
            notifier,
            tracker: TaskTracker::new(),
        }
    }

    /// Schedule a notification for `urls` and return immediately.
    pub fn schedule(&self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        let notifier = Arc::clone(&self.notifier);
        self.tracker.spawn(async move {
            match notifier.notify(&urls).await {
                Ok(()) => tracing::debug!(count = urls.len(), "Search engines notified"),
                Err(e) => tracing::warn!(urls = ?urls, error = %e, "Search engine notification failed"),
            }
        });
    }

    /// Number of notifications still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every scheduled notification to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Like [`drain`](Self::drain) but gives up after `timeout`. Returns
    /// `false` if notifications were still running.
    pub async fn drain_with_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.drain()).await.is_ok()
    }
}

/// Notifier that does nothing. Used when search pings are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl SearchNotifier for NoopNotifier {
    async fn notify(&self, _urls: &[String]) -> Result<(), NotifyError> {
        Ok(())
    }
}
