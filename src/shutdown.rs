//! Cancellation coordination.
//!
//! A run supports operator interruption: once a [`ShutdownCoordinator`] is
//! triggered, no new work units are dispatched and no retry fires, while
//! in-flight units finish or fail normally. The coordinator is just an
//! atomic flag plus a notifier; one instance is shared across the CLI, the
//! executor, and the fetcher's retry loop.

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

static GLOBAL: OnceCell<SharedShutdown> = OnceCell::new();

/// Coordinates graceful cancellation across async tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    triggered: AtomicBool,
    notify: Notify,
}

impl ShutdownCoordinator {
    /// Create a fresh shared coordinator.
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::default())
    }

    /// Register `handle` as the process-wide coordinator. Later calls are
    /// no-ops; the first registration wins.
    pub fn install_global(handle: SharedShutdown) {
        let _ = GLOBAL.set(handle);
    }

    /// The process-wide coordinator, when one has been installed.
    pub fn global() -> Option<SharedShutdown> {
        GLOBAL.get().cloned()
    }

    /// Trigger cancellation. Waiters are notified exactly once.
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether cancellation has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Wait until cancellation is triggered; immediate if it already was.
    pub async fn wait_triggered(&self) {
        if self.is_triggered() {
            return;
        }
        self.notify.notified().await;
    }
}
