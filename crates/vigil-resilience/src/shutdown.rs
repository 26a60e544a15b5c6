use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

type CleanupFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;
type CleanupFn = Box<dyn FnOnce() -> CleanupFuture + Send>;

/// Lifecycle guard for orderly process termination.
///
/// Listens for the standard termination signals, exposes a non-blocking
/// [`should_stop`](GracefulShutdown::should_stop) flag that latches
/// exactly once, and runs registered cleanup callbacks in reverse
/// registration order when [`shutdown`](GracefulShutdown::shutdown) is
/// called. A failing callback is logged and does not prevent the
/// remaining callbacks from running.
pub struct GracefulShutdown {
    stop: Arc<AtomicBool>,
    cleanups: Mutex<Vec<(String, CleanupFn)>>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            cleanups: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the signal listener (ctrl-c, plus SIGTERM on unix).
    /// The first signal received latches the stop flag.
    pub fn listen(&self) {
        let stop = self.stop.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            if !stop.swap(true, Ordering::SeqCst) {
                info!("Termination signal received, shutting down");
            }
        });
    }

    /// Non-blocking check of the stop flag.
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Latch the stop flag programmatically. Idempotent.
    pub fn trigger(&self) {
        if !self.stop.swap(true, Ordering::SeqCst) {
            info!("Shutdown triggered");
        }
    }

    /// Handle for observing the stop flag from other tasks, e.g. an
    /// axum `with_graceful_shutdown` future.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Register a cleanup callback. Callbacks run in reverse
    /// registration order at shutdown.
    pub fn on_cleanup<F, Fut>(&self, name: impl Into<String>, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.cleanups
            .lock()
            .push((name.into(), Box::new(move || Box::pin(f()))));
    }

    /// Run all registered cleanups, newest first, awaiting each.
    /// Failures are logged and isolated.
    pub async fn shutdown(&self) {
        self.trigger();
        let mut cleanups = {
            let mut guard = self.cleanups.lock();
            std::mem::take(&mut *guard)
        };
        while let Some((name, cleanup)) = cleanups.pop() {
            match cleanup().await {
                Ok(()) => info!(cleanup = %name, "Cleanup finished"),
                Err(e) => error!(cleanup = %name, error = %e, "Cleanup failed"),
            }
        }
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigterm.recv() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
