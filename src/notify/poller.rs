//! Cancellable, self-rescheduling poll loops
//!
//! Each poller owns its cancellation state and task handle, so stopping or
//! breaking one never affects another. Teardown cancels the token and
//! aborts the task, which prevents writes after the owner is gone.

use crate::api::ApiError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

/// A cooperative cancellation token.
///
/// The owner sets the token; the poll loop checks it before every tick.
/// Cancellation during a tick has no effect until the next check.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A running poll loop: tick, sleep, repeat until cancelled.
///
/// Tick failures are read-path and best-effort: they are logged and the
/// loop simply tries again on the next tick.
pub struct Poller {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn a loop that runs `tick` immediately and then every `every`.
    pub fn spawn<F, Fut>(name: &'static str, every: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let handle = tokio::spawn(async move {
            loop {
                if loop_token.is_cancelled() {
                    break;
                }
                if let Err(error) = tick().await {
                    warn!(poller = name, %error, "poll failed, retrying next tick");
                }
                tokio::time::sleep(every).await;
            }
        });
        Self {
            name,
            token,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the loop and abort its task.
    pub fn stop(self) {
        self.token.cancel();
        self.handle.abort();
    }
}
