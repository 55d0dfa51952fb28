//! One-shot deferred actions tied to a cancellation token.
//!
//! The display needs two short delays: a settle period before the canvas is
//! mounted (so layout has a non-zero size) and a small wait before reading
//! the local clipboard after focus is gained.  Both must be cancelled if the
//! owning session is torn down first.  Every action is scheduled on a child
//! of the session (or display) token, so one `cancel()` drops them all.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to an action scheduled with [`schedule_once`].
///
/// Dropping the handle does not cancel the action.
pub struct DeferredAction {
    label: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl DeferredAction {
    /// Prevents the action from firing if the delay has not elapsed yet.
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!(action = self.label, "cancelling deferred action");
        }
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Runs `action` once after `delay`, unless `parent` (or the returned handle)
/// is cancelled first.
///
/// Once the delay has elapsed the action runs to completion; cancellation only
/// wins the race while the timer is pending.
pub fn schedule_once<F, Fut>(
    parent: &CancellationToken,
    label: &'static str,
    delay: Duration,
    action: F,
) -> DeferredAction
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let token = parent.child_token();
    let guard = token.clone();

    let handle = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = guard.cancelled() => {
                debug!(action = label, "deferred action cancelled before firing");
            }
            _ = tokio::time::sleep(delay) => {
                action().await;
            }
        }
    });

    DeferredAction {
        label,
        token,
        handle,
    }
}
