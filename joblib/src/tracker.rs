use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counts runners that have been started but not yet finalized.
///
/// A runner holds a [`RunningGuard`] for its whole life. Dropping the guard, including during a
/// panic unwind, is the only way the count goes down, so every runner is released exactly once.
#[derive(Clone, Debug, Default)]
pub struct RunningTracker {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    running: AtomicUsize,
    idle: Notify,
}

#[derive(Debug)]
pub struct RunningGuard {
    inner: Arc<Inner>,
}

impl RunningTracker {
    pub fn acquire(&self) -> RunningGuard {
        self.inner.running.fetch_add(1, Ordering::SeqCst);
        RunningGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn running(&self) -> usize {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Resolves once no runner is left.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // register before checking the count so a release in between is not missed
            notified.as_mut().enable();
            if self.running() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if self.inner.running.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
