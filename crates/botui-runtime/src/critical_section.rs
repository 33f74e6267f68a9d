//! Safe-stop critical sections (spec §5, §8 supplement): "shutdown waits
//! for 'critical sections' ... to drain, then cancels the token." A
//! critical section is a reference-counted guard users enter around work
//! that must finish even if a stop was requested mid-flight.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Shared between every `CriticalSectionGuard` issued for one session and
/// the safe-stop waiter. `stopping` gates new user-facing work; `count`
/// tracks in-flight critical sections; `drained` wakes whoever is waiting
/// for `count` to reach zero once stopping has been requested.
#[derive(Default)]
struct Inner {
    stopping: AtomicBool,
    count: AtomicUsize,
    drained: Notify,
}

#[derive(Clone, Default)]
pub struct SafeStop(Arc<Inner>);

impl SafeStop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stopping(&self) -> bool {
        self.0.stopping.load(Ordering::Acquire)
    }

    /// Enter a critical section; the returned guard decrements the count
    /// and notifies any drain-waiter when dropped.
    pub fn enter(&self) -> CriticalSectionGuard {
        self.0.count.fetch_add(1, Ordering::AcqRel);
        CriticalSectionGuard { inner: self.0.clone() }
    }

    /// Raise the stop flag. Callers should stop accepting new updates for
    /// this session immediately after calling this.
    pub fn request_stop(&self) {
        self.0.stopping.store(true, Ordering::Release);
    }

    /// Wait for every currently-entered critical section to drain. Safe to
    /// call even if none are outstanding (returns immediately).
    pub async fn wait_drained(&self) {
        loop {
            if self.0.count.load(Ordering::Acquire) == 0 {
                return;
            }
            self.0.drained.notified().await;
        }
    }
}

/// RAII guard returned by [`SafeStop::enter`]. Dropping it (including via
/// panic unwinding) always decrements the shared count.
pub struct CriticalSectionGuard {
    inner: Arc<Inner>,
}

impl Drop for CriticalSectionGuard {
    fn drop(&mut self) {
        let previous = self.inner.count.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}
