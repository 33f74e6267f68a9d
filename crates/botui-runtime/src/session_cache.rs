//! `sessionCache` (spec §5, §8): one chat-id-keyed map behind a single
//! mutex; eviction runs opportunistically every `CACHE_SWEEP_INTERVAL_REQUESTS`
//! requests rather than on a background timer. The same sweep also drives
//! each surviving session's `CallbackRegistry::clear_cache` (spec §4.6).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use botui_core::constants::CACHE_SWEEP_INTERVAL_REQUESTS;
use crate::session::Session;

/// Injectable time source so eviction can be tested with a mock clock
/// instead of sleeping real wall-clock seconds (spec §8 "advancing a mock
/// clock beyond `clearCacheTime`").
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry {
    session: Arc<Session>,
    last_touch: Instant,
}

pub struct SessionCache {
    entries: Mutex<HashMap<i64, Entry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    request_counter: Mutex<u64>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock, ttl, request_counter: Mutex::new(0) }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns the cached session for `chat_id`, or builds one via
    /// `factory` and caches it. Touches the entry's last-access time and
    /// runs the opportunistic sweep on every `CACHE_SWEEP_INTERVAL_REQUESTS`th
    /// call (spec §5).
    pub async fn get_or_create(&self, chat_id: i64, factory: impl FnOnce() -> Arc<Session>) -> Arc<Session> {
        self.maybe_sweep().await;

        let existing = {
            let mut entries = self.entries.lock().unwrap();
            let now = self.clock.now();
            entries.get_mut(&chat_id).map(|entry| {
                entry.last_touch = now;
                entry.session.clone()
            })
        };
        if let Some(session) = existing {
            return session;
        }

        let session = factory();
        let now = self.clock.now();
        self.entries.lock().unwrap().insert(chat_id, Entry { session: session.clone(), last_touch: now });
        session
    }

    async fn maybe_sweep(&self) {
        let due = {
            let mut counter = self.request_counter.lock().unwrap();
            *counter += 1;
            *counter % CACHE_SWEEP_INTERVAL_REQUESTS as u64 == 0
        };
        if due {
            self.sweep().await;
        }
    }

    /// Evicts every entry idle past `ttl`, disposing its pages first, then
    /// sweeps each surviving session's own `CallbackRegistry` (spec §4.6's
    /// token TTL eviction) on the same cadence — there is no separate
    /// per-token TTL in the config, so the session's own `ttl` doubles as
    /// the callback-token max age. Exposed directly for tests (and a forced
    /// sweep outside the normal request-count cadence).
    pub async fn sweep(&self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        let (evicted, survivors): (Vec<Arc<Session>>, Vec<Arc<Session>>) = {
            let mut entries = self.entries.lock().unwrap();
            let mut evicted = Vec::new();
            entries.retain(|_, entry| {
                if now.duration_since(entry.last_touch) >= ttl {
                    evicted.push(entry.session.clone());
                    false
                } else {
                    true
                }
            });
            let survivors = entries.values().map(|entry| entry.session.clone()).collect();
            (evicted, survivors)
        };
        for session in evicted {
            session.dispose_all_pages().await;
        }
        for session in survivors {
            session.callback_registry().clear_cache(ttl);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct MockClock(Mutex<Instant>);
    impl MockClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Instant::now())))
        }
        fn advance(&self, d: Duration) {
            let mut t = self.0.lock().unwrap();
            *t += d;
        }
    }
    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.0.lock().unwrap()
        }
    }

    fn dummy_session(counter: &Arc<AtomicU64>) -> Arc<Session> {
        counter.fetch_add(1, Ordering::SeqCst);
        crate::session::test_support::dummy_session()
    }

    #[tokio::test]
    async fn returns_the_same_session_for_repeat_requests() {
        let cache = SessionCache::new(Duration::from_secs(3600));
        let counter = Arc::new(AtomicU64::new(0));
        let a = cache.get_or_create(1, || dummy_session(&counter)).await;
        let b = cache.get_or_create(1, || dummy_session(&counter)).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn eviction_past_ttl_constructs_a_fresh_session() {
        let clock = MockClock::new();
        let cache = SessionCache::with_clock(Duration::from_secs(60), clock.clone());
        let counter = Arc::new(AtomicU64::new(0));

        let a = cache.get_or_create(1, || dummy_session(&counter)).await;
        clock.advance(Duration::from_secs(120));
        cache.sweep().await;
        let b = cache.get_or_create(1, || dummy_session(&counter)).await;

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sweep_also_ages_out_a_surviving_session_callback_tokens() {
        // The mock clock never advances, so the session's own idle check
        // never trips — it survives the sweep. `CallbackRegistry::clear_cache`
        // times against the real clock though, so a short real sleep past
        // `ttl` is enough to prove `sweep()` forwards that ttl into it
        // (spec §4.6) without also evicting the session.
        let clock = MockClock::new();
        let ttl = Duration::from_millis(10);
        let cache = SessionCache::with_clock(ttl, clock);
        let counter = Arc::new(AtomicU64::new(0));
        let session = cache.get_or_create(1, || dummy_session(&counter)).await;

        let token = session.callback_registry().subscribe(Arc::new(|_inv| Box::pin(async {})));
        assert!(session.callback_registry().contains(&token));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.sweep().await;

        assert!(!session.callback_registry().contains(&token));
        assert_eq!(cache.len(), 1, "session itself must survive the same sweep");
    }
}
