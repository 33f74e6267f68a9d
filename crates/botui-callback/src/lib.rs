//! Opaque callback token registry (spec §4.6).
//!
//! Tokens are the only data the chat platform echoes back on a button
//! click, so they're scoped per bot-user session and carry a short session
//! id so tokens minted by an older worker process are recognisable as
//! stale after a restart rather than colliding with freshly issued ones.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use botui_core::constants::TOKEN_SEPARATOR;

pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type CallbackHandler = Arc<dyn Fn(CallbackInvocation) -> HandlerFuture + Send + Sync>;

/// Everything a handler needs about the click that invoked it.
#[derive(Debug, Clone)]
pub struct CallbackInvocation {
    pub query_id: String,
    pub token: String,
    pub message_id: i64,
    pub chat_id: i64,
}

struct Entry {
    handler: CallbackHandler,
    created_at: Instant,
}

/// Per-user registry mapping opaque tokens to handlers. One registry lives
/// on each bot-user session (`baseBotUser.callbackFactory`, spec §4.8).
pub struct CallbackRegistry {
    session_short_id: String,
    counter: AtomicU64,
    entries: Mutex<HashMap<String, Entry>>,
}

impl CallbackRegistry {
    pub fn new(session_short_id: impl Into<String>) -> Self {
        Self {
            session_short_id: session_short_id.into(),
            counter: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register `handler`, returning the token a keyboard button should
    /// carry as its callback data.
    pub fn subscribe(&self, handler: CallbackHandler) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let token = format!("{}{TOKEN_SEPARATOR}{n}", self.session_short_id);
        self.entries.lock().unwrap().insert(token.clone(), Entry { handler, created_at: Instant::now() });
        token
    }

    pub fn unsubscribe(&self, token: &str) {
        self.entries.lock().unwrap().remove(token);
    }

    pub fn unsubscribe_many<I: IntoIterator<Item = T>, T: AsRef<str>>(&self, tokens: I) {
        let mut entries = self.entries.lock().unwrap();
        for token in tokens {
            entries.remove(token.as_ref());
        }
    }

    /// Look up and invoke the handler bound to `invocation.token`. Returns
    /// `false` if the token is unknown (stale button, already unsubscribed).
    pub async fn invoke(&self, invocation: CallbackInvocation) -> bool {
        let handler = {
            let entries = self.entries.lock().unwrap();
            entries.get(&invocation.token).map(|e| e.handler.clone())
        };
        match handler {
            Some(handler) => {
                handler(invocation).await;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.lock().unwrap().contains_key(token)
    }

    /// Evict entries older than `max_age`. Called on every `SessionCache`
    /// sweep (spec §5: every 100 requests) for each session still live
    /// after that sweep's own eviction pass.
    pub fn clear_cache(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.lock().unwrap().retain(|_, e| now.duration_since(e.created_at) < max_age);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn noop_handler() -> CallbackHandler {
        Arc::new(|_inv| Box::pin(async {}))
    }

    fn invocation(token: &str) -> CallbackInvocation {
        CallbackInvocation { query_id: "q1".into(), token: token.into(), message_id: 1, chat_id: 1 }
    }

    #[tokio::test]
    async fn invoke_after_unsubscribe_returns_false() {
        let registry = CallbackRegistry::new("s1");
        let token = registry.subscribe(noop_handler());
        registry.unsubscribe(&token);
        assert!(!registry.invoke(invocation(&token)).await);
    }

    #[tokio::test]
    async fn invoke_unknown_token_returns_false() {
        let registry = CallbackRegistry::new("s1");
        assert!(!registry.invoke(invocation("s1_999")).await);
    }

    #[tokio::test]
    async fn invoke_known_token_runs_handler_and_returns_true() {
        let registry = CallbackRegistry::new("s1");
        let called = Arc::new(AtomicUsize::new(0));
        let called2 = called.clone();
        let token = registry.subscribe(Arc::new(move |_inv| {
            let called = called2.clone();
            Box::pin(async move {
                called.fetch_add(1, Ordering::SeqCst);
            })
        }));
        assert!(registry.invoke(invocation(&token)).await);
        assert_eq!(called.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn token_format_embeds_session_short_id_and_counter() {
        let registry = CallbackRegistry::new("abc123");
        let t0 = registry.subscribe(noop_handler());
        let t1 = registry.subscribe(noop_handler());
        assert_eq!(t0, "abc123_0");
        assert_eq!(t1, "abc123_1");
    }

    #[test]
    fn concurrent_issuance_never_collides() {
        let registry = Arc::new(CallbackRegistry::new("s1"));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                let mut tokens = Vec::new();
                for _ in 0..200 {
                    tokens.push(registry.subscribe(noop_handler()));
                }
                tokens
            }));
        }
        let mut all = Vec::new();
        for h in handles {
            all.extend(h.join().unwrap());
        }
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn clear_cache_evicts_entries_older_than_max_age() {
        let registry = CallbackRegistry::new("s1");
        let token = registry.subscribe(noop_handler());
        assert_eq!(registry.len(), 1);
        registry.clear_cache(Duration::from_secs(0));
        assert!(!registry.contains(&token));
    }

    #[test]
    fn clear_cache_keeps_fresh_entries() {
        let registry = CallbackRegistry::new("s1");
        let token = registry.subscribe(noop_handler());
        registry.clear_cache(Duration::from_secs(3600));
        assert!(registry.contains(&token));
    }
}
