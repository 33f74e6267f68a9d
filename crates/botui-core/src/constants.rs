// =============================================================================
// SESSION CACHE
// =============================================================================

/// Default idle time before a cached per-chat session is evicted (§3).
pub const DEFAULT_CLEAR_CACHE_TIME_SECS: u64 = 24 * 60 * 60;

/// Eviction sweep runs opportunistically every N requests (§5).
pub const CACHE_SWEEP_INTERVAL_REQUESTS: u64 = 100;

// =============================================================================
// ACTIVE PAGES (bot-user session, §4.8)
// =============================================================================

/// Bounded MRU list of live pages per bot-user session.
pub const DEFAULT_ACTIVE_PAGES_CAPACITY: usize = 10;

// =============================================================================
// SAFE-STOP
// =============================================================================

/// Default text shown to a user whose click lands during a safe-stop drain.
pub const DEFAULT_STOPPING_TEXT: &str = "The bot is restarting, please try again shortly.";

// =============================================================================
// CALLBACK TOKENS
// =============================================================================

/// Separator between a session's short id and the monotonic counter in a
/// callback token, e.g. `"a1b2c3_42"`.
pub const TOKEN_SEPARATOR: char = '_';

// =============================================================================
// LOCALISATION
// =============================================================================

/// Fallback rendering for a `$t(key)` lookup that has no translation.
pub fn missing_translation_marker(key: &str) -> String {
    format!("[[{key}]]")
}
