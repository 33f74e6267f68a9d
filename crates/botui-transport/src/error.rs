use std::fmt;

/// Errors raised by a `BotClient` implementation (spec §7 "transport error:
/// logged; dispatcher retries nothing; bubbles to the user's `handleError`").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The underlying HTTP call failed before a response was read.
    Http(String),
    /// The platform answered `ok: false` or a malformed body.
    InvalidResponse(String),
    /// The platform asked the caller to back off.
    RateLimited { retry_after_secs: u64 },
    /// The bot token/credentials were rejected.
    Unauthorized,
    /// The requested resource (chat, message, file) does not exist anymore.
    NotFound(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Http(msg) => write!(f, "transport request failed: {msg}"),
            TransportError::InvalidResponse(msg) => write!(f, "transport returned an invalid response: {msg}"),
            TransportError::RateLimited { retry_after_secs } => {
                write!(f, "transport rate-limited, retry after {retry_after_secs}s")
            }
            TransportError::Unauthorized => write!(f, "transport rejected credentials"),
            TransportError::NotFound(what) => write!(f, "transport could not find '{what}'"),
        }
    }
}

impl std::error::Error for TransportError {}
