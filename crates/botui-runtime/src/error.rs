use std::fmt;

use botui_core::error::PageError;
use botui_script::ScriptError;
use botui_transport::error::TransportError;

/// Errors raised while loading, navigating or dispatching against pages
/// (spec §7). Distinct from `PageError` (compile-time page-definition
/// problems) and `ScriptError` (in-script failures); `DispatchError` is the
/// runtime-level failure family, and wraps both via `From`.
#[derive(Debug)]
pub enum DispatchError {
    /// No `PageDefinition` registered under this id.
    UnknownPage(String),
    /// No vmodel factory registered under this type name.
    UnknownVModel(String),
    Page(PageError),
    Script(ScriptError),
    Transport(TransportError),
    /// A navigation target's view-model props failed to deserialise.
    InvalidProps(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownPage(id) => write!(f, "no page registered under id '{id}'"),
            DispatchError::UnknownVModel(name) => write!(f, "no vmodel factory registered under type '{name}'"),
            DispatchError::Page(e) => write!(f, "{e}"),
            DispatchError::Script(e) => write!(f, "{e}"),
            DispatchError::Transport(e) => write!(f, "{e}"),
            DispatchError::InvalidProps(msg) => write!(f, "invalid navigation props: {msg}"),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<PageError> for DispatchError {
    fn from(e: PageError) -> Self {
        DispatchError::Page(e)
    }
}

impl From<ScriptError> for DispatchError {
    fn from(e: ScriptError) -> Self {
        DispatchError::Script(e)
    }
}

impl From<TransportError> for DispatchError {
    fn from(e: TransportError) -> Self {
        DispatchError::Transport(e)
    }
}

/// `DispatchError` surfaces to script as a plain host error (spec §4.2
/// `UI.*Async` methods return `Result<(), ScriptError>`).
impl From<DispatchError> for ScriptError {
    fn from(e: DispatchError) -> Self {
        ScriptError::Host(e.to_string())
    }
}
