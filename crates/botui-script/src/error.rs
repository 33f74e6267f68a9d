use std::fmt;

/// Errors raised while evaluating an embedded script or template (spec §7).
#[derive(Debug)]
pub enum ScriptError {
    /// The rhai engine rejected the expression/code (syntax or runtime).
    Eval(String),
    /// A `UI.*` / `User.*` host call failed (e.g. transport error surfaced
    /// through the bridge).
    Host(String),
    /// A lifecycle hook or event handler panicked or returned an error that
    /// neither the vmodel nor the bot-user's `handleError` could absorb.
    Unhandled(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Eval(msg) => write!(f, "script evaluation error: {msg}"),
            ScriptError::Host(msg) => write!(f, "host call error: {msg}"),
            ScriptError::Unhandled(msg) => write!(f, "unhandled script error: {msg}"),
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<Box<rhai::EvalAltResult>> for ScriptError {
    fn from(e: Box<rhai::EvalAltResult>) -> Self {
        ScriptError::Eval(e.to_string())
    }
}

impl From<rhai::ParseError> for ScriptError {
    fn from(e: rhai::ParseError) -> Self {
        ScriptError::Eval(e.to_string())
    }
}
