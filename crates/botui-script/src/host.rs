//! Host traits the `ScriptContext` binds against. `botui-runtime` implements
//! these against the live `ScriptPage`/bot-user so this crate never depends
//! upward on the runtime crate.

use async_trait::async_trait;

use crate::error::ScriptError;

/// Backs the script-visible `UI` namespace (spec §4.2).
#[async_trait]
pub trait UiHost: Send + Sync {
    async fn refresh(&self) -> Result<(), ScriptError>;
    async fn navigate(
        &self,
        page_id: &str,
        sub_page: Option<String>,
        props: Option<serde_json::Value>,
    ) -> Result<(), ScriptError>;
    async fn navigate_fresh(
        &self,
        page_id: &str,
        sub_page: Option<String>,
        props: Option<serde_json::Value>,
    ) -> Result<(), ScriptError>;
    async fn send_page(&self, page_id: &str) -> Result<(), ScriptError>;
    async fn back(&self) -> Result<(), ScriptError>;
    async fn close(&self) -> Result<(), ScriptError>;
    async fn dispose(&self) -> Result<(), ScriptError>;
    async fn clear_keyboard(&self) -> Result<(), ScriptError>;
    async fn toast(&self, text: &str) -> Result<(), ScriptError>;
    async fn alert(&self, text: &str) -> Result<(), ScriptError>;
    async fn status(&self, kind: &str) -> Result<(), ScriptError>;
    async fn next_page(&self) -> Result<(), ScriptError>;
    async fn prev_page(&self) -> Result<(), ScriptError>;
    async fn go_to_page(&self, index: i64) -> Result<(), ScriptError>;
    fn get_page_count(&self) -> i64;
    fn get_current_page(&self) -> i64;

    /// `UI.navigate*` sets this so the callback dispatcher skips the
    /// default "re-render the same message" step (spec §4.2).
    fn set_navigated(&self, navigated: bool);
    fn navigated(&self) -> bool;

    /// Records the callback query that triggered the current click handler,
    /// if any, so `toast`/`alert` know which query to answer. No-op default
    /// for hosts (e.g. scheduled/background script runs) with no triggering
    /// query.
    fn set_callback_query_id(&self, _id: Option<String>) {}
}

/// Backs the script-visible `User` namespace: the bot-user façade.
#[async_trait]
pub trait UserHost: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), ScriptError>;
    async fn edit(&self, text: &str) -> Result<(), ScriptError>;
    async fn delete(&self) -> Result<(), ScriptError>;
    fn chat_id(&self) -> i64;
    fn lang(&self) -> String;
    fn translate(&self, key: &str) -> String;
    /// Last-resort error sink (spec §7): used when neither a lifecycle
    /// hook nor a vmodel error handler absorbs a script error.
    fn handle_error(&self, error: &ScriptError);
}
