//! Inbound `Update` objects (spec §6: "the dispatcher consumes `Update`
//! objects with union type `Message | CallbackQuery | PreCheckoutQuery`").

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i64,
    /// Unix timestamp, used by the skip-on-start gate (spec §5).
    pub date: i64,
    pub text: Option<String>,
    pub photo_file_id: Option<String>,
    pub document_file_id: Option<String>,
}

impl IncomingMessage {
    pub fn is_command(&self) -> bool {
        self.text.as_deref().is_some_and(|t| t.starts_with('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCallbackQuery {
    pub query_id: String,
    pub chat_id: i64,
    pub message_id: i64,
    /// The opaque token a keyboard button carried (spec §4.6).
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingPreCheckoutQuery {
    pub query_id: String,
    pub chat_id: i64,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Message(IncomingMessage),
    CallbackQuery(IncomingCallbackQuery),
    PreCheckoutQuery(IncomingPreCheckoutQuery),
}

impl Update {
    pub fn chat_id(&self) -> i64 {
        match self {
            Update::Message(m) => m.chat_id,
            Update::CallbackQuery(c) => c.chat_id,
            Update::PreCheckoutQuery(p) => p.chat_id,
        }
    }
}
