//! In-memory `BotClient` (spec §6, §8 scenarios): records every call and
//! tracks the text/keyboard state of each "sent" message so tests can
//! assert on what a user would actually see, without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use botui_core::model::MediaKind;

use crate::client::{BotClient, MediaInput, ParseMode, ReplyMarkup, SentMessage};
use crate::error::TransportError;
use crate::update::Update;

#[derive(Debug, Clone, Default)]
pub struct FakeMessageState {
    pub text: String,
    pub reply_markup: ReplyMarkup,
    pub deleted: bool,
}

#[derive(Debug, Clone)]
pub enum FakeCall {
    Send { chat_id: i64, text: String },
    EditText { chat_id: i64, message_id: i64, text: String },
    EditMarkup { chat_id: i64, message_id: i64 },
    Delete { chat_id: i64, message_id: i64 },
    AnswerCallback { query_id: String, text: Option<String>, show_alert: bool },
}

/// A fake `BotClient` for tests and the reference demo. Not grounded on any
/// real platform wire format — it only needs to satisfy the trait so the
/// rest of the runtime can be exercised deterministically.
#[derive(Default)]
pub struct FakeBotClient {
    next_message_id: AtomicI64,
    messages: Mutex<HashMap<(i64, i64), FakeMessageState>>,
    calls: Mutex<Vec<FakeCall>>,
    queued_updates: Mutex<Vec<Update>>,
}

impl FakeBotClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn message_state(&self, chat_id: i64, message_id: i64) -> Option<FakeMessageState> {
        self.messages.lock().unwrap().get(&(chat_id, message_id)).cloned()
    }

    /// Lets a test pre-load updates `get_updates` will hand back (polling
    /// deployment mode, spec §6).
    pub fn queue_update(&self, update: Update) {
        self.queued_updates.lock().unwrap().push(update);
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BotClient for FakeBotClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        _parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
        _link_preview_disabled: bool,
    ) -> Result<SentMessage, TransportError> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.messages.lock().unwrap().insert(
            (chat_id, message_id),
            FakeMessageState { text: text.to_string(), reply_markup: reply_markup.unwrap_or_default(), deleted: false },
        );
        self.record(FakeCall::Send { chat_id, text: text.to_string() });
        Ok(SentMessage { chat_id, message_id })
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        _parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
        _link_preview_disabled: bool,
    ) -> Result<(), TransportError> {
        let mut messages = self.messages.lock().unwrap();
        let entry = messages
            .get_mut(&(chat_id, message_id))
            .ok_or_else(|| TransportError::NotFound(format!("message {chat_id}/{message_id}")))?;
        entry.text = text.to_string();
        if let Some(markup) = reply_markup {
            entry.reply_markup = markup;
        }
        drop(messages);
        self.record(FakeCall::EditText { chat_id, message_id, text: text.to_string() });
        Ok(())
    }

    async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError> {
        self.edit_message_text(chat_id, message_id, caption, parse_mode, reply_markup, true).await
    }

    async fn edit_message_media(
        &self,
        chat_id: i64,
        message_id: i64,
        _kind: MediaKind,
        _input: MediaInput,
        caption: Option<&str>,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError> {
        self.edit_message_text(chat_id, message_id, caption.unwrap_or_default(), ParseMode::None, reply_markup, true)
            .await
    }

    async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError> {
        let mut messages = self.messages.lock().unwrap();
        let entry = messages
            .get_mut(&(chat_id, message_id))
            .ok_or_else(|| TransportError::NotFound(format!("message {chat_id}/{message_id}")))?;
        entry.reply_markup = reply_markup.unwrap_or_default();
        drop(messages);
        self.record(FakeCall::EditMarkup { chat_id, message_id });
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        let mut messages = self.messages.lock().unwrap();
        let entry = messages
            .get_mut(&(chat_id, message_id))
            .ok_or_else(|| TransportError::NotFound(format!("message {chat_id}/{message_id}")))?;
        entry.deleted = true;
        drop(messages);
        self.record(FakeCall::Delete { chat_id, message_id });
        Ok(())
    }

    async fn send_media(
        &self,
        chat_id: i64,
        _kind: MediaKind,
        _input: MediaInput,
        caption: Option<&str>,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage, TransportError> {
        self.send_message(chat_id, caption.unwrap_or_default(), parse_mode, reply_markup, true).await
    }

    async fn send_chat_action(&self, _chat_id: i64, _action: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError> {
        self.record(FakeCall::AnswerCallback {
            query_id: query_id.to_string(),
            text: text.map(str::to_string),
            show_alert,
        });
        Ok(())
    }

    async fn answer_pre_checkout_query(
        &self,
        _query_id: &str,
        _error_message: Option<&str>,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn set_webhook(&self, _url: &str, _allowed_updates: &[&str], _secret_token: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn get_updates(&self, _offset: Option<i64>, _timeout_secs: u32) -> Result<Vec<Update>, TransportError> {
        Ok(std::mem::take(&mut self.queued_updates.lock().unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_then_edit_updates_tracked_state() {
        let client = FakeBotClient::new();
        let sent = client.send_message(1, "Count: 0", ParseMode::None, None, false).await.unwrap();
        client
            .edit_message_text(sent.chat_id, sent.message_id, "Count: 1", ParseMode::None, None, false)
            .await
            .unwrap();
        let state = client.message_state(sent.chat_id, sent.message_id).unwrap();
        assert_eq!(state.text, "Count: 1");
    }

    #[tokio::test]
    async fn editing_an_unknown_message_is_not_found() {
        let client = FakeBotClient::new();
        let err = client.edit_message_text(1, 999, "x", ParseMode::None, None, false).await.unwrap_err();
        assert!(matches!(err, TransportError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_marks_message_deleted() {
        let client = FakeBotClient::new();
        let sent = client.send_message(1, "hi", ParseMode::None, None, false).await.unwrap();
        client.delete_message(sent.chat_id, sent.message_id).await.unwrap();
        assert!(client.message_state(sent.chat_id, sent.message_id).unwrap().deleted);
    }
}
