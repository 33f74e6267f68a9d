//! The `BotClient` trait (spec §6): the operations the page runtime needs
//! from the chat platform, abstracted away from any one wire protocol.

use async_trait::async_trait;
use botui_core::model::MediaKind;

use crate::error::TransportError;

/// How a message body should be parsed by the platform's renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    None,
    Markdown,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
    WebApp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardButton {
    pub text: String,
    pub action: ButtonAction,
}

/// An inline keyboard: rows of buttons, already assembled by
/// `botui-runtime`'s keyboard-assembly pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyMarkup {
    pub rows: Vec<Vec<KeyboardButton>>,
}

impl ReplyMarkup {
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }
}

/// Where to read photo/document/audio/video bytes from when sending media.
/// `FileId` lets a previously-uploaded file be resent without re-uploading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInput {
    Path(String),
    Url(String),
    FileId(String),
}

/// A sent or edited message, as handed back by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Abstracts the chat platform (spec §6). `botui-runtime`'s `MessagePage`
/// base is the only consumer; nothing upstream of it depends on a concrete
/// wire protocol.
#[async_trait]
pub trait BotClient: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
        link_preview_disabled: bool,
    ) -> Result<SentMessage, TransportError>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
        link_preview_disabled: bool,
    ) -> Result<(), TransportError>;

    async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError>;

    async fn edit_message_media(
        &self,
        chat_id: i64,
        message_id: i64,
        kind: MediaKind,
        input: MediaInput,
        caption: Option<&str>,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError>;

    async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError>;

    /// Covers `sendPhoto`/`sendDocument`/`sendAudio`/`sendVideo` (spec §6)
    /// with one method parameterised by `kind` — the platform-side request
    /// shape only differs in which field carries the media.
    async fn send_media(
        &self,
        chat_id: i64,
        kind: MediaKind,
        input: MediaInput,
        caption: Option<&str>,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage, TransportError>;

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), TransportError>;

    async fn answer_callback_query(
        &self,
        query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError>;

    async fn answer_pre_checkout_query(
        &self,
        query_id: &str,
        error_message: Option<&str>,
    ) -> Result<(), TransportError>;

    async fn set_webhook(
        &self,
        url: &str,
        allowed_updates: &[&str],
        secret_token: &str,
    ) -> Result<(), TransportError>;

    async fn delete_webhook(&self) -> Result<(), TransportError>;

    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u32) -> Result<Vec<crate::update::Update>, TransportError>;
}
