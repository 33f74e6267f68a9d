//! Reference `BotClient` against the Telegram Bot API HTTP surface. This is
//! the one concrete wire protocol this crate ships; anything else (a
//! different chat platform) implements `BotClient` the same way.

use async_trait::async_trait;
use botui_core::model::MediaKind;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{BotClient, ButtonAction, MediaInput, ParseMode, ReplyMarkup, SentMessage};
use crate::error::TransportError;
use crate::update::{IncomingCallbackQuery, IncomingMessage, IncomingPreCheckoutQuery, Update};

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ApiParameters>,
}

#[derive(Deserialize)]
struct ApiParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

fn parse_mode_str(mode: ParseMode) -> Option<&'static str> {
    match mode {
        ParseMode::None => None,
        ParseMode::Markdown => Some("MarkdownV2"),
        ParseMode::Html => Some("HTML"),
    }
}

fn reply_markup_json(markup: &ReplyMarkup) -> Value {
    let rows: Vec<Vec<Value>> = markup
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match &button.action {
                    ButtonAction::Callback(token) => json!({"text": button.text, "callback_data": token}),
                    ButtonAction::Url(url) => json!({"text": button.text, "url": url}),
                    ButtonAction::WebApp(url) => json!({"text": button.text, "web_app": {"url": url}}),
                })
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

fn media_field(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Photo => "photo",
        MediaKind::Document => "document",
        MediaKind::Audio => "audio",
        MediaKind::Video => "video",
    }
}

fn media_method(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Photo => "sendPhoto",
        MediaKind::Document => "sendDocument",
        MediaKind::Audio => "sendAudio",
        MediaKind::Video => "sendVideo",
    }
}

fn media_input_value(input: &MediaInput) -> Value {
    match input {
        MediaInput::Path(path) => Value::String(path.clone()),
        MediaInput::Url(url) => Value::String(url.clone()),
        MediaInput::FileId(id) => Value::String(id.clone()),
    }
}

impl TelegramClient {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), bot_token)
    }

    pub fn with_client(http: reqwest::Client, bot_token: impl Into<String>) -> Self {
        Self { http, base_url: format!("https://api.telegram.org/bot{}", bot_token.into()) }
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, TransportError> {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let parsed: ApiResponse =
            response.json().await.map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        if !parsed.ok {
            if let Some(retry_after) = parsed.parameters.and_then(|p| p.retry_after) {
                return Err(TransportError::RateLimited { retry_after_secs: retry_after });
            }
            let description = parsed.description.unwrap_or_default();
            if description.contains("Unauthorized") {
                return Err(TransportError::Unauthorized);
            }
            if description.contains("not found") {
                return Err(TransportError::NotFound(description));
            }
            return Err(TransportError::InvalidResponse(description));
        }
        Ok(parsed.result)
    }

    fn parse_sent_message(result: &Value) -> Result<SentMessage, TransportError> {
        let chat_id = result["chat"]["id"].as_i64().ok_or_else(|| TransportError::InvalidResponse("missing chat.id".into()))?;
        let message_id = result["message_id"]
            .as_i64()
            .ok_or_else(|| TransportError::InvalidResponse("missing message_id".into()))?;
        Ok(SentMessage { chat_id, message_id })
    }
}

#[async_trait]
impl BotClient for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
        link_preview_disabled: bool,
    ) -> Result<SentMessage, TransportError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": link_preview_disabled,
        });
        if let Some(mode) = parse_mode_str(parse_mode) {
            body["parse_mode"] = json!(mode);
        }
        if let Some(markup) = &reply_markup {
            body["reply_markup"] = reply_markup_json(markup);
        }
        let result = self.call("sendMessage", body).await?;
        Self::parse_sent_message(&result)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
        link_preview_disabled: bool,
    ) -> Result<(), TransportError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "disable_web_page_preview": link_preview_disabled,
        });
        if let Some(mode) = parse_mode_str(parse_mode) {
            body["parse_mode"] = json!(mode);
        }
        if let Some(markup) = &reply_markup {
            body["reply_markup"] = reply_markup_json(markup);
        }
        self.call("editMessageText", body).await.map(|_| ())
    }

    async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "chat_id": chat_id, "message_id": message_id, "caption": caption });
        if let Some(mode) = parse_mode_str(parse_mode) {
            body["parse_mode"] = json!(mode);
        }
        if let Some(markup) = &reply_markup {
            body["reply_markup"] = reply_markup_json(markup);
        }
        self.call("editMessageCaption", body).await.map(|_| ())
    }

    async fn edit_message_media(
        &self,
        chat_id: i64,
        message_id: i64,
        kind: MediaKind,
        input: MediaInput,
        caption: Option<&str>,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError> {
        let mut media = json!({ "type": media_field(kind), "media": media_input_value(&input) });
        if let Some(caption) = caption {
            media["caption"] = json!(caption);
        }
        let mut body = json!({ "chat_id": chat_id, "message_id": message_id, "media": media });
        if let Some(markup) = &reply_markup {
            body["reply_markup"] = reply_markup_json(markup);
        }
        self.call("editMessageMedia", body).await.map(|_| ())
    }

    async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "chat_id": chat_id, "message_id": message_id });
        body["reply_markup"] = reply_markup.as_ref().map(reply_markup_json).unwrap_or(json!({"inline_keyboard": []}));
        self.call("editMessageReplyMarkup", body).await.map(|_| ())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        self.call("deleteMessage", json!({ "chat_id": chat_id, "message_id": message_id })).await.map(|_| ())
    }

    async fn send_media(
        &self,
        chat_id: i64,
        kind: MediaKind,
        input: MediaInput,
        caption: Option<&str>,
        parse_mode: ParseMode,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage, TransportError> {
        let mut body = json!({ "chat_id": chat_id, media_field(kind): media_input_value(&input) });
        if let Some(caption) = caption {
            body["caption"] = json!(caption);
        }
        if let Some(mode) = parse_mode_str(parse_mode) {
            body["parse_mode"] = json!(mode);
        }
        if let Some(markup) = &reply_markup {
            body["reply_markup"] = reply_markup_json(markup);
        }
        let result = self.call(media_method(kind), body).await?;
        Self::parse_sent_message(&result)
    }

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), TransportError> {
        self.call("sendChatAction", json!({ "chat_id": chat_id, "action": action })).await.map(|_| ())
    }

    async fn answer_callback_query(
        &self,
        query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "callback_query_id": query_id, "show_alert": show_alert });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call("answerCallbackQuery", body).await.map(|_| ())
    }

    async fn answer_pre_checkout_query(
        &self,
        query_id: &str,
        error_message: Option<&str>,
    ) -> Result<(), TransportError> {
        let ok = error_message.is_none();
        let mut body = json!({ "pre_checkout_query_id": query_id, "ok": ok });
        if let Some(msg) = error_message {
            body["error_message"] = json!(msg);
        }
        self.call("answerPreCheckoutQuery", body).await.map(|_| ())
    }

    async fn set_webhook(&self, url: &str, allowed_updates: &[&str], secret_token: &str) -> Result<(), TransportError> {
        let body = json!({ "url": url, "allowed_updates": allowed_updates, "secret_token": secret_token });
        self.call("setWebhook", body).await.map(|_| ())
    }

    async fn delete_webhook(&self) -> Result<(), TransportError> {
        self.call("deleteWebhook", json!({})).await.map(|_| ())
    }

    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u32) -> Result<Vec<Update>, TransportError> {
        let mut body = json!({ "timeout": timeout_secs });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        let result = self.call("getUpdates", body).await?;
        let raw = result.as_array().cloned().unwrap_or_default();
        Ok(raw.iter().filter_map(parse_update).collect())
    }
}

fn parse_update(raw: &Value) -> Option<Update> {
    if let Some(cq) = raw.get("callback_query") {
        return Some(Update::CallbackQuery(IncomingCallbackQuery {
            query_id: cq["id"].as_str()?.to_string(),
            chat_id: cq["message"]["chat"]["id"].as_i64()?,
            message_id: cq["message"]["message_id"].as_i64()?,
            data: cq["data"].as_str().unwrap_or_default().to_string(),
        }));
    }
    if let Some(pcq) = raw.get("pre_checkout_query") {
        return Some(Update::PreCheckoutQuery(IncomingPreCheckoutQuery {
            query_id: pcq["id"].as_str()?.to_string(),
            chat_id: pcq["from"]["id"].as_i64()?,
            payload: pcq["invoice_payload"].as_str().unwrap_or_default().to_string(),
        }));
    }
    if let Some(message) = raw.get("message") {
        return Some(Update::Message(IncomingMessage {
            chat_id: message["chat"]["id"].as_i64()?,
            message_id: message["message_id"].as_i64()?,
            date: message["date"].as_i64().unwrap_or_default(),
            text: message["text"].as_str().map(str::to_string),
            photo_file_id: message["photo"].as_array().and_then(|p| p.last()).and_then(|p| p["file_id"].as_str()).map(str::to_string),
            document_file_id: message["document"]["file_id"].as_str().map(str::to_string),
        }));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mode_maps_to_telegram_names() {
        assert_eq!(parse_mode_str(ParseMode::Markdown), Some("MarkdownV2"));
        assert_eq!(parse_mode_str(ParseMode::Html), Some("HTML"));
        assert_eq!(parse_mode_str(ParseMode::None), None);
    }

    #[test]
    fn reply_markup_json_emits_callback_and_url_buttons() {
        let markup = ReplyMarkup {
            rows: vec![vec![
                crate::client::KeyboardButton { text: "A".into(), action: ButtonAction::Callback("t1".into()) },
                crate::client::KeyboardButton { text: "B".into(), action: ButtonAction::Url("https://x".into()) },
            ]],
        };
        let json = reply_markup_json(&markup);
        assert_eq!(json["inline_keyboard"][0][0]["callback_data"], "t1");
        assert_eq!(json["inline_keyboard"][0][1]["url"], "https://x");
    }

    #[test]
    fn parse_update_recognises_callback_query() {
        let raw = json!({
            "callback_query": {
                "id": "q1",
                "data": "abc_1",
                "message": { "message_id": 5, "chat": { "id": 42 } }
            }
        });
        let update = parse_update(&raw).unwrap();
        assert!(matches!(update, Update::CallbackQuery(c) if c.query_id == "q1" && c.data == "abc_1" && c.chat_id == 42));
    }
}
