//! Chat-platform transport (spec §6): the `BotClient` trait, the inbound
//! `Update` union, the webhook request/response contract, a reference
//! Telegram implementation, and an in-memory fake for tests/the demo.

pub mod client;
pub mod error;
pub mod fake;
pub mod telegram;
pub mod update;
pub mod webhook;

pub use client::{BotClient, ButtonAction, KeyboardButton, MediaInput, ParseMode, ReplyMarkup, SentMessage};
pub use error::TransportError;
pub use fake::{FakeBotClient, FakeCall, FakeMessageState};
pub use telegram::TelegramClient;
pub use update::{IncomingCallbackQuery, IncomingMessage, IncomingPreCheckoutQuery, Update};
pub use webhook::{handle_webhook_request, WebhookResponse};
