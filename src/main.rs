//! Reference demo (SPEC_FULL §10): opens the counter page for one chat
//! against an in-memory `BotClient`, clicks its button a few times, then
//! prints what the fake transport recorded. A real deployment swaps
//! `FakeBotClient` for `botui_transport::TelegramClient` and drives
//! `Dispatcher::dispatch` from a polling loop or webhook handler instead.

use std::sync::Arc;

use botui_callback::CallbackInvocation;
use botui_transport::fake::FakeBotClient;

const CHAT_ID: i64 = 1;

#[tokio::main]
async fn main() {
    let transport = Arc::new(FakeBotClient::new());
    let dispatcher = botui::build_dispatcher(transport.clone());

    dispatcher.open_root_page(CHAT_ID, "counter").await.expect("open counter page");

    // `open_root_page` always sends a brand-new message for the very first
    // page of a fresh chat, so this is the counter page's one and only message.
    let message_id = 1;

    let session = dispatcher.sessions().get_or_create(CHAT_ID, || unreachable!("session was just created above")).await;
    for _ in 0..3 {
        let token = find_increment_token(&transport, CHAT_ID, message_id);
        let invocation = CallbackInvocation { query_id: "demo".to_string(), token, message_id, chat_id: CHAT_ID };
        session.callback_registry().invoke(invocation).await;
    }

    let state = transport.message_state(CHAT_ID, message_id).expect("message still tracked");
    println!("final message text: {}", state.text);
}

fn find_increment_token(transport: &FakeBotClient, chat_id: i64, message_id: i64) -> String {
    let state = transport.message_state(chat_id, message_id).expect("message exists");
    state
        .reply_markup
        .rows
        .iter()
        .flatten()
        .find_map(|button| match &button.action {
            botui_transport::client::ButtonAction::Callback(token) => Some(token.clone()),
            _ => None,
        })
        .expect("counter page always has exactly one callback button")
}
