//! End-to-end coverage for the three reference pages (spec §8,
//! SPEC_FULL §10) against an in-memory `BotClient`: one message each, driven
//! purely through `Dispatcher::open_root_page` and `Dispatcher::dispatch`,
//! asserting on what actually landed in the fake transport.

use std::sync::Arc;

use botui::build_dispatcher_at;
use botui_transport::fake::{FakeBotClient, FakeMessageState};
use botui_transport::{ButtonAction, IncomingCallbackQuery, Update};

const CHAT_ID: i64 = 1;
const MESSAGE_ID: i64 = 1;

fn find_token(state: &FakeMessageState, needle: &str) -> String {
    state
        .reply_markup
        .rows
        .iter()
        .flatten()
        .find(|button| button.text.contains(needle))
        .and_then(|button| match &button.action {
            ButtonAction::Callback(token) => Some(token.clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no callback button containing {needle:?} in {:?}", state.reply_markup))
}

async fn click(dispatcher: &botui_runtime::Dispatcher, token: String) {
    dispatcher
        .dispatch(Update::CallbackQuery(IncomingCallbackQuery {
            query_id: "test".to_string(),
            chat_id: CHAT_ID,
            message_id: MESSAGE_ID,
            data: token,
        }))
        .await;
}

#[tokio::test]
async fn counter_page_increments_in_place() {
    let transport = Arc::new(FakeBotClient::new());
    let dispatcher = build_dispatcher_at(transport.clone(), 0);
    dispatcher.open_root_page(CHAT_ID, "counter").await.expect("open counter page");

    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message sent");
    assert_eq!(state.text, "Count: 0");

    let token = find_token(&state, "+1");
    click(&dispatcher, token.clone()).await;
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message still tracked");
    assert_eq!(state.text, "Count: 1");

    click(&dispatcher, token).await;
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message still tracked");
    assert_eq!(state.text, "Count: 2");
}

#[tokio::test]
async fn colors_page_cycles_summary_expand_select_collapse() {
    let transport = Arc::new(FakeBotClient::new());
    let dispatcher = build_dispatcher_at(transport.clone(), 0);
    dispatcher.open_root_page(CHAT_ID, "colors").await.expect("open colors page");

    // Collapsed: the option's own message overrides the page's prompt.
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message sent");
    assert_eq!(state.text, "You picked Red.");

    // Expand via the summary button.
    let summary_token = find_token(&state, "Colour: Red");
    click(&dispatcher, summary_token).await;
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message still tracked");
    assert_eq!(state.text, "Pick a favourite colour.");

    // Pick Green while expanded; still expanded, still the page's own prompt.
    let green_token = find_token(&state, "Green");
    click(&dispatcher, green_token).await;
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message still tracked");
    assert_eq!(state.text, "Pick a favourite colour.");

    // Collapse via the back button; the newly selected option takes over.
    let back_token = find_token(&state, "Back");
    click(&dispatcher, back_token).await;
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message still tracked");
    assert_eq!(state.text, "You picked Green.");
}

fn card_titles(state: &FakeMessageState) -> Vec<String> {
    state
        .reply_markup
        .rows
        .iter()
        .flatten()
        .map(|button| button.text.clone())
        .filter(|text| text.starts_with("Card"))
        .collect()
}

#[tokio::test]
async fn cards_page_paginates_and_wraps_as_a_carousel() {
    let transport = Arc::new(FakeBotClient::new());
    let dispatcher = build_dispatcher_at(transport.clone(), 0);
    dispatcher.open_root_page(CHAT_ID, "cards").await.expect("open cards page");

    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message sent");
    assert_eq!(card_titles(&state), vec!["Card 1", "Card 2", "Card 3"]);

    let forward = find_token(&state, "\u{27a1}\u{fe0f}");
    click(&dispatcher, forward).await;
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message still tracked");
    assert_eq!(card_titles(&state), vec!["Card 4", "Card 5", "Card 6"]);

    let forward = find_token(&state, "\u{27a1}\u{fe0f}");
    click(&dispatcher, forward).await;
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message still tracked");
    assert_eq!(card_titles(&state), vec!["Card 7"]);

    // Carousel: one more forward-click wraps back to the first page.
    let forward = find_token(&state, "\u{27a1}\u{fe0f}");
    click(&dispatcher, forward).await;
    let state = transport.message_state(CHAT_ID, MESSAGE_ID).expect("message still tracked");
    assert_eq!(card_titles(&state), vec!["Card 1", "Card 2", "Card 3"]);
}
