//! The three reference pages exercised by the integration suite and the
//! demo binary (spec §8, SPEC_FULL §10): a counter, a single-select
//! "favourite colour" modal, and a paginated list of seven cards.
//!
//! These are built directly as [`PageDefinition`] values rather than parsed
//! from XML, since the (out-of-scope) template parser is an external
//! collaborator (spec §1) — the shape below is exactly what that parser
//! would be expected to emit.

use botui_core::model::{
    AttributeSets, ComponentDefinition, ElementNode, MessageBody, MessageSpec, NavigateSpec, PageDefinition,
};
use botui_runtime::PageManager;

fn command(id: &str, title: &str, on_click: &str) -> ComponentDefinition {
    let mut attrs = AttributeSets::default();
    attrs.statics.insert("title".to_string(), title.to_string());
    attrs.events.insert("click".to_string(), on_click.to_string());
    ComponentDefinition { id: Some(id.to_string()), attrs, ..ComponentDefinition::new("command") }
}

/// Scenario 1 (spec §8): a single counter button, incrementing a page-local
/// script variable and editing the same message in place on every click.
fn counter_page() -> PageDefinition {
    let mut page = PageDefinition::new("counter");
    page.message = Some(MessageSpec {
        body: MessageBody::Inline("Count: {{ count }}".to_string()),
        md: false,
        pre: false,
        wallpaper_url: None,
    });
    page.script = Some("let count = 0;".to_string());
    page.components = vec![command("increment", "+1", "count += 1;")];
    page
}

/// Scenario 2 (spec §8): a `radio-modal` offering three colours, each with
/// its own message body — exercises the collapsed-summary / expanded-options
/// / per-option-message takeover cycle.
fn colors_page() -> PageDefinition {
    let mut page = PageDefinition::new("colors");
    page.message = Some(MessageSpec {
        body: MessageBody::Inline("Pick a favourite colour.".to_string()),
        md: false,
        pre: false,
        wallpaper_url: None,
    });

    let options: Vec<ElementNode> = [("red", "Red", "You picked Red."), ("green", "Green", "You picked Green."), ("blue", "Blue", "You picked Blue.")]
        .into_iter()
        .map(|(id, title, message)| {
            let mut attributes = std::collections::HashMap::new();
            attributes.insert("id".to_string(), id.to_string());
            attributes.insert("title".to_string(), title.to_string());
            attributes.insert("message".to_string(), message.to_string());
            ElementNode { tag: "option".to_string(), attributes, children: Vec::new(), text: String::new() }
        })
        .collect();

    let mut attrs = AttributeSets::default();
    attrs.statics.insert("title".to_string(), "Colour".to_string());
    let modal = ComponentDefinition {
        id: Some("colorPicker".to_string()),
        element: ElementNode { tag: "radio-modal".to_string(), children: options, ..Default::default() },
        attrs,
        ..ComponentDefinition::new("radio-modal")
    };
    page.components = vec![modal];
    page
}

/// Scenario 3 (spec §8): seven cards auto-paginated three-per-page with a
/// carousel `NavigatePanel`, wrapping from the last page back to the first.
fn cards_page() -> PageDefinition {
    let mut page = PageDefinition::new("cards");
    page.message = Some(MessageSpec {
        body: MessageBody::Inline("Browse {{ cardCount }} cards.".to_string()),
        md: false,
        pre: false,
        wallpaper_url: None,
    });
    page.script = Some("let cardCount = 7;".to_string());
    page.max_items = Some(3);
    page.navigate = Some(NavigateSpec { carousel: true, hide_boundary: false, boundary_message: None });
    page.components = (1..=7)
        .map(|i| command(&format!("card{i}"), &format!("Card {i}"), &format!("console.log(\"opened card {i}\");")))
        .collect();
    page
}

/// Registers every reference page into `manager`, all rooted at `/` since
/// none of them read resources (spec §6 resource-loader grammar).
pub fn register_all(manager: &mut PageManager) {
    manager.register_page(counter_page(), "/");
    manager.register_page(colors_page(), "/");
    manager.register_page(cards_page(), "/");
}
