//! `AutoCard` (spec §4.5): binds to an `items` array and expands one child
//! `MenuElement` tree per element via `<template #item>`, frozen with that
//! item's value and index. Paginates identically to `Card`.
//!
//! `AutoCard` cannot itself construct arbitrary `MenuElement` concrete
//! types (that's `ComponentFactory`'s job) so the per-item expansion is
//! injected as a builder closure at construction time. The most recent
//! expansion is cached so `dispose()` can unsubscribe every token it owns
//! without re-running script.

use std::sync::{Arc, Mutex};

use rhai::Dynamic;

use botui_core::error::PageError;
use botui_callback::CallbackRegistry;
use botui_script::ScriptError;
use botui_script::ComponentContext;

use crate::button::Button;
use crate::control::ScriptControllable;
use crate::element::{ElementBase, MenuElement, PaginatedTarget};

/// Builds the element tree for one `items[index]`, already frozen with
/// that item/index (spec §4.4 `freezeProps`). Supplied by `ComponentFactory`.
pub type AutoCardBuilder =
    Arc<dyn Fn(Dynamic, usize) -> Result<Vec<Arc<dyn MenuElement>>, PageError> + Send + Sync>;

pub struct AutoCard {
    base: Arc<ElementBase>,
    items_expr: String,
    builder: AutoCardBuilder,
    max_items: Option<usize>,
    max_rows: Option<usize>,
    current_page: Mutex<usize>,
    last_children: Mutex<Vec<Vec<Arc<dyn MenuElement>>>>,
}

impl AutoCard {
    pub fn new(
        base: Arc<ElementBase>,
        items_expr: String,
        builder: AutoCardBuilder,
        max_items: Option<usize>,
        max_rows: Option<usize>,
    ) -> Self {
        Self {
            base,
            items_expr,
            builder,
            max_items,
            max_rows,
            current_page: Mutex::new(0),
            last_children: Mutex::new(Vec::new()),
        }
    }

    fn expand(&self, ctx: &ComponentContext) -> Result<Vec<Vec<Arc<dyn MenuElement>>>, ScriptError> {
        let items: rhai::Array = ctx.script().evaluate(&self.items_expr).unwrap_or_default();
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (self.builder)(item, index).map_err(|e| ScriptError::Host(e.to_string())))
            .collect()
    }

    fn limit(&self) -> usize {
        self.max_items.unwrap_or(usize::MAX).min(self.max_rows.unwrap_or(usize::MAX))
    }

    fn page_count_of(&self, children: &[Vec<Arc<dyn MenuElement>>]) -> usize {
        if children.is_empty() {
            return 1;
        }
        let limit = self.limit();
        if limit == usize::MAX {
            1
        } else {
            children.len().div_ceil(limit.max(1))
        }
    }

    pub fn current_page(&self) -> usize {
        *self.current_page.lock().unwrap()
    }

    pub fn page_count(&self) -> usize {
        self.page_count_of(&self.last_children.lock().unwrap())
    }

    pub fn go_to_page(&self, index: i64) {
        let page_count = self.page_count();
        let clamped = index.clamp(0, page_count as i64 - 1) as usize;
        *self.current_page.lock().unwrap() = clamped;
    }

    pub fn next_page(&self) -> bool {
        let page_count = self.page_count();
        let mut idx = self.current_page.lock().unwrap();
        if *idx + 1 < page_count {
            *idx += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&self) -> bool {
        let mut idx = self.current_page.lock().unwrap();
        if *idx > 0 {
            *idx -= 1;
            true
        } else {
            false
        }
    }
}

impl MenuElement for AutoCard {
    fn id(&self) -> &str {
        &self.base.id
    }

    fn row_index(&self) -> usize {
        self.base.row_index()
    }

    fn hidden(&self, ctx: &ComponentContext) -> bool {
        self.base.hidden(ctx)
    }

    fn base(&self) -> &Arc<ElementBase> {
        &self.base
    }

    fn build(&self, ctx: &ComponentContext, registry: &CallbackRegistry) -> Vec<Button> {
        // Dispose the previous expansion's tokens before building the new one.
        {
            let previous = self.last_children.lock().unwrap();
            for group in previous.iter() {
                for el in group {
                    el.dispose(registry);
                }
            }
        }
        let children = match self.expand(ctx) {
            Ok(children) => children,
            Err(e) => {
                ctx.script().route_error(&e);
                Vec::new()
            }
        };

        let page_count = self.page_count_of(&children);
        {
            let mut idx = self.current_page.lock().unwrap();
            if *idx >= page_count {
                *idx = page_count - 1;
            }
        }
        let limit = self.limit();
        let current = self.current_page();
        let slice: Vec<&Vec<Arc<dyn MenuElement>>> = if limit == usize::MAX {
            children.iter().collect()
        } else {
            children.chunks(limit.max(1)).nth(current).map(|c| c.iter().collect()).unwrap_or_default()
        };

        let buttons = slice
            .into_iter()
            .flatten()
            .filter(|el| !el.hidden(ctx))
            .flat_map(|el| el.build(ctx, registry))
            .collect();
        *self.last_children.lock().unwrap() = children;
        buttons
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        for group in self.last_children.lock().unwrap().drain(..) {
            for el in group {
                el.dispose(registry);
            }
        }
    }
}

impl PaginatedTarget for AutoCard {
    fn next_page(&self) -> bool {
        AutoCard::next_page(self)
    }
    fn prev_page(&self) -> bool {
        AutoCard::prev_page(self)
    }
    fn go_to_page(&self, index: i64) {
        AutoCard::go_to_page(self, index)
    }
    fn current_page(&self) -> usize {
        AutoCard::current_page(self)
    }
    fn page_count(&self) -> usize {
        AutoCard::page_count(self)
    }
}

impl ScriptControllable for AutoCard {
    fn invoke_method(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic, ScriptError> {
        match method {
            "nextPage" => Ok(Dynamic::from(self.next_page())),
            "prevPage" => Ok(Dynamic::from(self.prev_page())),
            "goToPage" => {
                let index = args.first().and_then(|d| d.as_int().ok()).unwrap_or(0);
                self.go_to_page(index);
                Ok(Dynamic::UNIT)
            }
            "getCurrentPage" => Ok(Dynamic::from(self.current_page() as i64)),
            "getPageCount" => Ok(Dynamic::from(self.page_count() as i64)),
            other => Err(ScriptError::Host(format!("AutoCard has no method '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use botui_core::log::CapturingSink;
    use botui_core::model::ComponentDefinition;
    use botui_script::{ScriptContext as Ctx, UiHost, UserHost};

    struct NoopUi;
    #[async_trait]
    impl UiHost for NoopUi {
        async fn refresh(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn navigate(&self, _: &str, _: Option<String>, _: Option<serde_json::Value>) -> Result<(), ScriptError> { Ok(()) }
        async fn navigate_fresh(&self, _: &str, _: Option<String>, _: Option<serde_json::Value>) -> Result<(), ScriptError> { Ok(()) }
        async fn send_page(&self, _: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn back(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn close(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn dispose(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn clear_keyboard(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn toast(&self, _: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn alert(&self, _: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn status(&self, _: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn next_page(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn prev_page(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn go_to_page(&self, _: i64) -> Result<(), ScriptError> { Ok(()) }
        fn get_page_count(&self) -> i64 { 1 }
        fn get_current_page(&self) -> i64 { 0 }
        fn set_navigated(&self, _: bool) {}
        fn navigated(&self) -> bool { false }
    }
    struct NoopUser;
    #[async_trait]
    impl UserHost for NoopUser {
        async fn send(&self, _: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn edit(&self, _: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn delete(&self) -> Result<(), ScriptError> { Ok(()) }
        fn chat_id(&self) -> i64 { 1 }
        fn lang(&self) -> String { "en".into() }
        fn translate(&self, key: &str) -> String { format!("[[{key}]]") }
        fn handle_error(&self, _: &ScriptError) {}
    }

    /// A stand-in for `ComponentFactory`'s real expansion: one `Command`
    /// button per item, titled after the item's rendered value.
    struct FakeButtonElement {
        label: String,
        base: Arc<ElementBase>,
    }
    impl MenuElement for FakeButtonElement {
        fn id(&self) -> &str {
            &self.label
        }
        fn row_index(&self) -> usize {
            0
        }
        fn hidden(&self, _ctx: &ComponentContext) -> bool {
            false
        }
        fn base(&self) -> &Arc<ElementBase> {
            &self.base
        }
        fn build(&self, _ctx: &ComponentContext, _registry: &CallbackRegistry) -> Vec<Button> {
            vec![Button::callback(self.label.clone(), format!("tok_{}", self.label), 0, 1)]
        }
        fn dispose(&self, _registry: &CallbackRegistry) {}
    }

    fn auto_card(items_expr: &str, max_items: Option<usize>) -> (AutoCard, Arc<Ctx>) {
        let ui: Arc<NoopUi> = Arc::new(NoopUi);
        let script = Arc::new(Ctx::new(ui, Arc::new(NoopUser), Arc::new(CapturingSink::new())));
        let base = Arc::new(ElementBase::apply_definition(&[], &ComponentDefinition::new("auto-card")).unwrap());
        let builder: AutoCardBuilder = Arc::new(|item: Dynamic, index: usize| {
            let label = item.to_string();
            let base = Arc::new(ElementBase::apply_definition(&[], &ComponentDefinition::new("fake")).unwrap());
            Ok(vec![Arc::new(FakeButtonElement { label: format!("{label}-{index}"), base }) as Arc<dyn MenuElement>])
        });
        (AutoCard::new(base, items_expr.to_string(), builder, max_items, None), script)
    }

    #[test]
    fn expands_one_button_group_per_item() {
        let (card, script) = auto_card("[1, 2, 3]", None);
        let ctx = ComponentContext::new(&script);
        let registry = CallbackRegistry::new("s1");
        let buttons = card.build(&ctx, &registry);
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0].text, "1-0");
        assert_eq!(buttons[2].text, "3-2");
    }

    #[test]
    fn auto_pagination_covers_all_items_in_order() {
        let (card, script) = auto_card("[1, 2, 3, 4, 5, 6, 7]", Some(3));
        let ctx = ComponentContext::new(&script);
        let registry = CallbackRegistry::new("s1");

        let page1 = card.build(&ctx, &registry);
        assert_eq!(page1.len(), 3);
        assert_eq!(page1[0].text, "1-0");
        assert_eq!(page1[2].text, "3-2");
        assert_eq!(card.page_count(), 3);

        assert!(card.next_page());
        let page2 = card.build(&ctx, &registry);
        assert_eq!(page2.len(), 3);
        assert_eq!(page2[0].text, "4-3");

        assert!(card.next_page());
        let page3 = card.build(&ctx, &registry);
        assert_eq!(page3.len(), 1);
        assert_eq!(page3[0].text, "7-6");

        assert!(!card.next_page());
    }

    #[test]
    fn go_to_page_clamps_and_empty_items_yield_one_page() {
        let (card, script) = auto_card("[]", Some(3));
        let ctx = ComponentContext::new(&script);
        let registry = CallbackRegistry::new("s1");
        let buttons = card.build(&ctx, &registry);
        assert!(buttons.is_empty());
        assert_eq!(card.page_count(), 1);

        let (card, script) = auto_card("[1, 2, 3, 4]", Some(2));
        let ctx = ComponentContext::new(&script);
        let registry = CallbackRegistry::new("s1");
        let _ = card.build(&ctx, &registry);
        card.go_to_page(99);
        assert_eq!(card.current_page(), 1);
        card.go_to_page(-5);
        assert_eq!(card.current_page(), 0);
    }
}
