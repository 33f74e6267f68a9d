//! `Card` (spec §4.5, manual variant): either explicit `<page>` children, or
//! a flat child list auto-paginated by `maxItems`/`maxRows`. Owns
//! `currentPage` independently of the enclosing page.

use std::sync::{Arc, Mutex};

use botui_callback::CallbackRegistry;
use botui_script::ComponentContext;

use crate::button::Button;
use crate::control::ScriptControllable;
use crate::element::{ElementBase, MenuElement, PaginatedTarget};

use rhai::Dynamic;
use botui_script::ScriptError;

/// One fixed or auto-generated page of child elements inside a `Card`.
/// Elements are `Arc`-wrapped (rather than `Box`) so `ComponentFactory` can
/// also register a `Card`-owning element as a `component(id)` handle or a
/// `NavigatePanel` bound target from the same instance (spec §4.2, §4.5).
pub struct CardPage {
    pub elements: Vec<Arc<dyn MenuElement>>,
}

pub struct Card {
    base: Arc<ElementBase>,
    pages: Vec<CardPage>,
    current_page: Arc<Mutex<usize>>,
}

impl Card {
    pub fn new(base: Arc<ElementBase>, pages: Vec<CardPage>) -> Self {
        Self { base, pages, current_page: Arc::new(Mutex::new(0)) }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> usize {
        *self.current_page.lock().unwrap()
    }

    pub fn go_to_page(&self, index: i64) {
        if self.pages.is_empty() {
            return;
        }
        let clamped = index.clamp(0, self.pages.len() as i64 - 1) as usize;
        *self.current_page.lock().unwrap() = clamped;
    }

    pub fn next_page(&self) -> bool {
        let mut idx = self.current_page.lock().unwrap();
        if *idx + 1 < self.pages.len() {
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

    /// Renders every visible button across the current page's elements,
    /// grouped in element order (the owning page applies `rowIndex`
    /// grouping across the whole keyboard, including these).
    pub fn build_current_page(&self, ctx: &ComponentContext, registry: &CallbackRegistry) -> Vec<Button> {
        let Some(page) = self.pages.get(self.current_page()) else {
            return Vec::new();
        };
        page.elements
            .iter()
            .filter(|el| !el.hidden(ctx))
            .flat_map(|el| el.build(ctx, registry))
            .collect()
    }
}

impl MenuElement for Card {
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
        self.build_current_page(ctx, registry)
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        for page in &self.pages {
            for el in &page.elements {
                el.dispose(registry);
            }
        }
    }
}

impl PaginatedTarget for Card {
    fn next_page(&self) -> bool {
        Card::next_page(self)
    }
    fn prev_page(&self) -> bool {
        Card::prev_page(self)
    }
    fn go_to_page(&self, index: i64) {
        Card::go_to_page(self, index)
    }
    fn current_page(&self) -> usize {
        Card::current_page(self)
    }
    fn page_count(&self) -> usize {
        Card::page_count(self)
    }
}

impl ScriptControllable for Card {
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
            other => Err(ScriptError::Host(format!("Card has no method '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botui_core::model::ComponentDefinition;

    fn base() -> Arc<ElementBase> {
        Arc::new(ElementBase::apply_definition(&[], &ComponentDefinition::new("card")).unwrap())
    }

    #[test]
    fn next_and_prev_page_stop_at_boundaries() {
        let card = Card::new(base(), vec![
            CardPage { elements: vec![] },
            CardPage { elements: vec![] },
        ]);
        assert!(!card.prev_page());
        assert!(card.next_page());
        assert_eq!(card.current_page(), 1);
        assert!(!card.next_page());
    }

    #[test]
    fn go_to_page_clamps_to_valid_range() {
        let card = Card::new(base(), vec![
            CardPage { elements: vec![] },
            CardPage { elements: vec![] },
            CardPage { elements: vec![] },
        ]);
        card.go_to_page(10);
        assert_eq!(card.current_page(), 2);
        card.go_to_page(-5);
        assert_eq!(card.current_page(), 0);
    }
}
