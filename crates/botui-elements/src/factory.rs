//! `ComponentFactory` (spec §4, §8): turns compiled `ComponentDefinition`s
//! into live `MenuElement` trees.
//!
//! Three pieces of directive expansion happen here rather than in the
//! (out-of-scope) XML parser, because all three need a live `ScriptContext`
//! to resolve against:
//!
//! - `v-if`/`v-else-if`/`v-else` chains desugar into synthesized `hide`
//!   guards, reusing `ElementBase`'s existing hide/hidden machinery instead
//!   of a second "is this branch active" concept (see DESIGN.md).
//! - `v-for` expands into a [`VForGroup`]: a synthetic element that
//!   re-evaluates its array expression and rebuilds its per-iteration
//!   children on every `build()`, mirroring `AutoCard`'s `last_children`
//!   pattern, and freezes each iteration's props/loop vars via
//!   `ElementBase::freeze_all` so click handlers keep seeing the item/index
//!   they were built with (spec §8 `v-for` closure property).
//! - Nested markup (`Card`'s `<page>` children, `AutoCard`'s
//!   `<template #item>` children) is compiled with [`compile_node`], since
//!   `ComponentDefinition.element` only stores the raw, unsplit markup at
//!   that depth.

use std::sync::{Arc, Mutex};

use rhai::Dynamic;

use botui_callback::CallbackRegistry;
use botui_core::error::PageError;
use botui_core::model::{AttributeSets, ComponentDefinition, ElementNode, VIfKind};
use botui_script::{ComponentContext, ComponentLookup, ScriptContext, ScriptError};

use crate::auto_card::{AutoCard, AutoCardBuilder};
use crate::button::Button;
use crate::card::{Card, CardPage};
use crate::checkbox::Checkbox;
use crate::checkbox_list::CheckboxList;
use crate::command::Command;
use crate::control::ComponentHandle;
use crate::element::{ElementBase, ElementHost, FrozenLoopVars, MenuElement};
use crate::modal::{CheckboxModal, RadioModal};
use crate::navigate_panel::{NavigatePanel, NavigateTarget};
use crate::open::Open;
use crate::radio::Radio;
use crate::split::Split;
use crate::switch::Switch;

/// Builds live elements for one page (or one `Card`/`AutoCard` sub-tree).
/// Cheap to clone: every field is an `Arc`, so the per-item `AutoCard`
/// builder and the `VForGroup` it constructs can each hold their own copy
/// while still registering into the same shared [`ElementLookup`].
#[derive(Clone)]
pub struct ComponentFactory {
    script: Arc<ScriptContext>,
    host: ElementHost,
    lookup: Arc<Mutex<ElementLookup>>,
}

impl ComponentFactory {
    pub fn new(script: Arc<ScriptContext>, host: ElementHost) -> Self {
        Self { script, host, lookup: Arc::new(Mutex::new(ElementLookup::new())) }
    }

    /// Like [`Self::new`], but binds to a lookup created ahead of time —
    /// for the case where `script` itself was built with
    /// `ScriptContext::with_component_lookup(..., lookup.clone())`, so the
    /// engine's `component(id)` global and this factory's registrations
    /// share the same table (`botui-runtime`'s `PageManager` concern).
    pub fn with_lookup(script: Arc<ScriptContext>, host: ElementHost, lookup: Arc<Mutex<ElementLookup>>) -> Self {
        Self { script, host, lookup }
    }

    /// The shared `component(id)` / `NavigatePanel` target table this
    /// factory populates as it builds elements with an `id`. Hand this to
    /// `ScriptContext::with_component_lookup` when constructing the page's
    /// script context (`botui-runtime` concern).
    pub fn lookup(&self) -> Arc<Mutex<ElementLookup>> {
        self.lookup.clone()
    }

    /// Builds every top-level element for a page or sub-tree, expanding
    /// `v-if`/`v-else-if`/`v-else` and `v-for` directives along the way.
    pub fn build_all(&self, defs: &[ComponentDefinition]) -> Result<Vec<Arc<dyn MenuElement>>, PageError> {
        let guarded = apply_conditional_guards(defs);
        let mut out = Vec::with_capacity(guarded.len());
        for def in &guarded {
            match &def.v_for {
                Some(v_for) => {
                    let mut inner = def.clone();
                    inner.v_for = None;
                    out.push(Arc::new(VForGroup::new(inner, v_for.clone(), self.clone())) as Arc<dyn MenuElement>);
                }
                None => out.push(self.build_one(def)?),
            }
        }
        Ok(out)
    }

    fn build_one(&self, def: &ComponentDefinition) -> Result<Arc<dyn MenuElement>, PageError> {
        let script = self.script.clone();
        let host = self.host.clone();
        let element: Arc<dyn MenuElement> = match def.tag_name.as_str() {
            "command" => Arc::new(Command::new(def, script, host, None)?),
            "open" => Arc::new(Open::new(def, script, host)?),
            "checkbox" => {
                let checkbox = Arc::new(Checkbox::new(def, script, host, None)?);
                self.register(def, checkbox.clone(), None);
                checkbox
            }
            "checkbox-list" => {
                let list = Arc::new(CheckboxList::new(def, script, host)?);
                self.register(def, list.clone(), None);
                list
            }
            "radio" => {
                let radio = Arc::new(Radio::new(def, script, host)?);
                self.register(def, radio.clone(), None);
                radio
            }
            "switch" => {
                let switch = Arc::new(Switch::new(def, script, host)?);
                self.register(def, switch.clone(), None);
                switch
            }
            "split" => Arc::new(Split::new(def)?),
            "radio-modal" => Arc::new(RadioModal::new(def, script, host)?),
            "checkbox-modal" => Arc::new(CheckboxModal::new(def, script, host)?),
            "card" => {
                let card = Arc::new(self.build_card(def)?);
                self.register(def, card.clone(), Some(card.clone()));
                card
            }
            "autocard" => {
                let auto_card = Arc::new(self.build_auto_card(def)?);
                self.register(def, auto_card.clone(), Some(auto_card.clone()));
                auto_card
            }
            "navigate-panel" => Arc::new(self.build_navigate_panel(def)?),
            other => return Err(PageError::Malformed(format!("unknown component tag '{other}'"))),
        };
        Ok(element)
    }

    /// Registers an element with an `id` into the shared lookup: as a
    /// `component(id)` script handle (every `ScriptControllable`), and, for
    /// `Card`/`AutoCard`, additionally as a `NavigatePanel` bound target
    /// (spec §4.2 `component(id)`, §4.5 NavigatePanel).
    fn register<T>(&self, def: &ComponentDefinition, controllable: Arc<T>, target: Option<Arc<T>>)
    where
        T: crate::control::ScriptControllable + crate::element::PaginatedTarget + 'static,
    {
        let Some(id) = &def.id else { return };
        let mut lookup = self.lookup.lock().unwrap();
        lookup.insert_controllable(id.clone(), controllable as Arc<dyn crate::control::ScriptControllable>);
        if let Some(target) = target {
            lookup.insert_target(id.clone(), target as Arc<dyn crate::element::PaginatedTarget>);
        }
    }

    fn build_card(&self, def: &ComponentDefinition) -> Result<Card, PageError> {
        let base = Arc::new(ElementBase::apply_definition(&[], def)?);
        let page_nodes: Vec<&ElementNode> = def.element.children_named("page").collect();
        let pages = if !page_nodes.is_empty() {
            let mut pages = Vec::with_capacity(page_nodes.len());
            for node in page_nodes {
                let child_defs = compile_children(&node.children);
                let elements = self.build_all(&child_defs)?;
                pages.push(CardPage { elements });
            }
            pages
        } else {
            let flat_nodes: Vec<ElementNode> =
                def.element.children.iter().filter(|c| c.tag != "page").cloned().collect();
            let child_defs = compile_children(&flat_nodes);
            let elements = self.build_all(&child_defs)?;
            paginate_flat(elements, usize_attr(def, "maxItems"), usize_attr(def, "maxRows"))
        };
        Ok(Card::new(base, pages))
    }

    fn build_auto_card(&self, def: &ComponentDefinition) -> Result<AutoCard, PageError> {
        let base = Arc::new(ElementBase::apply_definition(&[], def)?);
        let items_expr = def
            .attrs
            .binds
            .get("items")
            .cloned()
            .ok_or_else(|| PageError::Malformed(format!("autocard '{}' requires :items", def.id.clone().unwrap_or_default())))?;
        let item_name = def.attrs.statics.get("itemName").cloned().unwrap_or_else(|| "item".to_string());
        let index_name = def.attrs.statics.get("indexName").cloned().unwrap_or_else(|| "index".to_string());
        let template_children = def
            .element
            .child("template")
            .map(|t| t.children.clone())
            .unwrap_or_else(|| def.element.children.clone());
        let max_items = usize_attr(def, "maxItems");
        let max_rows = usize_attr(def, "maxRows");

        let factory = self.clone();
        let builder: AutoCardBuilder = Arc::new(move |item: Dynamic, index: usize| {
            factory.build_for_item(&template_children, &item_name, item, &index_name, index)
        });
        Ok(AutoCard::new(base, items_expr, builder, max_items, max_rows))
    }

    /// Builds one `<template #item>` expansion for a single `AutoCard` item,
    /// freezing every constructed child with the item/index values that
    /// produced it (spec §8 `v-for` closure property, reused verbatim here
    /// since `AutoCard` has the same freezing requirement as `v-for`).
    fn build_for_item(
        &self,
        template_children: &[ElementNode],
        item_name: &str,
        item: Dynamic,
        index_name: &str,
        index: usize,
    ) -> Result<Vec<Arc<dyn MenuElement>>, PageError> {
        let mut item_ctx = ComponentContext::new(&self.script);
        item_ctx.set_local(item_name, item.clone());
        item_ctx.set_local(index_name, Dynamic::from(index as i64));

        let defs = compile_children(template_children);
        let elements = self.build_all(&defs)?;

        let loop_vars = FrozenLoopVars {
            item_name: Some(item_name.to_string()),
            item_value: Some(item),
            index_name: Some(index_name.to_string()),
            index_value: Some(Dynamic::from(index as i64)),
        };
        for element in &elements {
            element.base().freeze_all(&item_ctx, loop_vars.clone());
        }
        Ok(elements)
    }

    fn build_navigate_panel(&self, def: &ComponentDefinition) -> Result<NavigatePanel, PageError> {
        let carousel = def.attrs.statics.get("carousel").map(|v| v == "true").unwrap_or(false);
        let hide_boundary = def.attrs.statics.get("hideBoundary").map(|v| v == "true").unwrap_or(false);
        let target = match def.attrs.statics.get("target").or_else(|| def.attrs.binds.get("target")) {
            Some(id) => match self.lookup.lock().unwrap().target(id) {
                Some(bound) => NavigateTarget::Bound(bound),
                None => NavigateTarget::Callback,
            },
            None => NavigateTarget::Callback,
        };
        NavigatePanel::new(def, target, carousel, hide_boundary, self.script.clone(), self.host.clone())
    }
}

fn usize_attr(def: &ComponentDefinition, name: &str) -> Option<usize> {
    def.attrs.statics.get(name).and_then(|s| s.trim().parse::<usize>().ok())
}

/// Chunks a flat element list into `CardPage`s of at most
/// `min(max_items, max_rows)` elements each (spec §4.5: auto-pagination
/// treats both limits as an element-count cap, the same simplification
/// `AutoCard::limit` makes).
fn paginate_flat(elements: Vec<Arc<dyn MenuElement>>, max_items: Option<usize>, max_rows: Option<usize>) -> Vec<CardPage> {
    let limit = max_items.unwrap_or(usize::MAX).min(max_rows.unwrap_or(usize::MAX));
    if limit == usize::MAX {
        return vec![CardPage { elements }];
    }
    let mut pages = Vec::new();
    let mut iter = elements.into_iter();
    loop {
        let chunk: Vec<_> = (&mut iter).take(limit.max(1)).collect();
        if chunk.is_empty() {
            break;
        }
        pages.push(CardPage { elements: chunk });
    }
    if pages.is_empty() {
        pages.push(CardPage { elements: Vec::new() });
    }
    pages
}

/// Desugars `v-if`/`v-else-if`/`v-else` chains into synthesized `hide`
/// guards. Branch `i`'s hide expression is `OR(all prior conditions in the
/// chain) OR NOT(its own condition)`; the trailing `else` branch (no own
/// condition) is `OR(all prior conditions)`. A pre-existing explicit `hide`
/// attribute is combined with `OR` rather than overwritten.
fn apply_conditional_guards(defs: &[ComponentDefinition]) -> Vec<ComponentDefinition> {
    let mut out = Vec::with_capacity(defs.len());
    let mut prior_conditions: Vec<String> = Vec::new();
    for def in defs {
        let mut def = def.clone();
        match &def.v_if {
            Some(v_if) => {
                if v_if.kind == VIfKind::If {
                    prior_conditions.clear();
                }
                let mut clauses: Vec<String> = prior_conditions.iter().map(|c| format!("({c})")).collect();
                if let Some(cond) = &v_if.condition {
                    clauses.push(format!("!({cond})"));
                }
                let synthesized = if clauses.is_empty() { None } else { Some(clauses.join(" || ")) };
                def.hide = combine_hide(def.hide.take(), synthesized);
                if let Some(cond) = &v_if.condition {
                    prior_conditions.push(cond.clone());
                }
            }
            None => prior_conditions.clear(),
        }
        out.push(def);
    }
    out
}

fn combine_hide(explicit: Option<String>, synthesized: Option<String>) -> Option<String> {
    match (explicit, synthesized) {
        (Some(a), Some(b)) => Some(format!("({a}) || ({b})")),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Splits a nested markup node's attributes into `ComponentDefinition`'s
/// `:`/`@`/plain families (spec §4), for the depths the out-of-scope XML
/// parser doesn't pre-split: `Card`'s `<page>` children and `AutoCard`'s
/// `<template #item>` children.
pub fn compile_node(node: &ElementNode, row_index: usize) -> ComponentDefinition {
    let mut attrs = AttributeSets::default();
    let mut id = None;
    let mut hide = None;
    let mut columns = None;
    let mut v_if = None;
    let mut v_for = None;

    for (key, value) in &node.attributes {
        if let Some(name) = key.strip_prefix(':').or_else(|| key.strip_prefix("v-bind:")) {
            match name {
                "hide" => hide = Some(value.clone()),
                "columns" => columns = Some(value.clone()),
                other => {
                    attrs.binds.insert(other.to_string(), value.clone());
                }
            }
        } else if let Some(name) = key.strip_prefix('@').or_else(|| key.strip_prefix("v-on:")) {
            attrs.events.insert(name.to_string(), value.clone());
        } else {
            match key.as_str() {
                "id" => id = Some(value.clone()),
                "hide" => hide = Some(value.clone()),
                "columns" => columns = Some(value.clone()),
                "v-if" => v_if = Some(botui_core::model::VIf { kind: VIfKind::If, condition: Some(value.clone()) }),
                "v-else-if" => v_if = Some(botui_core::model::VIf { kind: VIfKind::ElseIf, condition: Some(value.clone()) }),
                "v-else" => v_if = Some(botui_core::model::VIf { kind: VIfKind::Else, condition: None }),
                "v-for" => v_for = parse_v_for(value),
                other => {
                    attrs.statics.insert(other.to_string(), value.clone());
                }
            }
        }
    }

    ComponentDefinition {
        tag_name: node.tag.clone(),
        id,
        element: node.clone(),
        row_index: Some(row_index),
        hide,
        columns,
        v_if,
        v_for,
        attrs,
    }
}

/// Parses `"item in items"` / `"(item, index) in items"` (spec §4, §8).
fn parse_v_for(raw: &str) -> Option<botui_core::model::VFor> {
    let (head, expression) = raw.split_once(" in ")?;
    let head = head.trim();
    let expression = expression.trim().to_string();
    if let Some(inner) = head.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        let mut parts = inner.split(',').map(|s| s.trim().to_string());
        let item_name = parts.next()?;
        let index_name = parts.next().filter(|s| !s.is_empty());
        Some(botui_core::model::VFor { item_name, index_name, expression })
    } else {
        Some(botui_core::model::VFor { item_name: head.to_string(), index_name: None, expression })
    }
}

fn compile_children(nodes: &[ElementNode]) -> Vec<ComponentDefinition> {
    nodes.iter().enumerate().map(|(index, node)| compile_node(node, index)).collect()
}

/// The synthetic element a `v-for` directive expands into: re-evaluates its
/// array expression and rebuilds one child `MenuElement` per item on every
/// `build()`, rather than persisting iteration elements across renders
/// (mirrors `AutoCard`'s `last_children` rebuild-every-render pattern).
/// Each iteration's element gets `row_index = base_row + index` (spec §3:
/// "v-for iterations get base_row_index + iteration index").
struct VForGroup {
    own_base: Arc<ElementBase>,
    inner_def: ComponentDefinition,
    item_name: String,
    index_name: Option<String>,
    expression: String,
    factory: ComponentFactory,
    base_row: usize,
    last_children: Mutex<Vec<Arc<dyn MenuElement>>>,
}

impl VForGroup {
    fn new(inner_def: ComponentDefinition, v_for: botui_core::model::VFor, factory: ComponentFactory) -> Self {
        let base_row = inner_def.row_index.unwrap_or(0);
        let own_base = Arc::new(
            ElementBase::apply_definition(&[], &inner_def)
                .expect("v-for group's own base never declares a prop, so this cannot fail"),
        );
        Self {
            own_base,
            inner_def,
            item_name: v_for.item_name,
            index_name: v_for.index_name,
            expression: v_for.expression,
            factory,
            base_row,
            last_children: Mutex::new(Vec::new()),
        }
    }

    fn build_iteration(&self, item: Dynamic, index: usize) -> Result<Arc<dyn MenuElement>, PageError> {
        let mut def = self.inner_def.clone();
        def.row_index = Some(self.base_row + index);
        if let Some(id) = &def.id {
            def.id = Some(format!("{id}[{index}]"));
        }

        let mut item_ctx = ComponentContext::new(&self.factory.script);
        item_ctx.set_local(&self.item_name, item.clone());
        if let Some(index_name) = &self.index_name {
            item_ctx.set_local(index_name, Dynamic::from(index as i64));
        }

        let element = self.factory.build_one(&def)?;
        let loop_vars = FrozenLoopVars {
            item_name: Some(self.item_name.clone()),
            item_value: Some(item),
            index_name: self.index_name.clone(),
            index_value: self.index_name.as_ref().map(|_| Dynamic::from(index as i64)),
        };
        element.base().freeze_all(&item_ctx, loop_vars);
        Ok(element)
    }
}

impl MenuElement for VForGroup {
    fn id(&self) -> &str {
        &self.own_base.id
    }

    fn row_index(&self) -> usize {
        self.own_base.row_index()
    }

    fn hidden(&self, ctx: &ComponentContext) -> bool {
        self.own_base.hidden(ctx)
    }

    fn base(&self) -> &Arc<ElementBase> {
        &self.own_base
    }

    fn build(&self, ctx: &ComponentContext, registry: &CallbackRegistry) -> Vec<Button> {
        {
            let previous = self.last_children.lock().unwrap();
            for element in previous.iter() {
                element.dispose(registry);
            }
        }

        let items: rhai::Array = match ctx.script().evaluate(&self.expression) {
            Ok(items) => items,
            Err(_) => {
                ctx.script().route_error(&ScriptError::Host(format!("v-for expression '{}' did not evaluate to an array", self.expression)));
                Vec::new()
            }
        };

        let mut children = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match self.build_iteration(item, index) {
                Ok(element) => children.push(element),
                Err(e) => ctx.script().route_error(&ScriptError::Host(e.to_string())),
            }
        }

        let buttons = children
            .iter()
            .filter(|element| !element.hidden(ctx))
            .flat_map(|element| element.build(ctx, registry))
            .collect();
        *self.last_children.lock().unwrap() = children;
        buttons
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        for element in self.last_children.lock().unwrap().drain(..) {
            element.dispose(registry);
        }
    }
}

/// Resolves `component(id)` for scripts and `NavigatePanel`'s `target`
/// lookup: both read from the same page-scoped id -> element table built
/// alongside `build_all`.
pub struct ElementLookup {
    handles: std::collections::HashMap<String, Arc<dyn crate::control::ScriptControllable>>,
    targets: std::collections::HashMap<String, Arc<dyn crate::element::PaginatedTarget>>,
}

impl ElementLookup {
    pub fn new() -> Self {
        Self { handles: std::collections::HashMap::new(), targets: std::collections::HashMap::new() }
    }

    pub fn insert_controllable(&mut self, id: String, handle: Arc<dyn crate::control::ScriptControllable>) {
        self.handles.insert(id, handle);
    }

    pub fn insert_target(&mut self, id: String, target: Arc<dyn crate::element::PaginatedTarget>) {
        self.targets.insert(id, target);
    }

    pub fn target(&self, id: &str) -> Option<Arc<dyn crate::element::PaginatedTarget>> {
        self.targets.get(id).cloned()
    }
}

impl Default for ElementLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentLookup for ElementLookup {
    fn get(&self, id: &str) -> Option<Dynamic> {
        self.handles.get(id).map(|handle| Dynamic::from(ComponentHandle(handle.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use botui_core::log::CapturingSink;
    use botui_core::model::{AttributeSets, VIf};
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

    fn factory() -> (ComponentFactory, Arc<ScriptContext>) {
        let ui: Arc<NoopUi> = Arc::new(NoopUi);
        let script = Arc::new(Ctx::new(ui.clone(), Arc::new(NoopUser), Arc::new(CapturingSink::new())));
        (ComponentFactory::new(script.clone(), ui), script)
    }

    fn command_def(id: &str, title: &str) -> ComponentDefinition {
        let mut attrs = AttributeSets::default();
        attrs.statics.insert("title".into(), title.into());
        ComponentDefinition { id: Some(id.into()), attrs, ..ComponentDefinition::new("command") }
    }

    #[test]
    fn v_if_else_if_else_chain_hides_all_but_the_matching_branch() {
        let (factory, script) = factory();
        script.evaluate::<Dynamic>("let n = 2;").ok();
        let _ = script.execute_async("let n = 2;");

        let mut a = command_def("a", "A");
        a.v_if = Some(VIf { kind: VIfKind::If, condition: Some("n == 1".into()) });
        let mut b = command_def("b", "B");
        b.v_if = Some(VIf { kind: VIfKind::ElseIf, condition: Some("n == 2".into()) });
        let mut c = command_def("c", "C");
        c.v_if = Some(VIf { kind: VIfKind::Else, condition: None });

        let guarded = apply_conditional_guards(&[a, b, c]);
        assert_eq!(guarded[0].hide.as_deref(), Some("!(n == 1)"));
        assert_eq!(guarded[1].hide.as_deref(), Some("(n == 1) || !(n == 2)"));
        assert_eq!(guarded[2].hide.as_deref(), Some("(n == 1) || (n == 2)"));

        let ctx = ComponentContext::new(&script);
        assert!(guarded[0].hide.as_ref().map(|e| ctx.evaluate_bool(e).unwrap()).unwrap());
        assert!(!guarded[1].hide.as_ref().map(|e| ctx.evaluate_bool(e).unwrap()).unwrap());
        assert!(guarded[2].hide.as_ref().map(|e| ctx.evaluate_bool(e).unwrap()).unwrap());
    }

    #[test]
    fn explicit_hide_is_combined_with_synthesized_guard() {
        let mut a = command_def("a", "A");
        a.hide = Some("alwaysOff".into());
        a.v_if = Some(VIf { kind: VIfKind::If, condition: Some("cond".into()) });
        let guarded = apply_conditional_guards(&[a]);
        assert_eq!(guarded[0].hide.as_deref(), Some("(alwaysOff) || !(cond)"));
    }

    #[test]
    fn build_all_dispatches_plain_command_by_tag_name() {
        let (factory, script) = factory();
        let elements = factory.build_all(&[command_def("go", "Go")]).unwrap();
        assert_eq!(elements.len(), 1);
        let registry = CallbackRegistry::new("s1");
        let ctx = ComponentContext::new(&script);
        let buttons = elements[0].build(&ctx, &registry);
        assert_eq!(buttons[0].text, "Go");
    }

    #[test]
    fn v_for_expands_one_element_per_array_item_with_row_offset() {
        let (factory, script) = factory();
        script.execute_async("let items = [\"a\", \"b\", \"c\"];").ok();

        let mut def = command_def("row", "{{ item }}");
        def.row_index = Some(5);
        def.v_for = Some(botui_core::model::VFor { item_name: "item".into(), index_name: Some("i".into()), expression: "items".into() });

        let elements = factory.build_all(&[def]).unwrap();
        assert_eq!(elements.len(), 1);
        let registry = CallbackRegistry::new("s1");
        let ctx = ComponentContext::new(&script);
        let buttons = elements[0].build(&ctx, &registry);
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0].text, "a");
        assert_eq!(buttons[1].text, "b");
        assert_eq!(buttons[2].text, "c");
        assert_eq!(buttons[0].row_index, 5);
        assert_eq!(buttons[2].row_index, 7);
    }

    #[test]
    fn compile_node_splits_bind_event_and_plain_attribute_prefixes() {
        let node = ElementNode {
            tag: "command".into(),
            attributes: [
                (":title".to_string(), "self.label".to_string()),
                ("@click".to_string(), "doThing()".to_string()),
                ("columns".to_string(), "2".to_string()),
                ("id".to_string(), "x".to_string()),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let def = compile_node(&node, 0);
        assert_eq!(def.id.as_deref(), Some("x"));
        assert_eq!(def.attrs.binds.get("title").map(String::as_str), Some("self.label"));
        assert_eq!(def.attrs.events.get("click").map(String::as_str), Some("doThing()"));
        assert_eq!(def.columns.as_deref(), Some("2"));
    }

    #[test]
    fn parse_v_for_reads_item_and_index_names() {
        let v_for = parse_v_for("(row, idx) in rows").unwrap();
        assert_eq!(v_for.item_name, "row");
        assert_eq!(v_for.index_name.as_deref(), Some("idx"));
        assert_eq!(v_for.expression, "rows");

        let v_for = parse_v_for("row in rows").unwrap();
        assert_eq!(v_for.item_name, "row");
        assert_eq!(v_for.index_name, None);
    }
}
