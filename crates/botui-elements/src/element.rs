//! `MenuElement` common protocol (spec §4.4).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rhai::Dynamic;

use botui_core::error::PageError;
use botui_core::model::ComponentDefinition;
use botui_callback::CallbackRegistry;
use botui_script::{ComponentContext, ScriptContext, ScriptError, UiHost};

use crate::button::Button;

/// A prop a concrete element type declares: its name, and whether a
/// missing binding/template/attribute falls back to the element's inner
/// text (only `title` does, per §4.4).
#[derive(Debug, Clone, Copy)]
pub struct PropSource {
    pub name: &'static str,
    pub allow_inner_text_fallback: bool,
}

impl PropSource {
    pub const fn new(name: &'static str) -> Self {
        Self { name, allow_inner_text_fallback: false }
    }

    pub const fn with_text_fallback(name: &'static str) -> Self {
        Self { name, allow_inner_text_fallback: true }
    }
}

/// Loop-iteration values captured at freeze time so an event handler sees
/// `item == items[k]` and `index == k` forever, regardless of how the
/// engine's loop variables are mutated afterwards (spec §4.4, §8 `v-for`
/// closure property).
#[derive(Clone, Default)]
pub struct FrozenLoopVars {
    pub item_name: Option<String>,
    pub item_value: Option<Dynamic>,
    pub index_name: Option<String>,
    pub index_value: Option<Dynamic>,
}

impl FrozenLoopVars {
    pub fn install(&self, script: &ScriptContext) {
        if let (Some(name), Some(value)) = (&self.item_name, &self.item_value) {
            script.install_local(name, value.clone());
        }
        if let (Some(name), Some(value)) = (&self.index_name, &self.index_value) {
            script.install_local(name, value.clone());
        }
    }
}

/// Shared state and behaviour every concrete `MenuElement` composes in,
/// rather than re-implementing prop resolution, freezing and event
/// dispatch per type (spec §4.4).
pub struct ElementBase {
    pub id: String,
    pub hide_template: Option<String>,
    pub columns_template: Option<String>,
    pub lang: Option<String>,
    prop_templates: HashMap<String, String>,
    bindings: HashMap<String, String>,
    event_handlers: HashMap<String, String>,
    frozen_props: Mutex<Option<HashMap<String, String>>>,
    frozen_event_context: Mutex<Option<FrozenLoopVars>>,
    tokens: Mutex<Vec<String>>,
    pub row_index: Mutex<usize>,
}

impl ElementBase {
    /// `applyDefinition` (spec §4.4): walk `known` prop descriptors and
    /// resolve each from `:name`/child-element/attribute, erroring if two
    /// sources claim the same prop.
    pub fn apply_definition(known: &[PropSource], def: &ComponentDefinition) -> Result<Self, PageError> {
        let id = def.id.clone().unwrap_or_default();
        let mut prop_templates = HashMap::new();
        let mut bindings = HashMap::new();

        for prop in known {
            let mut sources = 0u8;
            if let Some(expr) = def.attrs.binds.get(prop.name) {
                bindings.insert(prop.name.to_string(), expr.clone());
                sources += 1;
            }
            if let Some(child) = def.element.child(prop.name) {
                if sources > 0 {
                    return Err(PageError::DuplicatePropSource {
                        component_id: id.clone(),
                        prop: prop.name.to_string(),
                    });
                }
                prop_templates.insert(prop.name.to_string(), child.inner_template());
                sources += 1;
            }
            if let Some(value) = def.attrs.statics.get(prop.name) {
                if sources > 0 {
                    return Err(PageError::DuplicatePropSource {
                        component_id: id.clone(),
                        prop: prop.name.to_string(),
                    });
                }
                prop_templates.insert(prop.name.to_string(), value.clone());
                sources += 1;
            }
            if sources == 0 && prop.allow_inner_text_fallback {
                let text = def.element.text.trim();
                if !text.is_empty() {
                    prop_templates.insert(prop.name.to_string(), text.to_string());
                }
            }
        }

        Ok(Self {
            id,
            hide_template: def.hide.clone(),
            columns_template: def.columns.clone(),
            lang: None,
            prop_templates,
            bindings,
            event_handlers: def.attrs.events.clone(),
            frozen_props: Mutex::new(None),
            frozen_event_context: Mutex::new(None),
            tokens: Mutex::new(Vec::new()),
            row_index: Mutex::new(def.row_index.unwrap_or(0)),
        })
    }

    pub fn row_index(&self) -> usize {
        *self.row_index.lock().unwrap()
    }

    pub fn set_row_index(&self, idx: usize) {
        *self.row_index.lock().unwrap() = idx;
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.event_handlers.contains_key(name)
    }

    /// `getRawProp(name)` (spec §4.4): the template unrendered.
    pub fn get_raw_prop(&self, name: &str) -> Option<String> {
        self.prop_templates.get(name).cloned()
    }

    /// Whether `name` was sourced from a `:name`/`v-bind:name` attribute.
    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// The unevaluated binding expression for `name`, if any.
    pub fn get_raw_binding(&self, name: &str) -> Option<String> {
        self.bindings.get(name).cloned()
    }

    /// Whether any source (binding, child element or attribute) declared
    /// `name` at all.
    pub fn has_prop_source(&self, name: &str) -> bool {
        self.bindings.contains_key(name) || self.prop_templates.contains_key(name)
    }

    /// `getProp(name)` (spec §4.4): frozen -> binding -> template -> default.
    pub fn get_prop(&self, name: &str, ctx: &ComponentContext, default: &str) -> String {
        if let Some(frozen) = self.frozen_props.lock().unwrap().as_ref() {
            if let Some(v) = frozen.get(name) {
                return v.clone();
            }
        }
        self.resolve_prop(name, ctx, default)
    }

    fn resolve_prop(&self, name: &str, ctx: &ComponentContext, default: &str) -> String {
        if let Some(expr) = self.bindings.get(name) {
            return ctx.eval_and_unwrap(expr);
        }
        if let Some(template) = self.prop_templates.get(name) {
            return self.render_localised(template, ctx);
        }
        default.to_string()
    }

    fn render_localised(&self, template: &str, ctx: &ComponentContext) -> String {
        match &self.lang {
            Some(lang) => {
                let previous = ctx.script().lang();
                ctx.script().set_lang(lang.clone());
                let rendered = ctx.render(template);
                ctx.script().set_lang(previous);
                rendered
            }
            None => ctx.render(template),
        }
    }

    pub fn get_bool_prop(&self, name: &str, ctx: &ComponentContext, default: bool) -> bool {
        match self.get_raw_prop(name).or_else(|| self.bindings.get(name).cloned()) {
            Some(_) => {
                let rendered = self.resolve_prop(name, ctx, if default { "true" } else { "false" });
                matches!(rendered.trim(), "true" | "1")
            }
            None => default,
        }
    }

    pub fn hidden(&self, ctx: &ComponentContext) -> bool {
        match &self.hide_template {
            Some(expr) => ctx.evaluate_bool(expr).unwrap_or(false),
            None => false,
        }
    }

    pub fn columns(&self, ctx: &ComponentContext, default: usize) -> usize {
        match &self.columns_template {
            Some(expr) => ctx.render(expr).trim().parse::<usize>().unwrap_or(default),
            None => default,
        }
    }

    /// `freezeProps` (spec §4.4): snapshot every prop this element reads,
    /// plus the current loop-iteration values, so later renders / event
    /// dispatch see this exact moment even after the engine's loop
    /// variables have moved on or been cleared.
    pub fn freeze(&self, prop_names: &[&str], ctx: &ComponentContext, loop_vars: FrozenLoopVars) {
        let mut snapshot = HashMap::new();
        for name in prop_names {
            snapshot.insert(name.to_string(), self.resolve_prop(name, ctx, ""));
        }
        *self.frozen_props.lock().unwrap() = Some(snapshot);
        *self.frozen_event_context.lock().unwrap() = Some(loop_vars);
    }

    /// Every prop name this element has a source for, regardless of which
    /// concrete `PropSource` list declared it — lets `ComponentFactory`
    /// freeze a `v-for` iteration generically without knowing the concrete
    /// element type's own prop list (spec §8 `v-for` closure property).
    pub fn known_prop_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.prop_templates.keys().cloned().collect();
        for name in self.bindings.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Convenience over [`Self::freeze`] that freezes every prop this
    /// element has a source for.
    pub fn freeze_all(&self, ctx: &ComponentContext, loop_vars: FrozenLoopVars) {
        let names = self.known_prop_names();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        self.freeze(&refs, ctx, loop_vars);
    }

    /// `invokeEvent(name, eventArgs?)` (spec §4.4): repopulate the engine
    /// with the frozen loop context, publish `event`/`callbackQueryId`,
    /// then run the handler's code.
    pub fn invoke_event(
        &self,
        name: &str,
        event_args: Dynamic,
        callback_query_id: Option<String>,
        script: &ScriptContext,
    ) -> Option<Result<Dynamic, ScriptError>> {
        let code = self.event_handlers.get(name)?;
        if let Some(loop_vars) = self.frozen_event_context.lock().unwrap().as_ref() {
            loop_vars.install(script);
        }
        script.set_callback_query_id(callback_query_id);
        script.set_event(event_args);
        Some(script.execute_async(code))
    }

    pub fn own_token(&self, token: String) {
        self.tokens.lock().unwrap().push(token);
    }

    /// Unsubscribes every token this element currently owns — called both
    /// on `dispose()` and at the start of every rebuild (spec §5: old
    /// tokens for the same button must not survive a rebuild).
    pub fn clear_tokens(&self, registry: &CallbackRegistry) {
        for token in self.tokens.lock().unwrap().drain(..) {
            registry.unsubscribe(&token);
        }
    }
}

/// One `<option>` parsed from a CheckboxList/Radio/Switch's child markup
/// (spec §4.5). Each option's title is a template, re-rendered on every
/// build so bindings inside it stay live.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub id: String,
    pub title_template: String,
}

/// Parses `<option id="...">Title</option>` children into option specs,
/// in document order.
pub fn parse_options(element: &botui_core::model::ElementNode) -> Vec<OptionSpec> {
    element
        .children_named("option")
        .map(|node| {
            let id = node
                .attributes
                .get("id")
                .cloned()
                .unwrap_or_else(|| node.text.trim().to_string());
            let title_template = if !node.text.trim().is_empty() {
                node.text.clone()
            } else {
                node.attributes.get("title").cloned().unwrap_or_default()
            };
            OptionSpec { id, title_template }
        })
        .collect()
}

/// A host-side (non-script) click handler — the Rust-idiomatic stand-in
/// for the source's reflection-based "host `onClick` property" (spec
/// §4.5 Command). Optional; most elements only carry a script `@click`.
pub type NativeClickHandler = Arc<dyn Fn() -> botui_callback::HandlerFuture + Send + Sync>;

/// Same shape, used for other native (non-`@click`) event slots such as
/// Checkbox's `onUpdate`.
pub type NativeHandler = NativeClickHandler;

/// Notifies the owning page that state changed and a re-render is needed,
/// and tracks whether a handler already navigated away (spec §4.2, §4.5:
/// "if `navigated` is still false, re-render the parent page").
pub type ElementHost = Arc<dyn UiHost>;

/// Runs `body`, then re-renders the owning page unless `body` navigated
/// away — the pattern every clickable element follows (spec §4.5 Command,
/// and by extension Open/Checkbox/Switch/etc.).
pub async fn run_click_then_maybe_rerender<F, Fut>(host: &ElementHost, body: F)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    host.set_navigated(false);
    body().await;
    if !host.navigated() {
        let _ = host.refresh().await;
    }
}

/// A pagination host `NavigatePanel` can drive directly — implemented by
/// `Card` and `AutoCard` (spec §4.5 NavigatePanel: "driving ... a bound
/// target Card, looked up via `component(target)`").
pub trait PaginatedTarget: Send + Sync {
    fn next_page(&self) -> bool;
    fn prev_page(&self) -> bool;
    fn go_to_page(&self, index: i64);
    fn current_page(&self) -> usize;
    fn page_count(&self) -> usize;
}

/// Live, mutable interactive component (spec §4.4 common protocol).
pub trait MenuElement: Send + Sync {
    fn id(&self) -> &str;
    fn row_index(&self) -> usize;
    fn hidden(&self, ctx: &ComponentContext) -> bool;

    /// Exposes the shared base so `ComponentFactory` can freeze a `v-for`
    /// iteration's props/loop vars generically, without knowing the
    /// concrete element type (spec §4.4, §8 `v-for` closure property).
    fn base(&self) -> &Arc<ElementBase>;

    /// Renders this element's current state into 0..N keyboard buttons.
    /// Implementations MUST clear previously-owned tokens first (spec §5).
    fn build(&self, ctx: &ComponentContext, registry: &CallbackRegistry) -> Vec<Button>;

    fn dispose(&self, registry: &CallbackRegistry);

    /// `Split` (spec §4.5) emits zero buttons but still forces a keyboard
    /// row break at its position; keyboard assembly (`botui-runtime`) calls
    /// this to tell "no buttons here" apart from "an explicit row break
    /// here" when grouping by `row_index`.
    fn is_split(&self) -> bool {
        false
    }

    /// Lets a modal element claim the page's message/keyboard for the
    /// duration of its expanded state (spec §4.5, see `crate::modal`).
    /// Only `RadioModal`/`CheckboxModal` override this.
    fn as_overlay(&self) -> Option<&dyn crate::modal::PageOverlay> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botui_core::model::{AttributeSets, ElementNode};

    fn def_with(statics: &[(&str, &str)], binds: &[(&str, &str)]) -> ComponentDefinition {
        let mut attrs = AttributeSets::default();
        for (k, v) in statics {
            attrs.statics.insert((*k).to_string(), (*v).to_string());
        }
        for (k, v) in binds {
            attrs.binds.insert((*k).to_string(), (*v).to_string());
        }
        ComponentDefinition { attrs, ..ComponentDefinition::new("command") }
    }

    #[test]
    fn duplicate_prop_source_is_an_error() {
        let def = def_with(&[("title", "Hi")], &[("title", "self.title")]);
        let known = [PropSource::with_text_fallback("title")];
        let err = ElementBase::apply_definition(&known, &def).unwrap_err();
        assert!(matches!(err, PageError::DuplicatePropSource { .. }));
    }

    #[test]
    fn inner_text_fallback_only_applies_to_title() {
        let mut def = ComponentDefinition::new("command");
        def.element = ElementNode { tag: "command".into(), text: "Click".into(), ..Default::default() };
        let known = [PropSource::with_text_fallback("title")];
        let base = ElementBase::apply_definition(&known, &def).unwrap();
        assert_eq!(base.get_raw_prop("title"), Some("Click".to_string()));
    }

    #[test]
    fn plain_attribute_prop_is_not_inner_text() {
        let def = def_with(&[("title", "Static title")], &[]);
        let known = [PropSource::with_text_fallback("title")];
        let base = ElementBase::apply_definition(&known, &def).unwrap();
        assert_eq!(base.get_raw_prop("title"), Some("Static title".to_string()));
    }
}
