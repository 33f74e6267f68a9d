//! `RadioModal` / `CheckboxModal` (spec §4.5): a single button that, on
//! click, "transitions the current message to a temporary sub-page"
//! listing its options; each option may carry its own `{message,
//! webPreview}`; closing via the modal's own back button returns to the
//! collapsed summary.
//!
//! Elements never depend upward on `botui-runtime`, so the "becomes the
//! whole page" behaviour is expressed through [`PageOverlay`]: when a
//! modal is expanded it reports `takes_over_keyboard() == true` and an
//! optional `message_override()`. `ScriptPage::render` (in `botui-runtime`)
//! checks every visible top-level element for this and, if one claims the
//! overlay, renders only that element's buttons and its message override
//! instead of the page's own components/message for that render — this is
//! the concrete mechanism behind spec §4.5's "temporary sub-page", decided
//! in DESIGN.md rather than introducing a second `PageHandle` layer here.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use botui_callback::{CallbackInvocation, CallbackRegistry};
use botui_core::error::PageError;
use botui_core::model::{ComponentDefinition, ElementNode};
use botui_script::{ComponentContext, ScriptContext};

use crate::button::Button;
use crate::element::{ElementBase, ElementHost, MenuElement, PropSource, run_click_then_maybe_rerender};

const PROPS: &[PropSource] = &[PropSource::new("title"), PropSource::new("selected"), PropSource::new("prompt")];

/// One option inside a modal: its own title, optional per-option message
/// body, and whether that message should render a link preview.
#[derive(Debug, Clone)]
pub struct ModalOption {
    pub id: String,
    pub title_template: String,
    pub message_template: Option<String>,
    pub web_preview: bool,
}

fn parse_modal_options(element: &ElementNode) -> Vec<ModalOption> {
    element
        .children_named("option")
        .map(|node| {
            let id = node.attributes.get("id").cloned().unwrap_or_else(|| node.text.trim().to_string());
            let title_template = if !node.text.trim().is_empty() {
                node.text.clone()
            } else {
                node.attributes.get("title").cloned().unwrap_or_default()
            };
            let message_template = node.attributes.get("message").cloned();
            let web_preview = node.attributes.get("webPreview").map(|v| v == "true").unwrap_or(false);
            ModalOption { id, title_template, message_template, web_preview }
        })
        .collect()
}

/// Consulted by `botui-runtime`'s `ScriptPage::render` after building a
/// page's keyboard (see module docs).
pub trait PageOverlay: Send + Sync {
    fn message_override(&self, ctx: &ComponentContext) -> Option<String>;
    fn takes_over_keyboard(&self, ctx: &ComponentContext) -> bool;
}

struct ModalCore {
    base: Arc<ElementBase>,
    options: Vec<ModalOption>,
    expanded: Arc<Mutex<bool>>,
    #[allow(dead_code)]
    script: Arc<ScriptContext>,
    host: ElementHost,
}

impl ModalCore {
    fn new(def: &ComponentDefinition, script: Arc<ScriptContext>, host: ElementHost) -> Result<Self, PageError> {
        let options = parse_modal_options(&def.element);
        if options.is_empty() {
            return Err(PageError::EmptyOptionList { component_id: def.id.clone().unwrap_or_default() });
        }
        Ok(Self {
            base: Arc::new(ElementBase::apply_definition(PROPS, def)?),
            options,
            expanded: Arc::new(Mutex::new(false)),
            script,
            host,
        })
    }

    fn is_expanded(&self) -> bool {
        *self.expanded.lock().unwrap()
    }

    fn option(&self, id: &str) -> Option<&ModalOption> {
        self.options.iter().find(|o| o.id == id)
    }

    fn prompt(&self, ctx: &ComponentContext) -> Option<String> {
        self.base.get_raw_prop("prompt").map(|t| ctx.render(&t))
    }

    fn back_button(&self, row: usize, registry: &CallbackRegistry) -> Button {
        let host = self.host.clone();
        let expanded = self.expanded.clone();
        let token = registry.subscribe(Arc::new(move |_inv: CallbackInvocation| {
            let host = host.clone();
            let expanded = expanded.clone();
            Box::pin(async move {
                run_click_then_maybe_rerender(&host, || async {
                    *expanded.lock().unwrap() = false;
                })
                .await;
            })
        }));
        self.base.own_token(token.clone());
        Button::callback("\u{2b05}\u{fe0f} Back", token, row, 1)
    }
}

/// Single-select modal (spec §4.5).
pub struct RadioModal {
    core: ModalCore,
    selected_id: Arc<Mutex<Option<String>>>,
}

impl RadioModal {
    pub fn new(def: &ComponentDefinition, script: Arc<ScriptContext>, host: ElementHost) -> Result<Self, PageError> {
        let core = ModalCore::new(def, script, host)?;
        let initial = core.options.first().map(|o| o.id.clone());
        Ok(Self { core, selected_id: Arc::new(Mutex::new(initial)) })
    }

    pub fn select(&self, id: impl Into<String>) {
        *self.selected_id.lock().unwrap() = Some(id.into());
    }

    pub fn selected(&self) -> Option<String> {
        self.selected_id.lock().unwrap().clone()
    }

    fn sync_from_binding(&self, ctx: &ComponentContext) {
        if !self.core.base.has_prop_source("selected") {
            return;
        }
        let rendered = self.core.base.get_prop("selected", ctx, "");
        if !rendered.trim().is_empty() {
            self.select(rendered.trim().to_string());
        }
    }

    fn summary_label(&self, ctx: &ComponentContext) -> String {
        let label = self.core.base.get_prop("title", ctx, "");
        let selected_title = self
            .selected()
            .and_then(|id| self.core.option(&id).map(|o| ctx.render(&o.title_template)))
            .unwrap_or_default();
        if label.is_empty() { selected_title } else { format!("{label}: {selected_title}") }
    }

    fn selected_message(&self, ctx: &ComponentContext) -> Option<String> {
        let id = self.selected()?;
        let option = self.core.option(&id)?;
        let template = option.message_template.as_ref()?;
        Some(ctx.render(template))
    }
}

impl MenuElement for RadioModal {
    fn id(&self) -> &str {
        &self.core.base.id
    }

    fn row_index(&self) -> usize {
        self.core.base.row_index()
    }

    fn hidden(&self, ctx: &ComponentContext) -> bool {
        self.core.base.hidden(ctx)
    }

    fn base(&self) -> &Arc<ElementBase> {
        &self.core.base
    }

    fn build(&self, ctx: &ComponentContext, registry: &CallbackRegistry) -> Vec<Button> {
        self.core.base.clear_tokens(registry);
        self.sync_from_binding(ctx);
        let row = self.row_index();

        if !self.core.is_expanded() {
            let label = self.summary_label(ctx);
            let host = self.core.host.clone();
            let expanded = self.core.expanded.clone();
            let token = registry.subscribe(Arc::new(move |_inv: CallbackInvocation| {
                let host = host.clone();
                let expanded = expanded.clone();
                Box::pin(async move {
                    run_click_then_maybe_rerender(&host, || async {
                        *expanded.lock().unwrap() = true;
                    })
                    .await;
                })
            }));
            self.core.base.own_token(token.clone());
            vec![Button::callback(label, token, row, 1)]
        } else {
            let mut buttons = Vec::with_capacity(self.core.options.len() + 1);
            for option in &self.core.options {
                let title = ctx.render(&option.title_template);
                let checked = self.selected().as_deref() == Some(option.id.as_str());
                let prefix = if checked { "\u{2705} " } else { "" };
                let label = format!("{prefix}{title}");

                let host = self.core.host.clone();
                let option_id = option.id.clone();
                let selected_id = self.selected_id.clone();
                let token = registry.subscribe(Arc::new(move |_inv: CallbackInvocation| {
                    let host = host.clone();
                    let option_id = option_id.clone();
                    let selected_id = selected_id.clone();
                    Box::pin(async move {
                        run_click_then_maybe_rerender(&host, || async {
                            *selected_id.lock().unwrap() = Some(option_id.clone());
                        })
                        .await;
                    })
                }));
                self.core.base.own_token(token.clone());
                buttons.push(Button::callback(label, token, row, 1));
            }
            buttons.push(self.core.back_button(row + 1, registry));
            buttons
        }
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        self.core.base.clear_tokens(registry);
    }

    fn as_overlay(&self) -> Option<&dyn PageOverlay> {
        Some(self)
    }
}

impl PageOverlay for RadioModal {
    fn message_override(&self, ctx: &ComponentContext) -> Option<String> {
        if self.core.is_expanded() {
            self.core.prompt(ctx)
        } else {
            self.selected_message(ctx)
        }
    }

    fn takes_over_keyboard(&self, _ctx: &ComponentContext) -> bool {
        self.core.is_expanded()
    }
}

/// Multi-select modal (spec §4.5): same collapsed/expanded shape as
/// [`RadioModal`] but toggles a set of ids, mirroring `CheckboxList`.
pub struct CheckboxModal {
    core: ModalCore,
    selected_ids: Arc<Mutex<HashSet<String>>>,
}

impl CheckboxModal {
    pub fn new(def: &ComponentDefinition, script: Arc<ScriptContext>, host: ElementHost) -> Result<Self, PageError> {
        let core = ModalCore::new(def, script, host)?;
        Ok(Self { core, selected_ids: Arc::new(Mutex::new(HashSet::new())) })
    }

    pub fn toggle(&self, id: &str) {
        let mut ids = self.selected_ids.lock().unwrap();
        if !ids.remove(id) {
            ids.insert(id.to_string());
        }
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.selected_ids.lock().unwrap().contains(id)
    }

    fn sync_from_binding(&self, ctx: &ComponentContext) {
        if !self.core.base.has_prop_source("selected") {
            return;
        }
        let rendered = self.core.base.get_prop("selected", ctx, "");
        let mut ids = self.selected_ids.lock().unwrap();
        ids.clear();
        for id in rendered.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
            ids.insert(id.to_string());
        }
    }

    fn summary_label(&self, ctx: &ComponentContext) -> String {
        let label = self.core.base.get_prop("title", ctx, "");
        let count = self.selected_ids.lock().unwrap().len();
        if label.is_empty() { format!("{count} selected") } else { format!("{label} ({count})") }
    }
}

impl MenuElement for CheckboxModal {
    fn id(&self) -> &str {
        &self.core.base.id
    }

    fn row_index(&self) -> usize {
        self.core.base.row_index()
    }

    fn hidden(&self, ctx: &ComponentContext) -> bool {
        self.core.base.hidden(ctx)
    }

    fn base(&self) -> &Arc<ElementBase> {
        &self.core.base
    }

    fn build(&self, ctx: &ComponentContext, registry: &CallbackRegistry) -> Vec<Button> {
        self.core.base.clear_tokens(registry);
        self.sync_from_binding(ctx);
        let row = self.row_index();

        if !self.core.is_expanded() {
            let label = self.summary_label(ctx);
            let host = self.core.host.clone();
            let expanded = self.core.expanded.clone();
            let token = registry.subscribe(Arc::new(move |_inv: CallbackInvocation| {
                let host = host.clone();
                let expanded = expanded.clone();
                Box::pin(async move {
                    run_click_then_maybe_rerender(&host, || async {
                        *expanded.lock().unwrap() = true;
                    })
                    .await;
                })
            }));
            self.core.base.own_token(token.clone());
            vec![Button::callback(label, token, row, 1)]
        } else {
            let mut buttons = Vec::with_capacity(self.core.options.len() + 1);
            for option in &self.core.options {
                let title = ctx.render(&option.title_template);
                let prefix = if self.is_checked(&option.id) { "\u{2705} " } else { "" };
                let label = format!("{prefix}{title}");

                let host = self.core.host.clone();
                let option_id = option.id.clone();
                let selected_ids = self.selected_ids.clone();
                let token = registry.subscribe(Arc::new(move |_inv: CallbackInvocation| {
                    let host = host.clone();
                    let option_id = option_id.clone();
                    let selected_ids = selected_ids.clone();
                    Box::pin(async move {
                        run_click_then_maybe_rerender(&host, || async {
                            let mut ids = selected_ids.lock().unwrap();
                            if !ids.remove(&option_id) {
                                ids.insert(option_id.clone());
                            }
                        })
                        .await;
                    })
                }));
                self.core.base.own_token(token.clone());
                buttons.push(Button::callback(label, token, row, 1));
            }
            buttons.push(self.core.back_button(row + 1, registry));
            buttons
        }
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        self.core.base.clear_tokens(registry);
    }

    fn as_overlay(&self) -> Option<&dyn PageOverlay> {
        Some(self)
    }
}

impl PageOverlay for CheckboxModal {
    fn message_override(&self, ctx: &ComponentContext) -> Option<String> {
        if self.core.is_expanded() {
            self.core.prompt(ctx)
        } else {
            None
        }
    }

    fn takes_over_keyboard(&self, _ctx: &ComponentContext) -> bool {
        self.core.is_expanded()
    }
}
