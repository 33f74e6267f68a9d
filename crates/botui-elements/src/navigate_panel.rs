//! `NavigatePanel` (spec §4.5): `prev` / counter / `next`, driving either a
//! bound target `Card`/`AutoCard` or an `onPageChange(int)` callback.

use std::sync::{Arc, Mutex};

use rhai::Dynamic;

use botui_callback::{CallbackInvocation, CallbackRegistry};
use botui_core::error::PageError;
use botui_core::model::ComponentDefinition;
use botui_script::{ComponentContext, ScriptContext};

use crate::button::Button;
use crate::element::{ElementBase, ElementHost, MenuElement, PaginatedTarget, PropSource, run_click_then_maybe_rerender};

const PROPS: &[PropSource] = &[
    PropSource::new("counterTemplate"),
    PropSource::new("boundaryMessage"),
    PropSource::new("pageCount"),
];

/// Where page-change actions land: a directly bound pagination target, or
/// an `onPageChange(int)` callback the panel invokes itself while tracking
/// its own `currentPage` (spec §4.5 NavigatePanel).
pub enum NavigateTarget {
    Bound(Arc<dyn PaginatedTarget>),
    Callback,
}

pub struct NavigatePanel {
    base: Arc<ElementBase>,
    target: NavigateTarget,
    carousel: bool,
    hide_boundary: bool,
    /// (current, count) used only in `Callback` mode, where there's no
    /// bound target to ask. `Arc`-wrapped so the click closure can share it
    /// directly rather than rebuilding the element.
    local_state: Arc<Mutex<(usize, usize)>>,
    script: Arc<ScriptContext>,
    host: ElementHost,
}

fn clone_target(target: &NavigateTarget) -> NavigateTarget {
    match target {
        NavigateTarget::Bound(t) => NavigateTarget::Bound(t.clone()),
        NavigateTarget::Callback => NavigateTarget::Callback,
    }
}

impl NavigatePanel {
    pub fn new(
        def: &ComponentDefinition,
        target: NavigateTarget,
        carousel: bool,
        hide_boundary: bool,
        script: Arc<ScriptContext>,
        host: ElementHost,
    ) -> Result<Self, PageError> {
        let base = Arc::new(ElementBase::apply_definition(PROPS, def)?);
        Ok(Self { base, target, carousel, hide_boundary, local_state: Arc::new(Mutex::new((0, 1))), script, host })
    }

    fn counter_text(&self, ctx: &ComponentContext, current: usize, count: usize) -> String {
        let template = self
            .base
            .get_raw_prop("counterTemplate")
            .unwrap_or_else(|| "{{ self.currentPage + 1 }}/{{ self.count }}".to_string());
        let mut m = rhai::Map::new();
        m.insert("currentPage".into(), Dynamic::from(current as i64));
        m.insert("pageCount".into(), Dynamic::from(count as i64));
        let mut local_ctx = ctx.clone();
        local_ctx.set_self(Dynamic::from_map(m));
        local_ctx.render(&template)
    }

    fn boundary_toast(&self, ctx: &ComponentContext) -> Option<String> {
        self.base.get_raw_prop("boundaryMessage").map(|t| ctx.render(&t))
    }

    async fn step(&self, forward: bool, ctx: &ComponentContext) {
        match &self.target {
            NavigateTarget::Bound(target) => {
                let moved = if forward {
                    if target.next_page() {
                        true
                    } else if self.carousel {
                        target.go_to_page(0);
                        true
                    } else {
                        false
                    }
                } else if target.prev_page() {
                    true
                } else if self.carousel {
                    target.go_to_page(target.page_count() as i64 - 1);
                    true
                } else {
                    false
                };
                if !moved {
                    if let Some(msg) = self.boundary_toast(ctx) {
                        let _ = self.host.toast(&msg).await;
                    }
                }
            }
            NavigateTarget::Callback => {
                let count = self.base.get_raw_prop("pageCount").map(|_| self.base.get_prop("pageCount", ctx, "1")).and_then(|s| s.trim().parse::<usize>().ok()).unwrap_or(1).max(1);
                let new_index = {
                    let mut state = self.local_state.lock().unwrap();
                    state.1 = count;
                    let (current, count) = *state;
                    let moved = if forward {
                        if current + 1 < count {
                            Some(current + 1)
                        } else if self.carousel {
                            Some(0)
                        } else {
                            None
                        }
                    } else if current > 0 {
                        Some(current - 1)
                    } else if self.carousel {
                        Some(count - 1)
                    } else {
                        None
                    };
                    if let Some(next) = moved {
                        state.0 = next;
                    }
                    moved
                };
                match new_index {
                    Some(index) => {
                        if let Some(Err(e)) =
                            self.base.invoke_event("pageChange", Dynamic::from(index as i64), None, &self.script)
                        {
                            self.script.route_error(&e);
                        }
                    }
                    None => {
                        if let Some(msg) = self.boundary_toast(ctx) {
                            let _ = self.host.toast(&msg).await;
                        }
                    }
                }
            }
        }
    }
}

impl MenuElement for NavigatePanel {
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
        self.base.clear_tokens(registry);
        let row = self.row_index();

        let (current, count) = match &self.target {
            NavigateTarget::Bound(target) => (target.current_page(), target.page_count().max(1)),
            NavigateTarget::Callback => *self.local_state.lock().unwrap(),
        };
        let at_start = current == 0;
        let at_end = current + 1 >= count;

        let mut buttons = Vec::with_capacity(3);

        if !(self.hide_boundary && at_start && !self.carousel) {
            buttons.push(self.make_button(false, "\u{2b05}\u{fe0f}", row, registry));
        }
        buttons.push(Button::callback(self.counter_text(ctx, current, count), "__navpanel_noop".to_string(), row, 3));
        if !(self.hide_boundary && at_end && !self.carousel) {
            buttons.push(self.make_button(true, "\u{27a1}\u{fe0f}", row, registry));
        }
        buttons
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        self.base.clear_tokens(registry);
    }
}

impl NavigatePanel {
    fn make_button(&self, forward: bool, label: &str, row: usize, registry: &CallbackRegistry) -> Button {
        let host = self.host.clone();
        let script = self.script.clone();
        let base = self.base.clone();
        let target = clone_target(&self.target);
        let carousel = self.carousel;
        let hide_boundary = self.hide_boundary;
        let local_state = self.local_state.clone();
        let token = registry.subscribe(Arc::new(move |_invocation: CallbackInvocation| {
            let panel = NavigatePanel {
                base: base.clone(),
                target: clone_target(&target),
                carousel,
                hide_boundary,
                local_state: local_state.clone(),
                script: script.clone(),
                host: host.clone(),
            };
            Box::pin(async move {
                let ctx = ComponentContext::new(&panel.script);
                let host = panel.host.clone();
                run_click_then_maybe_rerender(&host, || async {
                    panel.step(forward, &ctx).await;
                })
                .await;
            })
        }));
        self.base.own_token(token.clone());
        Button::callback(label, token, row, 3)
    }
}
