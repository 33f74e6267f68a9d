//! `Checkbox` (spec §4.5): a toggled boolean button.
//!
//! Selected-state lives behind its own small `Mutex` (spec §5: "each
//! Checkbox/Switch/CheckboxList guards its own selected-state field ... so
//! a click and a programmatic mutation cannot interleave torn reads") and
//! is `Arc`-wrapped so the registered click closure can flip it without
//! needing an `Arc<Self>` receiver.

use std::sync::{Arc, Mutex};

use rhai::Dynamic;

use botui_callback::{CallbackInvocation, CallbackRegistry};
use botui_core::error::PageError;
use botui_core::model::ComponentDefinition;
use botui_script::{ComponentContext, ScriptContext, ScriptError};

use crate::button::Button;
use crate::control::ScriptControllable;
use crate::element::{ElementBase, ElementHost, MenuElement, NativeHandler, PropSource, run_click_then_maybe_rerender};

const PROPS: &[PropSource] = &[PropSource::with_text_fallback("title"), PropSource::new("selected")];

pub struct Checkbox {
    base: Arc<ElementBase>,
    selected: Arc<Mutex<bool>>,
    script: Arc<ScriptContext>,
    host: ElementHost,
    native_on_update: Option<NativeHandler>,
}

impl Checkbox {
    pub fn new(
        def: &ComponentDefinition,
        script: Arc<ScriptContext>,
        host: ElementHost,
        native_on_update: Option<NativeHandler>,
    ) -> Result<Self, PageError> {
        Ok(Self {
            base: Arc::new(ElementBase::apply_definition(PROPS, def)?),
            selected: Arc::new(Mutex::new(false)),
            script,
            host,
            native_on_update,
        })
    }

    /// `select(bool)` (spec §4.5): script/programmatic API.
    pub fn select(&self, value: bool) {
        *self.selected.lock().unwrap() = value;
    }

    /// `toggle()` (spec §4.5). Returns the new state.
    pub fn toggle(&self) -> bool {
        let mut guard = self.selected.lock().unwrap();
        *guard = !*guard;
        *guard
    }

    pub fn is_selected(&self) -> bool {
        *self.selected.lock().unwrap()
    }

    /// `:selected` one-way sync from the view-model: re-evaluated at the
    /// start of every render (spec §4.5).
    fn sync_from_binding(&self, ctx: &ComponentContext) {
        if !self.base.has_binding("selected") {
            return;
        }
        if let Some(expr) = self.base.get_raw_binding("selected") {
            if let Ok(value) = ctx.evaluate_bool(&expr) {
                self.select(value);
            }
        }
    }

    fn label(&self, ctx: &ComponentContext) -> String {
        let title = self.base.get_prop("title", ctx, "");
        let prefix = if self.is_selected() { "\u{2705} " } else { "" };
        format!("{prefix}{title}")
    }
}

impl MenuElement for Checkbox {
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
        self.sync_from_binding(ctx);

        let label = self.label(ctx);
        let columns = self.base.columns(ctx, 1);

        let base = self.base.clone();
        let script = self.script.clone();
        let host = self.host.clone();
        let native = self.native_on_update.clone();
        let selected = self.selected.clone();
        let token = registry.subscribe(Arc::new(move |invocation: CallbackInvocation| {
            let base = base.clone();
            let script = script.clone();
            let host = host.clone();
            let native = native.clone();
            let selected = selected.clone();
            Box::pin(async move {
                run_click_then_maybe_rerender(&host, || async {
                    {
                        let mut guard = selected.lock().unwrap();
                        *guard = !*guard;
                    }
                    if let Some(native) = &native {
                        native().await;
                    }
                    if let Some(Err(e)) = base.invoke_event(
                        "update",
                        Dynamic::from(invocation.query_id.clone()),
                        Some(invocation.query_id.clone()),
                        &script,
                    ) {
                        script.route_error(&e);
                    }
                })
                .await;
            })
        }));
        self.base.own_token(token.clone());
        vec![Button::callback(label, token, self.row_index(), columns)]
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        self.base.clear_tokens(registry);
    }
}

impl ScriptControllable for Checkbox {
    fn invoke_method(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic, ScriptError> {
        match method {
            "toggle" => Ok(Dynamic::from(self.toggle())),
            "select" => {
                let value = args.first().and_then(|d| d.as_bool().ok()).unwrap_or(false);
                self.select(value);
                Ok(Dynamic::UNIT)
            }
            other => Err(ScriptError::Host(format!("Checkbox has no method '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botui_core::log::CapturingSink;
    use botui_core::model::AttributeSets;
    use botui_script::{ScriptContext as Ctx, UiHost, UserHost};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct RecordingUi {
        refreshed: AtomicBool,
    }
    #[async_trait]
    impl UiHost for RecordingUi {
        async fn refresh(&self) -> Result<(), ScriptError> {
            self.refreshed.store(true, Ordering::SeqCst);
            Ok(())
        }
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

    fn checkbox() -> (Checkbox, CallbackRegistry) {
        let ui: Arc<RecordingUi> = Arc::new(RecordingUi { refreshed: AtomicBool::new(false) });
        let script = Arc::new(Ctx::new(ui.clone(), Arc::new(NoopUser), Arc::new(CapturingSink::new())));
        let mut attrs = AttributeSets::default();
        attrs.statics.insert("title".into(), "Subscribe".into());
        let def = ComponentDefinition { attrs, ..ComponentDefinition::new("checkbox") };
        (Checkbox::new(&def, script, ui, None).unwrap(), CallbackRegistry::new("s1"))
    }

    #[test]
    fn label_reflects_selected_state() {
        let (checkbox, script_holder) = checkbox();
        let _ = &script_holder;
        assert!(!checkbox.is_selected());
        checkbox.select(true);
        assert!(checkbox.is_selected());
    }

    #[test]
    fn toggle_flips_and_returns_new_state() {
        let (checkbox, _) = checkbox();
        assert!(checkbox.toggle());
        assert!(!checkbox.toggle());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn click_toggles_state_and_rerenders() {
        let ui: Arc<RecordingUi> = Arc::new(RecordingUi { refreshed: AtomicBool::new(false) });
        let script = Arc::new(Ctx::new(ui.clone(), Arc::new(NoopUser), Arc::new(CapturingSink::new())));
        let mut attrs = AttributeSets::default();
        attrs.statics.insert("title".into(), "Subscribe".into());
        let def = ComponentDefinition { attrs, ..ComponentDefinition::new("checkbox") };
        let checkbox = Checkbox::new(&def, script.clone(), ui.clone(), None).unwrap();
        let registry = CallbackRegistry::new("s1");
        let ctx = ComponentContext::new(&script);
        let buttons = checkbox.build(&ctx, &registry);
        assert_eq!(buttons[0].text, "Subscribe");

        let token = match &buttons[0].action {
            crate::button::ButtonAction::Callback(t) => t.clone(),
            _ => panic!("expected callback"),
        };
        let invocation = CallbackInvocation { query_id: "q1".into(), token, message_id: 1, chat_id: 1 };
        assert!(registry.invoke(invocation).await);
        assert!(checkbox.is_selected());
        assert!(ui.refreshed.load(Ordering::SeqCst));
    }
}
