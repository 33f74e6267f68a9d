//! `Command`: a single button (spec §4.5).

use std::sync::Arc;

use rhai::Dynamic;

use botui_callback::{CallbackInvocation, CallbackRegistry};
use botui_core::error::PageError;
use botui_core::model::ComponentDefinition;
use botui_script::ComponentContext;

use crate::button::Button;
use crate::element::{
    ElementBase, ElementHost, MenuElement, NativeClickHandler, PropSource, run_click_then_maybe_rerender,
};

const PROPS: &[PropSource] = &[PropSource::with_text_fallback("title")];

pub struct Command {
    base: Arc<ElementBase>,
    native_on_click: Option<NativeClickHandler>,
    script: Arc<botui_script::ScriptContext>,
    host: ElementHost,
}

impl Command {
    pub fn new(
        def: &ComponentDefinition,
        script: Arc<botui_script::ScriptContext>,
        host: ElementHost,
        native_on_click: Option<NativeClickHandler>,
    ) -> Result<Self, PageError> {
        Ok(Self { base: Arc::new(ElementBase::apply_definition(PROPS, def)?), native_on_click, script, host })
    }
}

impl MenuElement for Command {
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
        let title = self.base.get_prop("title", ctx, "");
        let columns = self.base.columns(ctx, 1);

        let base = self.base.clone();
        let native = self.native_on_click.clone();
        let script = self.script.clone();
        let host = self.host.clone();
        let token = registry.subscribe(Arc::new(move |invocation: CallbackInvocation| {
            let base = base.clone();
            let native = native.clone();
            let script = script.clone();
            let host = host.clone();
            Box::pin(async move {
                run_click_then_maybe_rerender(&host, || async {
                    if let Some(native) = &native {
                        native().await;
                    }
                    if let Some(Err(e)) = base.invoke_event(
                        "click",
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
        vec![Button::callback(title, token, self.row_index(), columns)]
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        self.base.clear_tokens(registry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botui_core::log::CapturingSink;
    use botui_core::model::AttributeSets;
    use botui_script::{ScriptContext, ScriptError, UiHost, UserHost};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

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

    fn invocation() -> CallbackInvocation {
        CallbackInvocation { query_id: "q1".into(), token: String::new(), message_id: 1, chat_id: 1 }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn click_rerenders_when_handler_does_not_navigate() {
        let ui: Arc<RecordingUi> = Arc::new(RecordingUi { refreshed: AtomicBool::new(false) });
        let script = Arc::new(ScriptContext::new(ui.clone(), Arc::new(NoopUser), Arc::new(CapturingSink::new())));
        let registry = CallbackRegistry::new("s1");

        let mut attrs = AttributeSets::default();
        attrs.statics.insert("title".into(), "Click me".into());
        let def = ComponentDefinition { attrs, ..ComponentDefinition::new("command") };

        let command = Command::new(&def, script.clone(), ui.clone(), None).unwrap();
        let ctx = ComponentContext::new(&script);
        let buttons = command.build(&ctx, &registry);
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].text, "Click me");

        let token = match &buttons[0].action {
            crate::button::ButtonAction::Callback(t) => t.clone(),
            _ => panic!("expected callback button"),
        };
        let mut inv = invocation();
        inv.token = token;
        assert!(registry.invoke(inv).await);
        assert!(ui.refreshed.load(Ordering::SeqCst));
    }
}
