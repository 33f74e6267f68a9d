//! `Open` (spec §4.5): `type ∈ {page, link, app}`. `link` emits a URL
//! button, `app` a web-app button, `page` a callback button that either
//! edits an explicit `targetPage` in place or asks the host to navigate.

use std::sync::Arc;

use rhai::Dynamic;

use botui_callback::{CallbackInvocation, CallbackRegistry};
use botui_core::error::PageError;
use botui_core::model::ComponentDefinition;
use botui_script::{ComponentContext, ScriptContext};

use crate::button::Button;
use crate::element::{ElementBase, ElementHost, MenuElement, PropSource, run_click_then_maybe_rerender};

const PROPS: &[PropSource] = &[
    PropSource::with_text_fallback("title"),
    PropSource::new("type"),
    PropSource::new("target"),
    PropSource::new("subPage"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenKind {
    Page,
    Link,
    App,
}

impl OpenKind {
    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "link" => OpenKind::Link,
            "app" => OpenKind::App,
            _ => OpenKind::Page,
        }
    }
}

pub struct Open {
    base: Arc<ElementBase>,
    script: Arc<ScriptContext>,
    host: ElementHost,
}

impl Open {
    pub fn new(def: &ComponentDefinition, script: Arc<ScriptContext>, host: ElementHost) -> Result<Self, PageError> {
        Ok(Self { base: Arc::new(ElementBase::apply_definition(PROPS, def)?), script, host })
    }

    fn kind(&self, ctx: &ComponentContext) -> OpenKind {
        OpenKind::parse(&self.base.get_prop("type", ctx, "page"))
    }

    fn target(&self, ctx: &ComponentContext) -> String {
        self.base.get_prop("target", ctx, "")
    }

    fn sub_page(&self, ctx: &ComponentContext) -> Option<String> {
        let raw = self.base.get_prop("subPage", ctx, "");
        if raw.trim().is_empty() { None } else { Some(raw) }
    }

    fn title(&self, ctx: &ComponentContext, target: &str) -> String {
        let rendered = self.base.get_prop("title", ctx, "");
        if rendered.is_empty() { target.to_string() } else { rendered }
    }
}

impl MenuElement for Open {
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
        let target = self.target(ctx);
        let title = self.title(ctx, &target);
        let columns = self.base.columns(ctx, 1);
        let row = self.row_index();

        match self.kind(ctx) {
            OpenKind::Link => vec![Button::url(title, target, row, columns)],
            OpenKind::App => vec![Button::web_app(title, target, row, columns)],
            OpenKind::Page => {
                let base = self.base.clone();
                let script = self.script.clone();
                let host = self.host.clone();
                let sub_page = self.sub_page(ctx);
                let target_for_click = target.clone();
                let token = registry.subscribe(Arc::new(move |invocation: CallbackInvocation| {
                    let base = base.clone();
                    let script = script.clone();
                    let host = host.clone();
                    let sub_page = sub_page.clone();
                    let target = target_for_click.clone();
                    Box::pin(async move {
                        run_click_then_maybe_rerender(&host, || async {
                            if let Some(Err(e)) = base.invoke_event(
                                "click",
                                Dynamic::from(invocation.query_id.clone()),
                                Some(invocation.query_id.clone()),
                                &script,
                            ) {
                                script.route_error(&e);
                            }
                            if !host.navigated() {
                                host.set_navigated(true);
                                if let Err(e) = host.navigate(&target, sub_page.clone(), None).await {
                                    script.route_error(&e);
                                }
                            }
                        })
                        .await;
                    })
                }));
                self.base.own_token(token.clone());
                vec![Button::callback(title, token, row, columns)]
            }
        }
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
    use botui_script::{ScriptError, UiHost, UserHost};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    struct RecordingUi {
        navigated_to: StdMutex<Option<String>>,
        refreshed: AtomicBool,
        navigated: AtomicBool,
    }
    #[async_trait]
    impl UiHost for RecordingUi {
        async fn refresh(&self) -> Result<(), ScriptError> {
            self.refreshed.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn navigate(&self, id: &str, _: Option<String>, _: Option<serde_json::Value>) -> Result<(), ScriptError> {
            *self.navigated_to.lock().unwrap() = Some(id.to_string());
            Ok(())
        }
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
        fn set_navigated(&self, navigated: bool) { self.navigated.store(navigated, Ordering::SeqCst); }
        fn navigated(&self) -> bool { self.navigated.load(Ordering::SeqCst) }
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

    fn def(ty: &str, target: &str) -> ComponentDefinition {
        let mut attrs = AttributeSets::default();
        attrs.statics.insert("type".into(), ty.into());
        attrs.statics.insert("target".into(), target.into());
        ComponentDefinition { attrs, ..ComponentDefinition::new("open") }
    }

    #[test]
    fn link_kind_emits_url_button() {
        let ui: Arc<RecordingUi> = Arc::new(RecordingUi { navigated_to: StdMutex::new(None), refreshed: AtomicBool::new(false), navigated: AtomicBool::new(false) });
        let script = Arc::new(ScriptContext::new(ui.clone(), Arc::new(NoopUser), Arc::new(CapturingSink::new())));
        let open = Open::new(&def("link", "https://example.com"), script.clone(), ui).unwrap();
        let ctx = ComponentContext::new(&script);
        let registry = CallbackRegistry::new("s1");
        let buttons = open.build(&ctx, &registry);
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].action, crate::button::ButtonAction::Url("https://example.com".into()));
        assert_eq!(buttons[0].text, "https://example.com");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn page_kind_click_navigates_to_target() {
        let ui: Arc<RecordingUi> = Arc::new(RecordingUi { navigated_to: StdMutex::new(None), refreshed: AtomicBool::new(false), navigated: AtomicBool::new(false) });
        let script = Arc::new(ScriptContext::new(ui.clone(), Arc::new(NoopUser), Arc::new(CapturingSink::new())));
        let open = Open::new(&def("page", "settings"), script.clone(), ui.clone()).unwrap();
        let ctx = ComponentContext::new(&script);
        let registry = CallbackRegistry::new("s1");
        let buttons = open.build(&ctx, &registry);
        let token = match &buttons[0].action {
            crate::button::ButtonAction::Callback(t) => t.clone(),
            _ => panic!("expected callback button"),
        };
        let invocation = CallbackInvocation { query_id: "q1".into(), token, message_id: 1, chat_id: 1 };
        assert!(registry.invoke(invocation).await);
        assert_eq!(ui.navigated_to.lock().unwrap().as_deref(), Some("settings"));
        // navigate() suppresses the default re-render (host.navigated() stays true).
        assert!(!ui.refreshed.load(Ordering::SeqCst));
    }
}
