//! `Radio` (spec §4.5): single-select, parallel to `CheckboxList` but with
//! exactly one selected id (nullable-safe: `None` is a valid "nothing
//! chosen" state, spec §9 redesign flag on legacy index semantics).

use std::sync::{Arc, Mutex};

use rhai::Dynamic;

use botui_callback::{CallbackInvocation, CallbackRegistry};
use botui_core::error::PageError;
use botui_core::model::ComponentDefinition;
use botui_script::{ComponentContext, ScriptContext, ScriptError};

use crate::button::Button;
use crate::control::ScriptControllable;
use crate::element::{ElementBase, ElementHost, MenuElement, OptionSpec, PropSource, parse_options, run_click_then_maybe_rerender};

const PROPS: &[PropSource] = &[PropSource::new("selected")];

pub struct Radio {
    base: Arc<ElementBase>,
    options: Vec<OptionSpec>,
    selected_id: Arc<Mutex<Option<String>>>,
    script: Arc<ScriptContext>,
    host: ElementHost,
}

impl Radio {
    pub fn new(def: &ComponentDefinition, script: Arc<ScriptContext>, host: ElementHost) -> Result<Self, PageError> {
        Ok(Self {
            base: Arc::new(ElementBase::apply_definition(PROPS, def)?),
            options: parse_options(&def.element),
            selected_id: Arc::new(Mutex::new(None)),
            script,
            host,
        })
    }

    pub fn select(&self, id: Option<String>) {
        *self.selected_id.lock().unwrap() = id;
    }

    pub fn selected(&self) -> Option<String> {
        self.selected_id.lock().unwrap().clone()
    }

    fn sync_from_binding(&self, ctx: &ComponentContext) {
        if !self.base.has_prop_source("selected") {
            return;
        }
        let rendered = self.base.get_prop("selected", ctx, "");
        let trimmed = rendered.trim();
        self.select(if trimmed.is_empty() { None } else { Some(trimmed.to_string()) });
    }
}

impl MenuElement for Radio {
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
        let columns = self.base.columns(ctx, self.options.len().max(1));

        let mut buttons = Vec::with_capacity(self.options.len());
        for option in &self.options {
            let title = ctx.render(&option.title_template);
            let prefix = if self.selected().as_deref() == Some(option.id.as_str()) { "\u{2705} " } else { "" };
            let label = format!("{prefix}{title}");

            let base = self.base.clone();
            let script = self.script.clone();
            let host = self.host.clone();
            let selected_id = self.selected_id.clone();
            let option_id = option.id.clone();
            let token = registry.subscribe(Arc::new(move |invocation: CallbackInvocation| {
                let base = base.clone();
                let script = script.clone();
                let host = host.clone();
                let selected_id = selected_id.clone();
                let option_id = option_id.clone();
                Box::pin(async move {
                    run_click_then_maybe_rerender(&host, || async {
                        *selected_id.lock().unwrap() = Some(option_id.clone());
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
            buttons.push(Button::callback(label, token, self.row_index(), columns));
        }
        buttons
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        self.base.clear_tokens(registry);
    }
}

impl ScriptControllable for Radio {
    fn invoke_method(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic, ScriptError> {
        match (method, args.len()) {
            ("select", 1) => {
                let id = args[0].clone().into_string().map_err(|e| ScriptError::Host(e.to_string()))?;
                self.select(Some(id));
                Ok(Dynamic::UNIT)
            }
            (other, _) => Err(ScriptError::Host(format!("Radio has no method '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botui_core::log::CapturingSink;
    use botui_core::model::{AttributeSets, ElementNode};
    use botui_script::{ScriptContext as Ctx, UiHost, UserHost};
    use async_trait::async_trait;

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

    fn radio() -> (Radio, Arc<ScriptContext>) {
        let ui: Arc<NoopUi> = Arc::new(NoopUi);
        let script = Arc::new(Ctx::new(ui.clone(), Arc::new(NoopUser), Arc::new(CapturingSink::new())));
        let mut def = ComponentDefinition::new("radio");
        def.element = ElementNode {
            tag: "radio".into(),
            children: vec![
                ElementNode { tag: "option".into(), attributes: [("id".to_string(), "red".to_string())].into(), text: "Red".into(), ..Default::default() },
                ElementNode { tag: "option".into(), attributes: [("id".to_string(), "green".to_string())].into(), text: "Green".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        (Radio::new(&def, script.clone(), ui).unwrap(), script)
    }

    #[test]
    fn starts_with_nothing_selected() {
        let (radio, _script) = radio();
        assert_eq!(radio.selected(), None);
    }

    #[test]
    fn select_sets_exactly_one_id() {
        let (radio, _script) = radio();
        radio.select(Some("red".to_string()));
        assert_eq!(radio.selected(), Some("red".to_string()));
        radio.select(Some("green".to_string()));
        assert_eq!(radio.selected(), Some("green".to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn click_selects_clicked_option() {
        let (radio, script) = radio();
        let registry = CallbackRegistry::new("s1");
        let ctx = ComponentContext::new(&script);
        let buttons = radio.build(&ctx, &registry);
        let token = match &buttons[1].action {
            crate::button::ButtonAction::Callback(t) => t.clone(),
            _ => panic!("expected callback"),
        };
        let invocation = CallbackInvocation { query_id: "q1".into(), token, message_id: 1, chat_id: 1 };
        assert!(registry.invoke(invocation).await);
        assert_eq!(radio.selected(), Some("green".to_string()));
    }
}
