//! `CheckboxList` (spec §4.5): multi-select over a parsed `<option>` list.

use std::collections::HashSet;
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

pub struct CheckboxList {
    base: Arc<ElementBase>,
    options: Vec<OptionSpec>,
    selected_ids: Arc<Mutex<HashSet<String>>>,
    script: Arc<ScriptContext>,
    host: ElementHost,
}

impl CheckboxList {
    pub fn new(def: &ComponentDefinition, script: Arc<ScriptContext>, host: ElementHost) -> Result<Self, PageError> {
        Ok(Self {
            base: Arc::new(ElementBase::apply_definition(PROPS, def)?),
            options: parse_options(&def.element),
            selected_ids: Arc::new(Mutex::new(HashSet::new())),
            script,
            host,
        })
    }

    pub fn toggle(&self, id: &str) {
        let mut ids = self.selected_ids.lock().unwrap();
        if !ids.remove(id) {
            ids.insert(id.to_string());
        }
    }

    pub fn set_checked(&self, id: &str, checked: bool) {
        let mut ids = self.selected_ids.lock().unwrap();
        if checked {
            ids.insert(id.to_string());
        } else {
            ids.remove(id);
        }
    }

    pub fn set_checked_many(&self, ids: impl IntoIterator<Item = String>) {
        *self.selected_ids.lock().unwrap() = ids.into_iter().collect();
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.selected_ids.lock().unwrap().contains(id)
    }

    fn sync_from_binding(&self, ctx: &ComponentContext) {
        if !self.base.has_prop_source("selected") {
            return;
        }
        let rendered = self.base.get_prop("selected", ctx, "");
        let ids: HashSet<String> = rendered
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        *self.selected_ids.lock().unwrap() = ids;
    }
}

impl MenuElement for CheckboxList {
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
            let prefix = if self.is_checked(&option.id) { "\u{2705} " } else { "" };
            let label = format!("{prefix}{title}");

            let base = self.base.clone();
            let script = self.script.clone();
            let host = self.host.clone();
            let selected_ids = self.selected_ids.clone();
            let option_id = option.id.clone();
            let token = registry.subscribe(Arc::new(move |invocation: CallbackInvocation| {
                let base = base.clone();
                let script = script.clone();
                let host = host.clone();
                let selected_ids = selected_ids.clone();
                let option_id = option_id.clone();
                Box::pin(async move {
                    run_click_then_maybe_rerender(&host, || async {
                        {
                            let mut ids = selected_ids.lock().unwrap();
                            if !ids.remove(&option_id) {
                                ids.insert(option_id.clone());
                            }
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
            buttons.push(Button::callback(label, token, self.row_index(), columns));
        }
        buttons
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        self.base.clear_tokens(registry);
    }
}

impl ScriptControllable for CheckboxList {
    fn invoke_method(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic, ScriptError> {
        match (method, args.len()) {
            ("toggle", 1) => {
                let id = args[0].clone().into_string().map_err(|e| ScriptError::Host(e.to_string()))?;
                self.toggle(&id);
                Ok(Dynamic::UNIT)
            }
            ("setChecked", 2) => {
                let id = args[0].clone().into_string().map_err(|e| ScriptError::Host(e.to_string()))?;
                let checked = args[1].as_bool().unwrap_or(false);
                self.set_checked(&id, checked);
                Ok(Dynamic::UNIT)
            }
            ("setChecked", 1) => {
                if let Ok(array) = args[0].clone().into_array() {
                    let ids = array.into_iter().filter_map(|d| d.into_string().ok());
                    self.set_checked_many(ids);
                } else if let Ok(id) = args[0].clone().into_string() {
                    self.set_checked(&id, true);
                }
                Ok(Dynamic::UNIT)
            }
            (other, _) => Err(ScriptError::Host(format!("CheckboxList has no method '{other}'"))),
        }
    }
}
