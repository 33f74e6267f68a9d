//! `Switch` (spec §4.5): one button cycling an ordered option list.

use std::sync::{Arc, Mutex};

use rhai::Dynamic;

use botui_callback::{CallbackInvocation, CallbackRegistry};
use botui_core::error::PageError;
use botui_core::model::ComponentDefinition;
use botui_script::{ComponentContext, ScriptContext, ScriptError};

use crate::button::Button;
use crate::control::ScriptControllable;
use crate::element::{ElementBase, ElementHost, MenuElement, OptionSpec, PropSource, parse_options, run_click_then_maybe_rerender};

const PROPS: &[PropSource] = &[PropSource::new("title")];

pub struct Switch {
    base: Arc<ElementBase>,
    options: Vec<OptionSpec>,
    title_template: String,
    index: Arc<Mutex<usize>>,
    script: Arc<ScriptContext>,
    host: ElementHost,
}

impl Switch {
    pub fn new(def: &ComponentDefinition, script: Arc<ScriptContext>, host: ElementHost) -> Result<Self, PageError> {
        let options = parse_options(&def.element);
        if options.is_empty() {
            return Err(PageError::EmptyOptionList { component_id: def.id.clone().unwrap_or_default() });
        }
        let base = Arc::new(ElementBase::apply_definition(PROPS, def)?);
        let title_template = base
            .get_raw_prop("title")
            .unwrap_or_else(|| "{{ self.title }}".to_string());
        Ok(Self { base, options, title_template, index: Arc::new(Mutex::new(0)), script, host })
    }

    pub fn cycle_next(&self) -> usize {
        let mut idx = self.index.lock().unwrap();
        *idx = (*idx + 1) % self.options.len();
        *idx
    }

    pub fn cycle_to(&self, id: &str) {
        if let Some(pos) = self.options.iter().position(|o| o.id == id) {
            *self.index.lock().unwrap() = pos;
        }
    }

    pub fn current_index(&self) -> usize {
        *self.index.lock().unwrap()
    }

    fn self_map(&self, index: usize) -> Dynamic {
        let option = &self.options[index];
        let mut m = rhai::Map::new();
        m.insert("id".into(), Dynamic::from(option.id.clone()));
        m.insert("title".into(), Dynamic::from(option.title_template.clone()));
        m.insert("index".into(), Dynamic::from(index as i64));
        m.insert("count".into(), Dynamic::from(self.options.len() as i64));
        Dynamic::from_map(m)
    }
}

impl MenuElement for Switch {
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
        let columns = self.base.columns(ctx, 1);
        let index = self.current_index();

        let mut local_ctx = ctx.clone();
        local_ctx.set_self(self.self_map(index));
        let title = local_ctx.render(&self.title_template);

        let base = self.base.clone();
        let script = self.script.clone();
        let host = self.host.clone();
        let index_cell = self.index.clone();
        let option_count = self.options.len();
        let token = registry.subscribe(Arc::new(move |invocation: CallbackInvocation| {
            let base = base.clone();
            let script = script.clone();
            let host = host.clone();
            let index_cell = index_cell.clone();
            Box::pin(async move {
                run_click_then_maybe_rerender(&host, || async {
                    {
                        let mut idx = index_cell.lock().unwrap();
                        *idx = (*idx + 1) % option_count;
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
        vec![Button::callback(title, token, self.row_index(), columns)]
    }

    fn dispose(&self, registry: &CallbackRegistry) {
        self.base.clear_tokens(registry);
    }
}

impl ScriptControllable for Switch {
    fn invoke_method(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic, ScriptError> {
        match method {
            "cycleNext" => {
                self.cycle_next();
                Ok(Dynamic::UNIT)
            }
            "cycleTo" => {
                let id = args
                    .first()
                    .cloned()
                    .and_then(|d| d.into_string().ok())
                    .ok_or_else(|| ScriptError::Host("cycleTo requires an id".into()))?;
                self.cycle_to(&id);
                Ok(Dynamic::UNIT)
            }
            other => Err(ScriptError::Host(format!("Switch has no method '{other}'"))),
        }
    }
}
