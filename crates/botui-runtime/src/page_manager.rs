//! `PageManager` (spec §3, §4.5): owns every compiled `PageDefinition`,
//! the shared resource loader, and the registered view-model factories;
//! `build_page` is where a definition becomes a live `ScriptPage`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rhai::Dynamic;

use botui_core::error::PageError;
use botui_core::model::PageDefinition;
use botui_core::resources::ResourceLoader;
use botui_elements::{ComponentFactory, ElementHost, ElementLookup, MenuElement};
use botui_script::ScriptContext;

use crate::error::DispatchError;
use crate::host::PageRuntimeHost;
use crate::script_page::ScriptPage;
use crate::session::Session;

/// Builds a vmodel instance (a rhai `Map` with methods, spec §4.2) from its
/// registered default props merged with navigation-time overrides.
pub type VModelFactory = Arc<dyn Fn(&serde_json::Value) -> Result<Dynamic, DispatchError> + Send + Sync>;

pub struct PageManager {
    definitions: HashMap<String, Arc<PageDefinition>>,
    page_dirs: HashMap<String, PathBuf>,
    resources: Arc<dyn ResourceLoader>,
    vmodel_factories: Mutex<HashMap<String, VModelFactory>>,
}

impl PageManager {
    pub fn new(resources: Arc<dyn ResourceLoader>) -> Self {
        Self { definitions: HashMap::new(), page_dirs: HashMap::new(), resources, vmodel_factories: Mutex::new(HashMap::new()) }
    }

    /// Registers a compiled page. `page_dir` resolves the page's own
    /// `./`/`../` resource references (spec §6 resource-loader grammar).
    pub fn register_page(&mut self, definition: PageDefinition, page_dir: impl Into<PathBuf>) {
        let id = definition.id.clone();
        self.page_dirs.insert(id.clone(), page_dir.into());
        self.definitions.insert(id, Arc::new(definition));
    }

    pub fn register_vmodel(&self, type_name: impl Into<String>, factory: VModelFactory) {
        self.vmodel_factories.lock().unwrap().insert(type_name.into(), factory);
    }

    pub fn resources(&self) -> &Arc<dyn ResourceLoader> {
        &self.resources
    }

    pub fn definition(&self, page_id: &str) -> Result<Arc<PageDefinition>, DispatchError> {
        self.definitions.get(page_id).cloned().ok_or_else(|| DispatchError::UnknownPage(page_id.to_string()))
    }

    fn page_dir(&self, page_id: &str) -> PathBuf {
        self.page_dirs.get(page_id).cloned().unwrap_or_else(|| PathBuf::from("/"))
    }

    /// Groups a flat component list into `ScriptPage`'s own top-level pages
    /// (spec §3 auto-pagination, §4.5 `menuPages` override). Mirrors
    /// `ComponentFactory`'s private Card-pagination chunking by item count;
    /// this is a page-level concept, not reachable through that crate.
    fn chunk(elements: Vec<Arc<dyn MenuElement>>, max_items: Option<usize>, max_rows: Option<usize>) -> Vec<Vec<Arc<dyn MenuElement>>> {
        let limit = max_items.unwrap_or(usize::MAX).min(max_rows.unwrap_or(usize::MAX));
        if limit == usize::MAX {
            return vec![elements];
        }
        let mut pages = Vec::new();
        let mut iter = elements.into_iter();
        loop {
            let chunk: Vec<_> = (&mut iter).take(limit.max(1)).collect();
            if chunk.is_empty() {
                break;
            }
            pages.push(chunk);
        }
        if pages.is_empty() {
            pages.push(Vec::new());
        }
        pages
    }

    fn build_vmodel(&self, definition: &PageDefinition, props: &Option<serde_json::Value>) -> Result<Dynamic, DispatchError> {
        let Some(type_name) = &definition.vmodel else { return Ok(Dynamic::UNIT) };
        let factories = self.vmodel_factories.lock().unwrap();
        let factory = factories.get(type_name).cloned().ok_or_else(|| DispatchError::UnknownVModel(type_name.clone()))?;
        drop(factories);

        let mut merged = definition.vmodel_props.clone().map(serde_json::Value::Object).unwrap_or(serde_json::Value::Null);
        if let Some(overrides) = props {
            match (&mut merged, overrides) {
                (serde_json::Value::Object(base), serde_json::Value::Object(extra)) => {
                    for (k, v) in extra {
                        base.insert(k.clone(), v.clone());
                    }
                }
                _ => merged = overrides.clone(),
            }
        }
        factory(&merged)
    }

    /// Constructs a live `ScriptPage` for `page_id` (spec §4.5 build pass):
    /// a fresh `PageRuntimeHost`, a `ScriptContext` wired to it and to a
    /// shared `ComponentFactory`/`ElementLookup` pair, the page's own
    /// `script` source evaluated once, props/vmodel published, and its
    /// components built and grouped into top-level pages.
    pub async fn build_page(
        &self,
        session: &Arc<Session>,
        page_id: &str,
        props: Option<serde_json::Value>,
    ) -> Result<Arc<ScriptPage>, DispatchError> {
        let definition = self.definition(page_id)?;
        let page_dir = self.page_dir(page_id);

        let host = PageRuntimeHost::new(Arc::downgrade(session));
        let lookup: Arc<Mutex<ElementLookup>> = Arc::new(Mutex::new(ElementLookup::new()));
        let ui_host: Arc<dyn botui_script::UiHost> = host.clone();
        let user_host: Arc<dyn botui_script::UserHost> = host.clone();
        let script = Arc::new(ScriptContext::with_extensions(
            ui_host,
            user_host,
            Arc::new(SessionLogSink(Arc::downgrade(session))),
            lookup.clone(),
            botui_elements::control::register,
        ));
        script.install_console();
        script.set_lang(session.lang());

        if let Some(source) = &definition.script {
            script.execute_async(source)?;
        }

        if let Some(value) = &props {
            script.set_props(value)?;
        }
        let vmodel = self.build_vmodel(&definition, &props)?;
        script.set_vmodel(vmodel);

        let element_host: ElementHost = host.clone();
        let factory = ComponentFactory::with_lookup(script.clone(), element_host, lookup);

        let groups = if let Some(menu_pages) = &definition.menu_pages {
            let mut out = Vec::with_capacity(menu_pages.len());
            for page in menu_pages {
                out.push(factory.build_all(&page.components).map_err(page_error_at(page_id))?);
            }
            out
        } else {
            let elements = factory.build_all(&definition.components).map_err(page_error_at(page_id))?;
            Self::chunk(elements, definition.max_items, definition.max_rows)
        };

        let page = ScriptPage::new(page_id.to_string(), definition, page_dir, script.clone(), groups, host);

        for f in page.script().hooks.on_mounted.callbacks() {
            let script = page.script().clone();
            page.script().call_hook(&f, |e| script.route_error(e));
        }

        Ok(page)
    }
}

fn page_error_at(page_id: &str) -> impl FnOnce(PageError) -> DispatchError + '_ {
    move |e| {
        let _ = page_id;
        DispatchError::Page(e)
    }
}

/// Routes `console`/lifecycle-hook logging through the owning session's
/// sink without the `ScriptContext` needing a strong reference back.
struct SessionLogSink(std::sync::Weak<Session>);

impl botui_core::log::LogSink for SessionLogSink {
    fn log(&self, level: botui_core::log::Level, scope: &str, message: &str) {
        if let Some(session) = self.0.upgrade() {
            session.log(level, scope, message);
        } else {
            eprintln!("[{scope}] {message}");
        }
    }
}
