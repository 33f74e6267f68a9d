//! The embedded script context: one `rhai::Engine` + `Scope` per
//! `ScriptPage`, its globals acting like page state for as long as the page
//! lives.
//!
//! `rhai` has no coroutines, so every sync/async method pair (`render` /
//! `renderAsync`, `execute` / `executeAsync`, ...) collapses here to one
//! behaviour: the async half blocks the calling worker thread on the host's
//! async implementation via `tokio::task::block_in_place`. Recorded as an
//! Open Question resolution in `DESIGN.md` rather than guessed silently.

use std::sync::{Arc, Mutex};

use rhai::{Dynamic, Engine, FnPtr, Scope};

use botui_core::log::{Level, LogSink};

use crate::entities::{decode_xml_entities, strip_leading_await};
use crate::error::ScriptError;
use crate::hooks::HookRegistry;
use crate::host::{UiHost, UserHost};
use crate::template_bridge::render_sync;

/// Looks up a live component by its page-unique id for the script-visible
/// `component(id)` global. Implemented by `botui-elements` so this crate
/// never depends upward on it.
pub trait ComponentLookup: Send + Sync {
    fn get(&self, id: &str) -> Option<Dynamic>;
}

struct NullComponentLookup;
impl ComponentLookup for NullComponentLookup {
    fn get(&self, _id: &str) -> Option<Dynamic> {
        None
    }
}

fn block_on<F>(fut: F) -> Result<(), Box<rhai::EvalAltResult>>
where
    F: std::future::Future<Output = Result<(), ScriptError>>,
{
    let result = tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut));
    result.map_err(|e| e.to_string().into())
}

fn to_opt_string(d: Dynamic) -> Option<String> {
    if d.is_unit() {
        None
    } else {
        d.into_string().ok()
    }
}

fn to_opt_json(d: Dynamic) -> Option<serde_json::Value> {
    if d.is_unit() {
        None
    } else {
        rhai::serde::from_dynamic::<serde_json::Value>(&d).ok()
    }
}

/// The `UI` namespace object.
#[derive(Clone)]
pub struct UiApi {
    host: Arc<dyn UiHost>,
}

impl UiApi {
    pub fn new(host: Arc<dyn UiHost>) -> Self {
        Self { host }
    }
}

/// The `User` namespace object.
#[derive(Clone)]
pub struct UserApi {
    host: Arc<dyn UserHost>,
}

impl UserApi {
    pub fn new(host: Arc<dyn UserHost>) -> Self {
        Self { host }
    }
}

/// The `Base` namespace object: current page identity.
#[derive(Clone, Debug, Default)]
pub struct BaseApi {
    pub page_id: String,
    pub title: String,
    pub parent: String,
    pub page_directory: String,
}

#[derive(Clone)]
struct ConsoleApi {
    sink: Arc<dyn LogSink>,
}

fn console_log(this: &mut ConsoleApi, msg: Dynamic) {
    this.sink.log(Level::Info, "script", &msg.to_string());
}
fn console_warn(this: &mut ConsoleApi, msg: Dynamic) {
    this.sink.log(Level::Warn, "script", &msg.to_string());
}
fn console_error(this: &mut ConsoleApi, msg: Dynamic) {
    this.sink.log(Level::Error, "script", &msg.to_string());
}

macro_rules! ui_async_pair {
    ($engine:expr, $name:literal, $func:expr) => {
        $engine.register_fn($name, $func);
        $engine.register_fn(concat!($name, "Async"), $func);
    };
}

pub struct ScriptContext {
    engine: Engine,
    scope: Mutex<Scope<'static>>,
    pub hooks: HookRegistry,
    sink: Arc<dyn LogSink>,
    lang: Mutex<String>,
    ui_host: Arc<dyn UiHost>,
    user_host: Arc<dyn UserHost>,
}

impl ScriptContext {
    pub fn new(
        ui_host: Arc<dyn UiHost>,
        user_host: Arc<dyn UserHost>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self::with_component_lookup(ui_host, user_host, sink, Arc::new(NullComponentLookup))
    }

    pub fn with_component_lookup(
        ui_host: Arc<dyn UiHost>,
        user_host: Arc<dyn UserHost>,
        sink: Arc<dyn LogSink>,
        components: Arc<dyn ComponentLookup>,
    ) -> Self {
        Self::with_extensions(ui_host, user_host, sink, components, |_engine| {})
    }

    /// Like [`Self::with_component_lookup`], but lets a downstream crate
    /// (`botui-elements`, which cannot itself own the `Engine`) register
    /// extra types/functions — e.g. the `ComponentHandle` type backing
    /// script-visible methods like `component(id).toggle()`.
    pub fn with_extensions(
        ui_host: Arc<dyn UiHost>,
        user_host: Arc<dyn UserHost>,
        sink: Arc<dyn LogSink>,
        components: Arc<dyn ComponentLookup>,
        extend: impl FnOnce(&mut Engine),
    ) -> Self {
        let mut engine = Engine::new();
        Self::register_ui(&mut engine);
        Self::register_user(&mut engine);
        Self::register_console(&mut engine);

        let hooks = HookRegistry::default();
        Self::register_lifecycle(&mut engine, hooks.clone());

        {
            let components = components.clone();
            engine.register_fn("component", move |id: &str| -> Dynamic {
                components.get(id).unwrap_or(Dynamic::UNIT)
            });
        }

        extend(&mut engine);

        let mut scope = Scope::new();
        scope.push("UI", UiApi::new(ui_host.clone()));
        scope.push("User", UserApi::new(user_host.clone()));
        scope.push("Base", BaseApi::default());
        scope.push("VModel", Dynamic::UNIT);
        scope.push("props", Dynamic::UNIT);
        scope.push("callbackQueryId", Dynamic::UNIT);
        scope.push("event", Dynamic::UNIT);

        Self {
            engine,
            scope: Mutex::new(scope),
            hooks,
            sink,
            lang: Mutex::new("en".to_string()),
            ui_host,
            user_host,
        }
    }

    fn register_ui(engine: &mut Engine) {
        engine.register_type_with_name::<UiApi>("UiApi");

        fn refresh(this: &mut UiApi) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.refresh())
        }
        fn back(this: &mut UiApi) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.back())
        }
        fn close(this: &mut UiApi) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.close())
        }
        fn dispose(this: &mut UiApi) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.dispose())
        }
        fn clear_keyboard(this: &mut UiApi) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.clear_keyboard())
        }
        fn next_page(this: &mut UiApi) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.next_page())
        }
        fn prev_page(this: &mut UiApi) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.prev_page())
        }
        fn go_to_page(this: &mut UiApi, index: i64) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.go_to_page(index))
        }
        fn toast(this: &mut UiApi, text: &str) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.toast(text))
        }
        fn alert(this: &mut UiApi, text: &str) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.alert(text))
        }
        fn status(this: &mut UiApi, kind: &str) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.status(kind))
        }
        fn send_page(this: &mut UiApi, id: &str) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.send_page(id))
        }
        fn navigate_1(this: &mut UiApi, id: &str) -> Result<(), Box<rhai::EvalAltResult>> {
            this.host.set_navigated(true);
            block_on(this.host.navigate(id, None, None))
        }
        fn navigate_2(this: &mut UiApi, id: &str, sub: Dynamic) -> Result<(), Box<rhai::EvalAltResult>> {
            this.host.set_navigated(true);
            block_on(this.host.navigate(id, to_opt_string(sub), None))
        }
        fn navigate_3(
            this: &mut UiApi,
            id: &str,
            sub: Dynamic,
            props: Dynamic,
        ) -> Result<(), Box<rhai::EvalAltResult>> {
            this.host.set_navigated(true);
            block_on(this.host.navigate(id, to_opt_string(sub), to_opt_json(props)))
        }
        fn navigate_fresh_1(this: &mut UiApi, id: &str) -> Result<(), Box<rhai::EvalAltResult>> {
            this.host.set_navigated(true);
            block_on(this.host.navigate_fresh(id, None, None))
        }
        fn navigate_fresh_2(
            this: &mut UiApi,
            id: &str,
            sub: Dynamic,
        ) -> Result<(), Box<rhai::EvalAltResult>> {
            this.host.set_navigated(true);
            block_on(this.host.navigate_fresh(id, to_opt_string(sub), None))
        }
        fn navigate_fresh_3(
            this: &mut UiApi,
            id: &str,
            sub: Dynamic,
            props: Dynamic,
        ) -> Result<(), Box<rhai::EvalAltResult>> {
            this.host.set_navigated(true);
            block_on(this.host.navigate_fresh(id, to_opt_string(sub), to_opt_json(props)))
        }
        fn get_page_count(this: &mut UiApi) -> i64 {
            this.host.get_page_count()
        }
        fn get_current_page(this: &mut UiApi) -> i64 {
            this.host.get_current_page()
        }

        ui_async_pair!(engine, "refresh", refresh);
        ui_async_pair!(engine, "back", back);
        ui_async_pair!(engine, "close", close);
        ui_async_pair!(engine, "dispose", dispose);
        ui_async_pair!(engine, "clearKeyboard", clear_keyboard);
        ui_async_pair!(engine, "nextPage", next_page);
        ui_async_pair!(engine, "prevPage", prev_page);
        ui_async_pair!(engine, "goToPage", go_to_page);
        ui_async_pair!(engine, "toast", toast);
        ui_async_pair!(engine, "alert", alert);
        ui_async_pair!(engine, "status", status);
        ui_async_pair!(engine, "sendPage", send_page);
        engine.register_fn("navigate", navigate_1);
        engine.register_fn("navigate", navigate_2);
        engine.register_fn("navigate", navigate_3);
        engine.register_fn("navigateAsync", navigate_1);
        engine.register_fn("navigateAsync", navigate_2);
        engine.register_fn("navigateAsync", navigate_3);
        engine.register_fn("navigateFresh", navigate_fresh_1);
        engine.register_fn("navigateFresh", navigate_fresh_2);
        engine.register_fn("navigateFresh", navigate_fresh_3);
        engine.register_fn("navigateFreshAsync", navigate_fresh_1);
        engine.register_fn("navigateFreshAsync", navigate_fresh_2);
        engine.register_fn("navigateFreshAsync", navigate_fresh_3);
        engine.register_get("pageCount", get_page_count);
        engine.register_get("currentPage", get_current_page);
        engine.register_fn("getPageCount", get_page_count);
        engine.register_fn("getCurrentPage", get_current_page);
    }

    fn register_user(engine: &mut Engine) {
        engine.register_type_with_name::<UserApi>("UserApi");

        fn send(this: &mut UserApi, text: &str) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.send(text))
        }
        fn edit(this: &mut UserApi, text: &str) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.edit(text))
        }
        fn delete(this: &mut UserApi) -> Result<(), Box<rhai::EvalAltResult>> {
            block_on(this.host.delete())
        }
        fn chat_id(this: &mut UserApi) -> i64 {
            this.host.chat_id()
        }
        fn lang(this: &mut UserApi) -> String {
            this.host.lang()
        }
        fn translate(this: &mut UserApi, key: &str) -> String {
            this.host.translate(key)
        }

        ui_async_pair!(engine, "send", send);
        ui_async_pair!(engine, "edit", edit);
        ui_async_pair!(engine, "delete", delete);
        engine.register_get("chatId", chat_id);
        engine.register_get("lang", lang);
        engine.register_fn("translate", translate);
    }

    fn register_console(engine: &mut Engine) {
        engine.register_type_with_name::<ConsoleApi>("ConsoleApi");
        engine.register_fn("log", console_log);
        engine.register_fn("warn", console_warn);
        engine.register_fn("error", console_error);
    }

    fn register_lifecycle(engine: &mut Engine, hooks: HookRegistry) {
        macro_rules! registrar {
            ($name:literal, $slot:ident) => {{
                let hooks = hooks.clone();
                engine.register_fn($name, move |f: FnPtr| {
                    hooks.$slot.push(f);
                });
            }};
        }
        registrar!("onMounted", on_mounted);
        registrar!("onUnmounted", on_unmounted);
        registrar!("beforeRender", before_render);
        registrar!("afterRender", after_render);
        registrar!("onRefresh", on_refresh);
        registrar!("onPhoto", on_photo);
        registrar!("onDocument", on_document);
    }

    /// Install `console` now that we have a concrete sink (the engine is
    /// built before the sink is known in some call paths; this keeps the
    /// scope push separate from type/fn registration).
    pub fn install_console(&self) {
        let api = ConsoleApi { sink: self.sink.clone() };
        self.scope.lock().unwrap().push("console", api);
    }

    pub fn set_lang(&self, lang: impl Into<String>) {
        *self.lang.lock().unwrap() = lang.into();
    }

    pub fn lang(&self) -> String {
        self.lang.lock().unwrap().clone()
    }

    /// Publishes `props` as a native object (spec §4.2 `setProps`).
    pub fn set_props(&self, value: &serde_json::Value) -> Result<(), ScriptError> {
        let dynamic: Dynamic =
            rhai::serde::to_dynamic(value).map_err(|e| ScriptError::Eval(e.to_string()))?;
        self.scope.lock().unwrap().set_value("props", dynamic);
        Ok(())
    }

    /// Publishes `Base` (spec §4.2 `setPage`).
    pub fn set_page(&self, base: BaseApi) {
        self.scope.lock().unwrap().set_value("Base", base);
    }

    pub fn set_vmodel(&self, vmodel: Dynamic) {
        self.scope.lock().unwrap().set_value("VModel", vmodel);
    }

    pub fn vmodel(&self) -> Dynamic {
        self.scope.lock().unwrap().get_value("VModel").unwrap_or(Dynamic::UNIT)
    }

    /// Error routing policy (spec §4.2, §7): a vmodel with a
    /// `handleErrorAsync` method (a `Map` whose entry by that name is a
    /// `FnPtr`, the idiomatic rhai "object with methods" shape) absorbs
    /// the error first; otherwise it falls through to the bot-user's
    /// `handleError`.
    pub fn route_error(&self, error: &ScriptError) {
        let vmodel = self.vmodel();
        if let Some(map) = vmodel.read_lock::<rhai::Map>() {
            if let Some(handler) = map.get("handleErrorAsync").and_then(|d| d.clone().try_cast::<FnPtr>()) {
                drop(map);
                let mut scope = self.scope.lock().unwrap();
                if handler
                    .call_dynamic(&self.engine, Some(&mut scope), [Dynamic::from(error.to_string())])
                    .is_ok()
                {
                    return;
                }
            }
        }
        self.user_host.handle_error(error);
    }

    /// Publishes the triggering callback query both to the script's
    /// `callbackQueryId` scope variable and to the host, so `UI.toast`/
    /// `UI.alert` called from within the same handler answer that query
    /// (spec §4.2, §4.4 `invokeEvent`).
    pub fn set_callback_query_id(&self, id: Option<String>) {
        let value = id.clone().map(Dynamic::from).unwrap_or(Dynamic::UNIT);
        self.scope.lock().unwrap().set_value("callbackQueryId", value);
        self.ui_host.set_callback_query_id(id);
    }

    pub fn set_event(&self, event: Dynamic) {
        self.scope.lock().unwrap().set_value("event", event);
    }

    /// Install a local binding (used by `ComponentContext::render`, §4.3),
    /// returning the previous value of that binding if one existed so the
    /// caller can restore it.
    pub fn install_local(&self, name: &str, value: Dynamic) -> Option<Dynamic> {
        let mut scope = self.scope.lock().unwrap();
        let previous = scope.get_value::<Dynamic>(name);
        scope.set_value(name, value);
        previous
    }

    pub fn remove_local(&self, name: &str) {
        let mut scope = self.scope.lock().unwrap();
        if let Some(idx) = scope.iter().position(|(n, ..)| n == name) {
            scope.remove::<Dynamic>(idx).ok();
        }
    }

    pub fn restore_local(&self, name: &str, previous: Option<Dynamic>) {
        let mut scope = self.scope.lock().unwrap();
        match previous {
            Some(value) => {
                scope.set_value(name, value);
            }
            None => {
                if let Some(idx) = scope.iter().position(|(n, ..)| n == name) {
                    scope.remove::<Dynamic>(idx).ok();
                }
            }
        }
    }

    /// `evaluate<T>` (spec §4.2): thin typed wrapper around the engine.
    pub fn evaluate<T: Clone + Send + Sync + 'static>(&self, expr: &str) -> Result<T, ScriptError> {
        let decoded = decode_xml_entities(strip_leading_await(expr));
        let mut scope = self.scope.lock().unwrap();
        self.engine.eval_with_scope::<T>(&mut scope, &decoded).map_err(ScriptError::from)
    }

    pub fn evaluate_bool(&self, expr: &str) -> Result<bool, ScriptError> {
        self.evaluate::<bool>(expr)
    }

    /// `evalAndUnwrap` (spec §4.2): strip `await `, decode entities,
    /// evaluate, stringify. `rhai` has no task/promise type, so the
    /// "await the inner value" steps the spec describes are a no-op here —
    /// the result is already the final value.
    pub fn eval_and_unwrap(&self, expr: &str) -> String {
        match self.evaluate::<Dynamic>(expr) {
            Ok(value) => value.to_string(),
            Err(e) => {
                self.sink.log(Level::Error, "script", &format!("eval error in '{expr}': {e}"));
                String::new()
            }
        }
    }

    /// `renderAsync(str)` (spec §4.2). Synchronous under the hood (see
    /// module docs) but kept `async` so `ScriptPage` callers that `.await`
    /// it don't need to special-case this crate.
    pub async fn render_async(&self, template: &str) -> String {
        render_sync(template, |expr| self.eval_and_unwrap(expr))
    }

    pub fn render(&self, template: &str) -> String {
        render_sync(template, |expr| self.eval_and_unwrap(expr))
    }

    /// `executeAsync(code)` (spec §4.2): wraps as an IIFE only when the
    /// code contains `await`; since the engine has no coroutines, both
    /// branches run identically — the wrap only matters to a real async
    /// engine, so here it is just textual await-stripping before running.
    pub fn execute_async(&self, code: &str) -> Result<Dynamic, ScriptError> {
        let decoded = decode_xml_entities(code);
        let cleaned = decoded.replace("await ", "");
        let mut scope = self.scope.lock().unwrap();
        self.engine.eval_with_scope::<Dynamic>(&mut scope, &cleaned).map_err(ScriptError::from)
    }

    /// Calls a lifecycle hook `FnPtr` with no arguments, routing any error
    /// to `on_error` (spec §4.2: vmodel handler first, else bot-user).
    pub fn call_hook(&self, f: &FnPtr, on_error: impl FnOnce(&ScriptError)) {
        let mut scope = self.scope.lock().unwrap();
        if let Err(e) = f.call_dynamic(&self.engine, Some(&mut scope), []) {
            on_error(&ScriptError::from(e));
        }
    }

    pub fn call_hook_with(&self, f: &FnPtr, args: Vec<Dynamic>, on_error: impl FnOnce(&ScriptError)) {
        let mut scope = self.scope.lock().unwrap();
        if let Err(e) = f.call_dynamic(&self.engine, Some(&mut scope), args) {
            on_error(&ScriptError::from(e));
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn with_scope<R>(&self, f: impl FnOnce(&mut Scope<'static>) -> R) -> R {
        let mut scope = self.scope.lock().unwrap();
        f(&mut scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{UiHost, UserHost};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use botui_core::log::CapturingSink;

    struct FakeUi {
        refreshed: AtomicBool,
        navigated: AtomicBool,
        page_count: AtomicI64,
        current_page: AtomicI64,
    }

    #[async_trait]
    impl UiHost for FakeUi {
        async fn refresh(&self) -> Result<(), ScriptError> {
            self.refreshed.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn navigate(&self, _id: &str, _sub: Option<String>, _props: Option<serde_json::Value>) -> Result<(), ScriptError> {
            Ok(())
        }
        async fn navigate_fresh(&self, _id: &str, _sub: Option<String>, _props: Option<serde_json::Value>) -> Result<(), ScriptError> {
            Ok(())
        }
        async fn send_page(&self, _id: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn back(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn close(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn dispose(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn clear_keyboard(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn toast(&self, _text: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn alert(&self, _text: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn status(&self, _kind: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn next_page(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn prev_page(&self) -> Result<(), ScriptError> { Ok(()) }
        async fn go_to_page(&self, i: i64) -> Result<(), ScriptError> {
            self.current_page.store(i, Ordering::SeqCst);
            Ok(())
        }
        fn get_page_count(&self) -> i64 { self.page_count.load(Ordering::SeqCst) }
        fn get_current_page(&self) -> i64 { self.current_page.load(Ordering::SeqCst) }
        fn set_navigated(&self, navigated: bool) { self.navigated.store(navigated, Ordering::SeqCst); }
        fn navigated(&self) -> bool { self.navigated.load(Ordering::SeqCst) }
    }

    struct FakeUser;
    #[async_trait]
    impl UserHost for FakeUser {
        async fn send(&self, _text: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn edit(&self, _text: &str) -> Result<(), ScriptError> { Ok(()) }
        async fn delete(&self) -> Result<(), ScriptError> { Ok(()) }
        fn chat_id(&self) -> i64 { 42 }
        fn lang(&self) -> String { "en".into() }
        fn translate(&self, key: &str) -> String { format!("[[{key}]]") }
        fn handle_error(&self, _error: &ScriptError) {}
    }

    fn context() -> (ScriptContext, Arc<FakeUi>) {
        let ui = Arc::new(FakeUi {
            refreshed: AtomicBool::new(false),
            navigated: AtomicBool::new(false),
            page_count: AtomicI64::new(3),
            current_page: AtomicI64::new(0),
        });
        let ctx = ScriptContext::new(ui.clone(), Arc::new(FakeUser), Arc::new(CapturingSink::new()));
        ctx.install_console();
        (ctx, ui)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn script_can_call_ui_refresh() {
        let (ctx, ui) = context();
        ctx.execute_async("UI.refresh();").unwrap();
        assert!(ui.refreshed.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn script_navigate_sets_navigated_flag() {
        let (ctx, ui) = context();
        ctx.execute_async(r#"UI.navigate("other");"#).unwrap();
        assert!(ui.navigated());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_page_count_readable_from_script() {
        let (ctx, _ui) = context();
        let n: i64 = ctx.evaluate("UI.getPageCount()").unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn evaluate_bool_works() {
        let (ctx, _ui) = context();
        assert!(ctx.evaluate_bool("1 < 2").unwrap());
    }

    #[test]
    fn eval_and_unwrap_decodes_xml_entities() {
        let (ctx, _ui) = context();
        assert_eq!(ctx.eval_and_unwrap("1 &lt; 2"), "true");
    }

    #[test]
    fn render_substitutes_template_expressions() {
        let (ctx, _ui) = context();
        ctx.set_props(&serde_json::json!({"name": "Ada"})).unwrap();
        let out = ctx.render("Hello {{ props.name }}");
        assert_eq!(out, "Hello Ada");
    }

    #[test]
    fn translate_falls_back_to_bracketed_key() {
        let (ctx, _ui) = context();
        let out: String = ctx.evaluate(r#"User.translate("greeting")"#).unwrap();
        assert_eq!(out, "[[greeting]]");
    }

    #[test]
    fn lifecycle_hooks_register_without_firing() {
        let (ctx, _ui) = context();
        ctx.execute_async("onMounted(|| { 1 });").unwrap();
        assert_eq!(ctx.hooks.on_mounted.len(), 1);
    }
}
