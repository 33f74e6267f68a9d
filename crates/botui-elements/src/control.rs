//! Script-visible component handles: what `component(id)` (spec §4.2)
//! returns, and the small fixed method vocabulary (`toggle`, `select`,
//! `setChecked`, `cycleNext`, `cycleTo`, pagination) that Checkbox,
//! CheckboxList, Radio, Switch, Card and AutoCard expose to scripts and to
//! `NavigatePanel`'s bound-target lookup.

use std::sync::Arc;

use rhai::{Dynamic, Engine};

use botui_script::ScriptError;

/// Implemented by concrete elements that want to be callable from script
/// via `component(id).method(args)`.
pub trait ScriptControllable: Send + Sync {
    fn invoke_method(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic, ScriptError>;
}

/// The `Dynamic` payload a `ComponentLookup` hands back for a controllable
/// element. Method dispatch is a fixed set of registered names (rhai has
/// no generic method fallback), each forwarding to `invoke_method`.
#[derive(Clone)]
pub struct ComponentHandle(pub Arc<dyn ScriptControllable>);

fn call0(this: &mut ComponentHandle, method: &'static str) -> Result<Dynamic, Box<rhai::EvalAltResult>> {
    this.0.invoke_method(method, &[]).map_err(|e| e.to_string().into())
}

fn call1(
    this: &mut ComponentHandle,
    method: &'static str,
    arg: Dynamic,
) -> Result<Dynamic, Box<rhai::EvalAltResult>> {
    this.0.invoke_method(method, &[arg]).map_err(|e| e.to_string().into())
}

fn call2(
    this: &mut ComponentHandle,
    method: &'static str,
    a: Dynamic,
    b: Dynamic,
) -> Result<Dynamic, Box<rhai::EvalAltResult>> {
    this.0.invoke_method(method, &[a, b]).map_err(|e| e.to_string().into())
}

/// Registers the `ComponentHandle` type and its fixed method vocabulary.
/// Passed to `ScriptContext::with_extensions` since `botui-script` can't
/// depend downward on this crate.
pub fn register(engine: &mut Engine) {
    engine.register_type_with_name::<ComponentHandle>("ComponentHandle");

    engine.register_fn("toggle", |this: &mut ComponentHandle| call0(this, "toggle"));
    engine.register_fn("cycleNext", |this: &mut ComponentHandle| call0(this, "cycleNext"));
    engine.register_fn("nextPage", |this: &mut ComponentHandle| call0(this, "nextPage"));
    engine.register_fn("prevPage", |this: &mut ComponentHandle| call0(this, "prevPage"));
    engine.register_fn("getCurrentPage", |this: &mut ComponentHandle| call0(this, "getCurrentPage"));
    engine.register_fn("getPageCount", |this: &mut ComponentHandle| call0(this, "getPageCount"));

    engine.register_fn("select", |this: &mut ComponentHandle, value: bool| call1(this, "select", Dynamic::from(value)));
    engine.register_fn("cycleTo", |this: &mut ComponentHandle, id: &str| call1(this, "cycleTo", Dynamic::from(id.to_string())));
    engine.register_fn("goToPage", |this: &mut ComponentHandle, index: i64| call1(this, "goToPage", Dynamic::from(index)));
    engine.register_fn("setChecked", |this: &mut ComponentHandle, id: Dynamic| call1(this, "setChecked", id));

    // CheckboxList/Radio-specific overloads (rhai dispatches by arity/type).
    engine.register_fn("toggle", |this: &mut ComponentHandle, id: &str| call1(this, "toggle", Dynamic::from(id.to_string())));
    engine.register_fn("setChecked", |this: &mut ComponentHandle, id: &str, checked: bool| {
        call2(this, "setChecked", Dynamic::from(id.to_string()), Dynamic::from(checked))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Counter(Mutex<i64>);
    impl ScriptControllable for Counter {
        fn invoke_method(&self, method: &str, args: &[Dynamic]) -> Result<Dynamic, ScriptError> {
            match method {
                "toggle" => {
                    *self.0.lock().unwrap() += 1;
                    Ok(Dynamic::UNIT)
                }
                "goToPage" => {
                    let n = args[0].as_int().unwrap_or(0);
                    *self.0.lock().unwrap() = n;
                    Ok(Dynamic::UNIT)
                }
                other => Err(ScriptError::Host(format!("unknown method {other}"))),
            }
        }
    }

    #[test]
    fn dispatches_to_invoke_method() {
        let mut engine = Engine::new();
        register(&mut engine);
        let counter = Arc::new(Counter(Mutex::new(0)));
        let handle = ComponentHandle(counter.clone());
        let mut scope = rhai::Scope::new();
        scope.push("c", handle);
        engine.eval_with_scope::<Dynamic>(&mut scope, "c.toggle(); c.goToPage(5);").unwrap();
        assert_eq!(*counter.0.lock().unwrap(), 5);
    }
}
