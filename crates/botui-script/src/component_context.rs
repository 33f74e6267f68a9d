//! Per-component scope (spec §4.3): a small local-name map — most
//! importantly `self` — layered above the page's `ScriptContext`. `render`
//! installs each local, renders through the shared engine, then restores
//! whatever binding was there before, so component-local state never leaks
//! into the page's global scope.

use std::collections::HashMap;

use rhai::Dynamic;

use crate::context::ScriptContext;

#[derive(Clone)]
pub struct ComponentContext<'a> {
    script: &'a ScriptContext,
    locals: HashMap<String, Dynamic>,
}

impl<'a> ComponentContext<'a> {
    pub fn new(script: &'a ScriptContext) -> Self {
        Self { script, locals: HashMap::new() }
    }

    pub fn set_local(&mut self, name: impl Into<String>, value: Dynamic) {
        self.locals.insert(name.into(), value);
    }

    pub fn set_self(&mut self, value: Dynamic) {
        self.set_local("self", value);
    }

    pub fn get_local(&self, name: &str) -> Option<&Dynamic> {
        self.locals.get(name)
    }

    /// Installs every local, renders `template` through the shared engine,
    /// then restores the prior bindings.
    pub fn render(&self, template: &str) -> String {
        let mut saved = Vec::with_capacity(self.locals.len());
        for (name, value) in &self.locals {
            saved.push((name.clone(), self.script.install_local(name, value.clone())));
        }
        let rendered = self.script.render(template);
        for (name, previous) in saved {
            self.script.restore_local(&name, previous);
        }
        rendered
    }

    /// Evaluates `expr` with the current locals installed and stringifies
    /// the result the same way `ScriptContext::eval_and_unwrap` does.
    pub fn eval_and_unwrap(&self, expr: &str) -> String {
        let mut saved = Vec::with_capacity(self.locals.len());
        for (name, value) in &self.locals {
            saved.push((name.clone(), self.script.install_local(name, value.clone())));
        }
        let result = self.script.eval_and_unwrap(expr);
        for (name, previous) in saved {
            self.script.restore_local(&name, previous);
        }
        result
    }

    pub fn script(&self) -> &ScriptContext {
        self.script
    }

    pub fn evaluate_bool(&self, expr: &str) -> Result<bool, crate::error::ScriptError> {
        let mut saved = Vec::with_capacity(self.locals.len());
        for (name, value) in &self.locals {
            saved.push((name.clone(), self.script.install_local(name, value.clone())));
        }
        let result = self.script.evaluate_bool(expr);
        for (name, previous) in saved {
            self.script.restore_local(&name, previous);
        }
        result
    }

    /// Builds a nested scope for slot rendering (e.g. `AutoCard`'s
    /// `<template #item>`), inheriting the current locals as a starting
    /// point.
    pub fn create_child(&self) -> ComponentContext<'a> {
        ComponentContext { script: self.script, locals: self.locals.clone() }
    }
}
