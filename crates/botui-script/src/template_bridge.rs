//! Thin adapter so `ScriptContext` doesn't need to depend on the exact
//! `TemplateParser` call shape at every call site.

use botui_core::template::TemplateParser;

pub fn render_sync(template: &str, eval: impl FnMut(&str) -> String) -> String {
    TemplateParser::render(template, eval)
}
