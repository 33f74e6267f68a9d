//! `ScriptPage` (spec §4, §4.5, §4.7): the live, built form of a
//! `PageDefinition` — its `ScriptContext`, element tree, current message
//! and own top-level pagination state. `PageHandle` owns the lifetime;
//! `ScriptPage` only knows how to render and dispose itself.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use botui_callback::CallbackRegistry;
use botui_core::log::Level;
use botui_core::model::{MessageBody, PageDefinition};
use botui_elements::{Button, ElementHost, MenuElement, NavigatePanel, NavigateTarget, PaginatedTarget};
use botui_script::{ComponentContext, ScriptContext};
use botui_transport::client::{MediaInput, ParseMode, ReplyMarkup};

use crate::error::DispatchError;
use crate::host::PageRuntimeHost;
use crate::keyboard::{assemble_rows, to_reply_markup, with_back_row};

/// Where a page's content currently lives in the chat; `None` means this
/// page has never been delivered to the platform yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub message_id: i64,
}

/// A `PaginatedTarget` adapter over a `ScriptPage`'s own top-level
/// pagination, used to bind a page-level `NavigatePanel` (spec §3
/// `navigate`) without requiring `ScriptPage` to hand out `Arc<Self>`
/// from a `&self` method.
struct PageTarget(Weak<ScriptPage>);

impl PaginatedTarget for PageTarget {
    fn next_page(&self) -> bool {
        self.0.upgrade().map(|p| p.next_page()).unwrap_or(false)
    }
    fn prev_page(&self) -> bool {
        self.0.upgrade().map(|p| p.prev_page()).unwrap_or(false)
    }
    fn go_to_page(&self, index: i64) {
        if let Some(p) = self.0.upgrade() {
            p.go_to_page(index);
        }
    }
    fn current_page(&self) -> usize {
        self.0.upgrade().map(|p| p.current_page()).unwrap_or(0)
    }
    fn page_count(&self) -> usize {
        self.0.upgrade().map(|p| p.page_count()).unwrap_or(1)
    }
}

pub struct ScriptPage {
    id: String,
    definition: Arc<PageDefinition>,
    page_dir: PathBuf,
    script: Arc<ScriptContext>,
    groups: Mutex<Vec<Vec<Arc<dyn MenuElement>>>>,
    current_page_index: Mutex<usize>,
    host: Arc<PageRuntimeHost>,
    last_message: Mutex<Option<MessageRef>>,
    self_weak: Mutex<Weak<ScriptPage>>,
}

impl ScriptPage {
    /// `groups` is the page's top-level content, already split into
    /// auto-pagination chunks by `PageManager` (an empty list becomes one
    /// empty group, so `render_into` always has a current group to ask).
    pub fn new(
        id: String,
        definition: Arc<PageDefinition>,
        page_dir: PathBuf,
        script: Arc<ScriptContext>,
        groups: Vec<Vec<Arc<dyn MenuElement>>>,
        host: Arc<PageRuntimeHost>,
    ) -> Arc<Self> {
        let groups = if groups.is_empty() { vec![Vec::new()] } else { groups };
        let page = Arc::new(Self {
            id,
            definition,
            page_dir,
            script,
            groups: Mutex::new(groups),
            current_page_index: Mutex::new(0),
            host,
            last_message: Mutex::new(None),
            self_weak: Mutex::new(Weak::new()),
        });
        *page.self_weak.lock().unwrap() = Arc::downgrade(&page);
        page
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition(&self) -> &Arc<PageDefinition> {
        &self.definition
    }

    pub fn script(&self) -> &Arc<ScriptContext> {
        &self.script
    }

    pub fn page_dir(&self) -> &Path {
        &self.page_dir
    }

    pub fn host(&self) -> &Arc<PageRuntimeHost> {
        &self.host
    }

    pub fn current_message(&self) -> Option<MessageRef> {
        *self.last_message.lock().unwrap()
    }

    // -- own top-level pagination (spec §3 `maxItems`/`maxRows`, §4.2
    // `UI.nextPage`/`prevPage`/`goToPage`/`pageCount`/`currentPage`) --

    pub fn page_count(&self) -> usize {
        self.groups.lock().unwrap().len().max(1)
    }

    pub fn current_page(&self) -> usize {
        *self.current_page_index.lock().unwrap()
    }

    pub fn go_to_page(&self, index: i64) {
        let count = self.page_count();
        let clamped = index.clamp(0, count as i64 - 1) as usize;
        *self.current_page_index.lock().unwrap() = clamped;
    }

    pub fn next_page(&self) -> bool {
        let count = self.page_count();
        let mut idx = self.current_page_index.lock().unwrap();
        if *idx + 1 < count {
            *idx += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&self) -> bool {
        let mut idx = self.current_page_index.lock().unwrap();
        if *idx > 0 {
            *idx -= 1;
            true
        } else {
            false
        }
    }

    fn current_group(&self) -> Vec<Arc<dyn MenuElement>> {
        let idx = self.current_page();
        self.groups.lock().unwrap().get(idx).cloned().unwrap_or_default()
    }

    fn parse_mode(&self) -> ParseMode {
        match &self.definition.message {
            Some(spec) if spec.pre => ParseMode::Html,
            Some(spec) if spec.md => ParseMode::Markdown,
            _ => ParseMode::None,
        }
    }

    fn render_message_text(&self) -> String {
        let Some(spec) = &self.definition.message else {
            return String::new();
        };
        let rendered = match &spec.body {
            MessageBody::Inline(template) => self.script.render(template),
            MessageBody::Conditions(conditions) => conditions
                .iter()
                .find(|c| self.script.evaluate_bool(&c.condition).unwrap_or(false))
                .map(|c| self.script.render(&c.content))
                .unwrap_or_default(),
            MessageBody::Resource(name) => match self.host.session() {
                Some(session) => match session.page_manager().resources().get_text(name, &self.page_dir) {
                    Ok(text) => self.script.render(&text),
                    Err(e) => {
                        session.log(Level::Error, "resources", &e.to_string());
                        String::new()
                    }
                },
                None => String::new(),
            },
        };
        if spec.pre {
            format!("<pre>{}</pre>", html_escape(&rendered))
        } else {
            rendered
        }
    }

    fn navigate_panel_buttons(&self, ctx: &ComponentContext, registry: &CallbackRegistry) -> Option<Vec<Button>> {
        let spec = self.definition.navigate.as_ref()?;
        if self.page_count() <= 1 {
            return None;
        }
        let mut def = botui_core::model::ComponentDefinition::new("navigate-panel");
        if let Some(message) = &spec.boundary_message {
            def.attrs.statics.insert("boundaryMessage".to_string(), message.clone());
        }
        let weak = self.self_weak.lock().unwrap().clone();
        let target: Arc<dyn PaginatedTarget> = Arc::new(PageTarget(weak));
        let host: ElementHost = self.host.clone();
        let panel =
            NavigatePanel::new(&def, NavigateTarget::Bound(target), spec.carousel, spec.hide_boundary, self.script.clone(), host)
                .ok()?;
        Some(panel.build(ctx, registry))
    }

    /// Renders this page's current state into `message` (edits it in
    /// place) or, if `None`, sends a brand-new message and records the
    /// result (spec §4.5 render pass, §4.7 `render_into`).
    pub async fn render_into(&self, message: Option<MessageRef>) -> Result<(), DispatchError> {
        let session = self.host.session().ok_or_else(|| DispatchError::UnknownPage(self.id.clone()))?;

        for f in self.script.hooks.before_render.callbacks() {
            self.script.call_hook(&f, |e| self.script.route_error(e));
        }

        let ctx = ComponentContext::new(&self.script);
        let registry = session.callback_registry();

        let group = self.current_group();
        let visible: Vec<&Arc<dyn MenuElement>> = group.iter().filter(|e| !e.hidden(&ctx)).collect();

        let overlay_element =
            visible.iter().copied().find(|e| e.as_overlay().map(|o| o.takes_over_keyboard(&ctx)).unwrap_or(false));

        let mut buttons: Vec<Button> = match overlay_element {
            Some(el) => el.build(&ctx, registry),
            None => visible.iter().flat_map(|e| e.build(&ctx, registry)).collect(),
        };

        if overlay_element.is_none() {
            if let Some(panel_buttons) = self.navigate_panel_buttons(&ctx, registry) {
                buttons.extend(panel_buttons);
            }
        }

        let mut rows = assemble_rows(buttons);

        let has_parent = self.host.handle().map(|h| h.parent().is_some()).unwrap_or(false);
        if self.definition.back_to_parent && has_parent {
            let back_title = self.definition.back_title.clone().unwrap_or_else(|| session.default_back_title().to_string());
            let host = self.host.clone();
            let token = registry.subscribe(Arc::new(move |_invocation| {
                let host = host.clone();
                Box::pin(async move {
                    if let Some(handle) = host.handle() {
                        let _ = handle.back().await;
                    }
                })
            }));
            rows = with_back_row(rows, &back_title, token);
        }

        let message_override = visible.iter().find_map(|e| e.as_overlay().and_then(|o| o.message_override(&ctx)));
        let text = message_override.unwrap_or_else(|| self.render_message_text());
        let markup = to_reply_markup(&rows);

        let sent = self.deliver(&session, message, &text, markup).await?;
        *self.last_message.lock().unwrap() = Some(sent);

        for f in self.script.hooks.after_render.callbacks() {
            self.script.call_hook(&f, |e| self.script.route_error(e));
        }
        Ok(())
    }

    async fn deliver(
        &self,
        session: &crate::session::Session,
        message: Option<MessageRef>,
        text: &str,
        markup: ReplyMarkup,
    ) -> Result<MessageRef, DispatchError> {
        let chat_id = session.chat_id();
        let transport = session.transport();
        let parse_mode = self.parse_mode();
        let reply_markup = if markup.is_empty() { None } else { Some(markup) };
        let link_preview_disabled = !self.definition.web_preview;

        match (message, &self.definition.media) {
            (Some(m), None) => {
                transport.edit_message_text(chat_id, m.message_id, text, parse_mode, reply_markup, link_preview_disabled).await?;
                Ok(m)
            }
            (Some(m), Some(_)) => {
                transport.edit_message_caption(chat_id, m.message_id, text, parse_mode, reply_markup).await?;
                Ok(m)
            }
            (None, None) => {
                let sent = transport.send_message(chat_id, text, parse_mode, reply_markup, link_preview_disabled).await?;
                Ok(MessageRef { message_id: sent.message_id })
            }
            (None, Some(media)) => {
                let input = MediaInput::Path(media.src.clone());
                let sent = transport.send_media(chat_id, media.kind, input, Some(text), parse_mode, reply_markup).await?;
                Ok(MessageRef { message_id: sent.message_id })
            }
        }
    }

    /// Best-effort delete of the chat message backing this page. Returns
    /// the transport error (if any) but the caller (`PageHandle::close`)
    /// proceeds with disposal regardless.
    pub async fn delete_message(&self) -> Result<(), DispatchError> {
        let Some(session) = self.host.session() else { return Ok(()) };
        let Some(message) = self.current_message() else { return Ok(()) };
        session.transport().delete_message(session.chat_id(), message.message_id).await?;
        *self.last_message.lock().unwrap() = None;
        Ok(())
    }

    /// Runs `onUnmounted` hooks then disposes every element this page
    /// built (spec §4.7). Infallible: a lifecycle hook's own error is
    /// routed like any other script error, never propagated to the
    /// disposal cascade.
    pub async fn on_disposed(&self) {
        for f in self.script.hooks.on_unmounted.callbacks() {
            self.script.call_hook(&f, |e| self.script.route_error(e));
        }
        if let Some(session) = self.host.session() {
            let registry = session.callback_registry();
            for group in self.groups.lock().unwrap().iter() {
                for element in group {
                    element.dispose(registry);
                }
            }
        }
        #[cfg(test)]
        test_support::record_unmount(&self.id);
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
pub mod test_support {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::sync::Arc;

    use botui_core::log::CapturingSink;
    use botui_core::model::PageDefinition;
    use botui_script::ScriptContext;

    use super::ScriptPage;
    use crate::host::PageRuntimeHost;

    thread_local! {
        static UNMOUNT_LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    pub(crate) fn record_unmount(id: &str) {
        UNMOUNT_LOG.with(|log| log.borrow_mut().push(id.to_string()));
    }

    /// Dispose order recorded by every `dummy_page` created on the current
    /// thread. `#[tokio::test]`'s default current-thread runtime keeps a
    /// whole test's async body (and any nested `.await`s) on one OS
    /// thread, so this is correctly isolated per test despite being a
    /// `thread_local`, not a global.
    pub fn unmount_order() -> Vec<String> {
        UNMOUNT_LOG.with(|log| log.borrow().clone())
    }

    /// A `ScriptPage` with no session/transport behind it — enough to
    /// exercise `PageHandle` lifecycle/dispose-order tests without wiring
    /// up a fake bot client.
    pub fn dummy_page(id: &str) -> Arc<ScriptPage> {
        let host = PageRuntimeHost::detached();
        let script = Arc::new(ScriptContext::new(host.clone(), host.clone(), Arc::new(CapturingSink::new())));
        ScriptPage::new(id.to_string(), Arc::new(PageDefinition::new(id)), PathBuf::from("/"), script, Vec::new(), host)
    }
}
