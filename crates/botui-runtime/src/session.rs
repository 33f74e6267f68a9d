//! `Session` (spec §4.8 `baseBotUser`): the per-chat object holding
//! everything scoped to one conversation — language, active pages,
//! transport handle, and the virtual hooks an application overrides.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use botui_core::i18n::{lookup, LocalizationPack};
use botui_core::log::{Level, LogSink};
use botui_script::ScriptError;
use botui_transport::client::BotClient;

use crate::critical_section::SafeStop;
use crate::handle::PageHandle;
use crate::page_manager::PageManager;

/// Application-overridable virtual hooks (spec §4.8). Every method has a
/// no-op/permissive default so an application only implements the ones it
/// cares about.
#[async_trait]
pub trait BotUserHooks: Send + Sync {
    async fn handle_message(&self, _session: &Session, _text: &str) {}
    async fn handle_photo(&self, _session: &Session, _file_id: &str) {}
    async fn handle_document(&self, _session: &Session, _file_id: &str) {}
    async fn handle_command(&self, _session: &Session, _command: &str, _args: &str) {}
    async fn handle_other_message(&self, _session: &Session) {}
    async fn handle_success_payment(&self, _session: &Session) {}
    async fn handle_pre_checkout_query(&self, _session: &Session, _query_id: &str) {}
    async fn handle_error(&self, _session: &Session, _error: &ScriptError) {}
    /// Gate: return `false` to silently reject an update with no state
    /// change (spec §7 "Permission denied").
    async fn handle_permissive(&self, _session: &Session) -> bool {
        true
    }
    /// Gate: return `false` to refuse the session until a license is
    /// accepted.
    async fn handle_accept_license(&self, _session: &Session) -> bool {
        true
    }
    /// A callback query arrived for an unknown/expired token.
    async fn handle_rejected_callback(&self, _session: &Session, _query_id: &str) {}
    /// A click arrived while safe-stop is draining.
    async fn handle_stopping_process(&self, _session: &Session) {}
}

/// Permissive default used when an application registers no hooks at all.
pub struct NoopHooks;

#[async_trait]
impl BotUserHooks for NoopHooks {}

pub struct Session {
    chat_id: i64,
    lang: Mutex<String>,
    localization: Arc<dyn LocalizationPack>,
    transport: Arc<dyn BotClient>,
    page_manager: Arc<PageManager>,
    callback_registry: botui_callback::CallbackRegistry,
    active_pages: Mutex<VecDeque<PageHandle>>,
    active_pages_capacity: usize,
    safe_stop: SafeStop,
    hooks: Arc<dyn BotUserHooks>,
    default_back_title: String,
    log_sink: Arc<dyn LogSink>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chat_id: i64,
        session_short_id: String,
        lang: String,
        localization: Arc<dyn LocalizationPack>,
        transport: Arc<dyn BotClient>,
        page_manager: Arc<PageManager>,
        active_pages_capacity: usize,
        hooks: Arc<dyn BotUserHooks>,
        default_back_title: String,
        log_sink: Arc<dyn LogSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            chat_id,
            lang: Mutex::new(lang),
            localization,
            transport,
            page_manager,
            callback_registry: botui_callback::CallbackRegistry::new(session_short_id),
            active_pages: Mutex::new(VecDeque::new()),
            active_pages_capacity,
            safe_stop: SafeStop::new(),
            hooks,
            default_back_title,
            log_sink,
        })
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn transport(&self) -> &Arc<dyn BotClient> {
        &self.transport
    }

    pub fn page_manager(&self) -> &Arc<PageManager> {
        &self.page_manager
    }

    pub fn callback_registry(&self) -> &botui_callback::CallbackRegistry {
        &self.callback_registry
    }

    pub fn default_back_title(&self) -> &str {
        &self.default_back_title
    }

    pub fn safe_stop(&self) -> &SafeStop {
        &self.safe_stop
    }

    pub fn hooks(&self) -> &Arc<dyn BotUserHooks> {
        &self.hooks
    }

    pub fn lang(&self) -> String {
        self.lang.lock().unwrap().clone()
    }

    pub fn set_lang(&self, lang: impl Into<String>) {
        *self.lang.lock().unwrap() = lang.into();
    }

    pub fn translate(&self, key: &str) -> String {
        lookup(self.localization.as_ref(), &self.lang(), key)
    }

    pub fn log(&self, level: Level, scope: &str, message: &str) {
        self.log_sink.log(level, scope, message);
    }

    /// Registers a newly-opened root page (spec §4.8 `activePages`,
    /// bounded MRU). Evicting the oldest entry disposes its whole subtree.
    pub async fn push_active_page(&self, handle: PageHandle) {
        let evicted = {
            let mut pages = self.active_pages.lock().unwrap();
            pages.push_back(handle);
            if pages.len() > self.active_pages_capacity {
                pages.pop_front()
            } else {
                None
            }
        };
        if let Some(evicted) = evicted {
            evicted.dispose().await;
        }
    }

    pub fn active_page_count(&self) -> usize {
        self.active_pages.lock().unwrap().len()
    }

    /// Disposes every currently-active page (spec §8 "session cache
    /// eviction ... triggers disposal of the old user object").
    pub async fn dispose_all_pages(&self) {
        let pages: Vec<PageHandle> = self.active_pages.lock().unwrap().drain(..).collect();
        for page in pages {
            page.dispose().await;
        }
    }

    /// Most-recently-opened active page still live, if any.
    fn most_recent_active_page(&self) -> Option<PageHandle> {
        self.active_pages.lock().unwrap().back().cloned()
    }

    /// Spec §4.8: if the most recent active page registered an `onPhoto`
    /// hook, dispatch there and re-render; otherwise the caller should fall
    /// back to the virtual `handlePhoto` hook.
    pub async fn forward_photo_to_active_page(&self, file_id: &str) -> bool {
        let Some(handle) = self.most_recent_active_page() else { return false };
        let page = handle.page().clone();
        let script = page.script().clone();
        let handled = script.hooks.on_photo.callbacks();
        if handled.is_empty() {
            return false;
        }
        for f in handled {
            script.call_hook_with(&f, vec![rhai::Dynamic::from(file_id.to_string())], |e| script.route_error(e));
        }
        let message = page.current_message();
        let _ = page.render_into(message).await;
        true
    }

    /// Spec §4.8: document counterpart of `forwardPhotoToActivePage`.
    pub async fn forward_document_to_active_page(&self, file_id: &str) -> bool {
        let Some(handle) = self.most_recent_active_page() else { return false };
        let page = handle.page().clone();
        let script = page.script().clone();
        let handled = script.hooks.on_document.callbacks();
        if handled.is_empty() {
            return false;
        }
        for f in handled {
            script.call_hook_with(&f, vec![rhai::Dynamic::from(file_id.to_string())], |e| script.route_error(e));
        }
        let message = page.current_message();
        let _ = page.render_into(message).await;
        true
    }
}
