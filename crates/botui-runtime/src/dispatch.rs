//! The update dispatcher (spec §2, §5, §7): resolves each inbound `Update`
//! to its chat's `Session`, applies the skip-on-start and safe-stop gates,
//! and routes it to the right `BotUserHooks` method or `CallbackRegistry`
//! entry. This is the last line of defense before an escaping error would
//! otherwise reach the platform unhandled — anything `dispatch` can't
//! already route to `handle_error` is logged at `Level::Critical` and
//! swallowed (spec §7).

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use botui_callback::CallbackInvocation;
use botui_core::config::RuntimeConfig;
use botui_core::i18n::LocalizationPack;
use botui_core::log::{Level, LogSink};
use botui_script::ScriptError;
use botui_transport::client::BotClient;
use botui_transport::update::{IncomingCallbackQuery, IncomingMessage, IncomingPreCheckoutQuery, Update};

use crate::error::DispatchError;
use crate::handle::PageHandle;
use crate::page_manager::PageManager;
use crate::session::{BotUserHooks, Session};
use crate::session_cache::SessionCache;

/// Builds the per-chat `BotUserHooks` implementation for a freshly created
/// session. Most applications hand back the same shared hook object for
/// every chat; the factory still takes `chat_id` so apps that key hooks off
/// a per-user database record can do so.
pub type HooksFactory = Arc<dyn Fn(i64) -> Arc<dyn BotUserHooks> + Send + Sync>;

/// Owns the `SessionCache` and routes every inbound `Update` through the
/// spec §2 data flow: resolve session, apply gates, dispatch, swallow.
pub struct Dispatcher {
    sessions: SessionCache,
    page_manager: Arc<PageManager>,
    transport: Arc<dyn BotClient>,
    localization: Arc<dyn LocalizationPack>,
    config: RuntimeConfig,
    hooks_factory: HooksFactory,
    log_sink: Arc<dyn LogSink>,
    start_time: i64,
}

impl Dispatcher {
    pub fn new(
        page_manager: Arc<PageManager>,
        transport: Arc<dyn BotClient>,
        localization: Arc<dyn LocalizationPack>,
        config: RuntimeConfig,
        hooks_factory: HooksFactory,
        log_sink: Arc<dyn LogSink>,
    ) -> Self {
        let start_time = now_unix();
        Self::with_start_time(page_manager, transport, localization, config, hooks_factory, log_sink, start_time)
    }

    /// As `new`, but pins the skip-on-start watermark explicitly — lets
    /// tests exercise the gate without depending on wall-clock time.
    #[allow(clippy::too_many_arguments)]
    pub fn with_start_time(
        page_manager: Arc<PageManager>,
        transport: Arc<dyn BotClient>,
        localization: Arc<dyn LocalizationPack>,
        config: RuntimeConfig,
        hooks_factory: HooksFactory,
        log_sink: Arc<dyn LogSink>,
        start_time: i64,
    ) -> Self {
        let ttl = Duration::from_secs(config.clear_cache_time_secs);
        Self { sessions: SessionCache::new(ttl), page_manager, transport, localization, config, hooks_factory, log_sink, start_time }
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    /// Opens `page_id` as a brand-new root page for `chat_id`, registering
    /// it into that chat's MRU `activePages` (spec §4.8) — the
    /// command-triggered counterpart to a page's own `UI.sendPage`, which
    /// only exists once a page (and therefore a `PageRuntimeHost`) is
    /// already live. An application's `handle_command`/`handle_message`
    /// hook calls this to put the first page in front of a user.
    pub async fn open_root_page(&self, chat_id: i64, page_id: &str) -> Result<(), DispatchError> {
        let session = self.session_for(chat_id).await;
        let new_page = session.page_manager().build_page(&session, page_id, None).await?;
        let new_handle = PageHandle::new(new_page.clone(), None);
        new_page.host().bind(new_handle.downgrade());
        new_page.render_into(None).await?;
        session.push_active_page(new_handle).await;
        Ok(())
    }

    /// A token counter scoped to one worker process would otherwise collide
    /// across restarts at `0`; folding the chat id in is enough to make
    /// tokens minted by a stale process visibly different without needing a
    /// real UUID per session (spec §4.6).
    fn session_short_id(chat_id: i64) -> String {
        format!("{chat_id:x}")
    }

    async fn session_for(&self, chat_id: i64) -> Arc<Session> {
        let page_manager = self.page_manager.clone();
        let transport = self.transport.clone();
        let localization = self.localization.clone();
        let hooks = (self.hooks_factory)(chat_id);
        let active_pages_capacity = self.config.active_pages_capacity;
        let default_back_title = self.config.default_back_title.clone();
        let log_sink = self.log_sink.clone();
        self.sessions
            .get_or_create(chat_id, move || {
                Session::new(
                    chat_id,
                    Self::session_short_id(chat_id),
                    "en".to_string(),
                    localization,
                    transport,
                    page_manager,
                    active_pages_capacity,
                    hooks,
                    default_back_title,
                    log_sink,
                )
            })
            .await
    }

    /// Entry point for one inbound `Update` (spec §2 steps 1-4). Never
    /// propagates an error to the caller: a failure that escapes routing is
    /// handed to the session's `handle_error` hook and logged at
    /// `Level::Critical`, never bubbled further (spec §7).
    pub async fn dispatch(&self, update: Update) {
        let chat_id = update.chat_id();

        if self.config.skip_on_start {
            if let Update::Message(message) = &update {
                if message.date < self.start_time {
                    self.log_sink.log(
                        Level::Info,
                        "dispatch",
                        &format!("dropped stale update for chat {chat_id} (skip-on-start)"),
                    );
                    return;
                }
            }
        }

        let session = self.session_for(chat_id).await;
        let _critical_section = session.safe_stop().enter();

        if session.safe_stop().is_stopping() {
            self.handle_stopping(&session, &update).await;
            return;
        }

        if !session.hooks().handle_permissive(&session).await {
            self.handle_permission_denied(&session, &update).await;
            return;
        }

        let result = match update {
            Update::Message(message) => self.dispatch_message(&session, message).await,
            Update::CallbackQuery(query) => self.dispatch_callback_query(&session, query).await,
            Update::PreCheckoutQuery(query) => self.dispatch_pre_checkout_query(&session, query).await,
        };

        if let Err(error) = result {
            let message = error.to_string();
            let script_error: ScriptError = error.into();
            session.hooks().handle_error(&session, &script_error).await;
            session.log(Level::Critical, "dispatch", &format!("unhandled error for chat {chat_id}: {message}"));
        }
    }

    /// Spec §5: "a button click answers with the stopping text instead of
    /// the normal handler." Messages still reach `handleStoppingProcess` so
    /// an app can log/ignore them, but nothing else runs.
    async fn handle_stopping(&self, session: &Arc<Session>, update: &Update) {
        session.hooks().handle_stopping_process(session).await;
        if let Update::CallbackQuery(query) = update {
            let _ = session.transport().answer_callback_query(&query.query_id, Some(&self.config.stopping_text), true).await;
        }
    }

    /// Spec §7 "Permission denied": silently reject with no state change. A
    /// callback still needs an empty answer or the platform's client spins
    /// on the loading indicator.
    async fn handle_permission_denied(&self, session: &Arc<Session>, update: &Update) {
        if let Update::CallbackQuery(query) = update {
            let _ = session.transport().answer_callback_query(&query.query_id, None, false).await;
        }
    }

    async fn dispatch_message(&self, session: &Arc<Session>, message: IncomingMessage) -> Result<(), DispatchError> {
        if message.is_command() {
            let text = message.text.unwrap_or_default();
            let mut parts = text.splitn(2, ' ');
            let command = parts.next().unwrap_or_default();
            let args = parts.next().unwrap_or_default();
            session.hooks().handle_command(session, command, args).await;
            return Ok(());
        }
        if let Some(file_id) = &message.photo_file_id {
            if !session.forward_photo_to_active_page(file_id).await {
                session.hooks().handle_photo(session, file_id).await;
            }
            return Ok(());
        }
        if let Some(file_id) = &message.document_file_id {
            if !session.forward_document_to_active_page(file_id).await {
                session.hooks().handle_document(session, file_id).await;
            }
            return Ok(());
        }
        match &message.text {
            Some(text) => session.hooks().handle_message(session, text).await,
            None => session.hooks().handle_other_message(session).await,
        }
        Ok(())
    }

    async fn dispatch_callback_query(&self, session: &Arc<Session>, query: IncomingCallbackQuery) -> Result<(), DispatchError> {
        let invocation = CallbackInvocation {
            query_id: query.query_id.clone(),
            token: query.data.clone(),
            message_id: query.message_id,
            chat_id: query.chat_id,
        };
        let handled = session.callback_registry().invoke(invocation).await;
        if !handled {
            session.hooks().handle_rejected_callback(session, &query.query_id).await;
            let text = session.translate("callback.expired");
            session.transport().answer_callback_query(&query.query_id, Some(&text), false).await?;
        }
        Ok(())
    }

    async fn dispatch_pre_checkout_query(&self, session: &Arc<Session>, query: IncomingPreCheckoutQuery) -> Result<(), DispatchError> {
        session.hooks().handle_pre_checkout_query(session, &query.query_id).await;
        session.transport().answer_pre_checkout_query(&query.query_id, None).await?;
        Ok(())
    }
}

fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use botui_core::i18n::MapLocalizationPack;
    use botui_core::log::CapturingSink;
    use botui_core::resources::MapResourceLoader;
    use botui_transport::fake::{FakeBotClient, FakeCall};

    #[derive(Default)]
    struct RecordingHooks {
        permissive: AtomicBool,
        message_calls: Mutex<Vec<String>>,
        rejected_calls: Mutex<Vec<String>>,
        stopping_calls: AtomicBool,
    }

    impl RecordingHooks {
        fn permissive() -> Arc<Self> {
            Arc::new(Self { permissive: AtomicBool::new(true), ..Default::default() })
        }
        fn denying() -> Arc<Self> {
            Arc::new(Self { permissive: AtomicBool::new(false), ..Default::default() })
        }
    }

    #[async_trait]
    impl BotUserHooks for RecordingHooks {
        async fn handle_message(&self, _session: &Session, text: &str) {
            self.message_calls.lock().unwrap().push(text.to_string());
        }
        async fn handle_rejected_callback(&self, _session: &Session, query_id: &str) {
            self.rejected_calls.lock().unwrap().push(query_id.to_string());
        }
        async fn handle_stopping_process(&self, _session: &Session) {
            self.stopping_calls.store(true, Ordering::SeqCst);
        }
        async fn handle_permissive(&self, _session: &Session) -> bool {
            self.permissive.load(Ordering::SeqCst)
        }
    }

    fn dispatcher(transport: Arc<FakeBotClient>, hooks: Arc<RecordingHooks>, start_time: i64) -> Dispatcher {
        let page_manager = Arc::new(PageManager::new(Arc::new(MapResourceLoader::new())));
        Dispatcher::with_start_time(
            page_manager,
            transport,
            Arc::new(MapLocalizationPack::new()),
            RuntimeConfig::default(),
            Arc::new(move |_chat_id| hooks.clone() as Arc<dyn BotUserHooks>),
            Arc::new(CapturingSink::new()),
            start_time,
        )
    }

    #[tokio::test]
    async fn stale_message_is_dropped_before_a_session_is_created() {
        let hooks = RecordingHooks::permissive();
        let transport = Arc::new(FakeBotClient::new());
        let d = dispatcher(transport, hooks.clone(), 1_000);

        d.dispatch(Update::Message(IncomingMessage {
            chat_id: 1,
            message_id: 1,
            date: 500,
            text: Some("hi".into()),
            photo_file_id: None,
            document_file_id: None,
        }))
        .await;

        assert_eq!(d.sessions().len(), 0);
        assert!(hooks.message_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fresh_message_reaches_handle_message() {
        let hooks = RecordingHooks::permissive();
        let transport = Arc::new(FakeBotClient::new());
        let d = dispatcher(transport, hooks.clone(), 0);

        d.dispatch(Update::Message(IncomingMessage {
            chat_id: 1,
            message_id: 1,
            date: 1_000,
            text: Some("hello".into()),
            photo_file_id: None,
            document_file_id: None,
        }))
        .await;

        assert_eq!(hooks.message_calls.lock().unwrap().as_slice(), ["hello".to_string()]);
    }

    #[tokio::test]
    async fn unknown_callback_token_is_rejected_and_answered() {
        let hooks = RecordingHooks::permissive();
        let transport = Arc::new(FakeBotClient::new());
        let d = dispatcher(transport.clone(), hooks.clone(), 0);

        d.dispatch(Update::CallbackQuery(IncomingCallbackQuery {
            query_id: "q1".into(),
            chat_id: 1,
            message_id: 1,
            data: "stale_token".into(),
        }))
        .await;

        assert_eq!(hooks.rejected_calls.lock().unwrap().as_slice(), ["q1".to_string()]);
        let calls = transport.calls();
        assert!(matches!(calls.as_slice(), [FakeCall::AnswerCallback { query_id, .. }] if query_id == "q1"));
    }

    #[tokio::test]
    async fn permission_denied_runs_no_handler() {
        let hooks = RecordingHooks::denying();
        let transport = Arc::new(FakeBotClient::new());
        let d = dispatcher(transport.clone(), hooks.clone(), 0);

        d.dispatch(Update::Message(IncomingMessage {
            chat_id: 1,
            message_id: 1,
            date: 1_000,
            text: Some("hello".into()),
            photo_file_id: None,
            document_file_id: None,
        }))
        .await;

        assert!(hooks.message_calls.lock().unwrap().is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn stopping_process_answers_callback_with_stopping_text_instead_of_the_handler() {
        let hooks = RecordingHooks::permissive();
        let transport = Arc::new(FakeBotClient::new());
        let d = dispatcher(transport.clone(), hooks.clone(), 0);

        let session = d.session_for(1).await;
        session.safe_stop().request_stop();

        d.dispatch(Update::CallbackQuery(IncomingCallbackQuery {
            query_id: "q1".into(),
            chat_id: 1,
            message_id: 1,
            data: "any_token".into(),
        }))
        .await;

        assert!(hooks.stopping_calls.load(Ordering::SeqCst));
        let calls = transport.calls();
        assert!(matches!(
            calls.as_slice(),
            [FakeCall::AnswerCallback { text: Some(text), show_alert: true, .. }] if text == &d.config.stopping_text
        ));
    }
}
