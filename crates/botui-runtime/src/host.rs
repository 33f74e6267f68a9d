//! `PageRuntimeHost`: the concrete `UiHost`/`UserHost` a `ScriptPage`'s
//! `ScriptContext` is built against (spec §4.2).
//!
//! Constructed *before* the `PageHandle`/`ScriptPage` it will eventually
//! back exist (the `ScriptContext` needs a host at construction time), so
//! it holds its handle behind a [`PageHandleWeak`] slot that starts empty
//! and is filled in by `PageManager::build_page` once the handle is
//! created — see module docs on `handle.rs`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use botui_core::log::Level;
use botui_script::{ScriptError, UiHost, UserHost};
use botui_transport::client::ParseMode;

use crate::error::DispatchError;
use crate::handle::{PageHandle, PageHandleWeak};
use crate::session::Session;

pub struct PageRuntimeHost {
    session: Weak<Session>,
    handle: Mutex<PageHandleWeak>,
    current_callback_query_id: Mutex<Option<String>>,
    navigated: AtomicBool,
    /// Backs `User.send`/`edit`/`delete`: the ad-hoc message those calls
    /// operate on, separate from the page's own rendered message.
    last_user_message: Mutex<Option<i64>>,
}

impl PageRuntimeHost {
    pub fn new(session: Weak<Session>) -> Arc<Self> {
        Arc::new(Self {
            session,
            handle: Mutex::new(PageHandleWeak::default()),
            current_callback_query_id: Mutex::new(None),
            navigated: AtomicBool::new(false),
            last_user_message: Mutex::new(None),
        })
    }

    /// A host with no session behind it, for standalone `ScriptPage` unit
    /// tests that never touch transport.
    pub fn detached() -> Arc<Self> {
        Self::new(Weak::new())
    }

    /// Binds the (now-constructed) handle this host backs. Called once,
    /// right after `PageHandle::new`.
    pub fn bind(&self, handle: PageHandleWeak) {
        *self.handle.lock().unwrap() = handle;
    }

    pub fn handle(&self) -> Option<PageHandle> {
        self.handle.lock().unwrap().upgrade()
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.upgrade()
    }

    fn session_or_err(&self) -> Result<Arc<Session>, DispatchError> {
        self.session().ok_or_else(|| DispatchError::UnknownPage("session no longer live".to_string()))
    }

    fn handle_or_err(&self) -> Result<PageHandle, DispatchError> {
        self.handle().ok_or_else(|| DispatchError::UnknownPage("page handle not bound".to_string()))
    }

    pub fn set_current_callback_query_id(&self, id: Option<String>) {
        *self.current_callback_query_id.lock().unwrap() = id;
    }

    pub fn current_callback_query_id(&self) -> Option<String> {
        self.current_callback_query_id.lock().unwrap().clone()
    }

    /// Shared by `UiHost::navigate`/`navigate_fresh` (spec §4.2, §4.5 Open
    /// "calls `scriptPage.navigateTo(target, subPage)`"): builds the target
    /// page, checks cross-format compatibility against the current
    /// message, pushes it as a child of the current handle and edits the
    /// same message in place. `fresh` additionally disposes the current
    /// handle's existing children first.
    async fn navigate_impl(&self, page_id: &str, props: Option<serde_json::Value>, fresh: bool) -> Result<(), DispatchError> {
        let session = self.session_or_err()?;
        let handle = self.handle_or_err()?;
        let target_def = session.page_manager().definition(page_id)?;

        let current_message = handle.page().current_message();
        if current_message.is_some() {
            let from_text = handle.page().definition().is_text_format();
            let to_text = target_def.is_text_format();
            if from_text != to_text {
                let from = if from_text { "text" } else { "media" };
                let to = if to_text { "text" } else { "media" };
                return Err(DispatchError::Page(botui_core::error::PageError::IncompatibleNavigation { from, to }));
            }
        }

        if fresh {
            handle.dispose_children().await;
        }

        let new_page = session.page_manager().build_page(&session, page_id, props).await?;
        let new_handle = PageHandle::new(new_page.clone(), Some(&handle));
        new_page.host().bind(new_handle.downgrade());
        new_page.render_into(current_message).await?;
        Ok(())
    }

    async fn toast_impl(&self, text: &str, show_alert: bool) -> Result<(), DispatchError> {
        let session = self.session_or_err()?;
        let Some(query_id) = self.current_callback_query_id() else { return Ok(()) };
        session.transport().answer_callback_query(&query_id, Some(text), show_alert).await?;
        Ok(())
    }
}

#[async_trait]
impl UiHost for PageRuntimeHost {
    async fn refresh(&self) -> Result<(), ScriptError> {
        self.handle_or_err().map_err(ScriptError::from)?.update().await.map_err(Into::into)
    }

    async fn navigate(&self, page_id: &str, _sub_page: Option<String>, props: Option<serde_json::Value>) -> Result<(), ScriptError> {
        self.navigate_impl(page_id, props, false).await.map_err(Into::into)
    }

    async fn navigate_fresh(&self, page_id: &str, _sub_page: Option<String>, props: Option<serde_json::Value>) -> Result<(), ScriptError> {
        self.navigate_impl(page_id, props, true).await.map_err(Into::into)
    }

    /// Always opens a brand-new root page as a fresh message, registered
    /// into the session's MRU `activePages` (spec §4.8, §9: distinct from
    /// `navigate`, which edits the current message in place).
    async fn send_page(&self, page_id: &str) -> Result<(), ScriptError> {
        let result: Result<(), DispatchError> = async {
            let session = self.session_or_err()?;
            let new_page = session.page_manager().build_page(&session, page_id, None).await?;
            let new_handle = PageHandle::new(new_page.clone(), None);
            new_page.host().bind(new_handle.downgrade());
            new_page.render_into(None).await?;
            session.push_active_page(new_handle).await;
            Ok(())
        }
        .await;
        result.map_err(Into::into)
    }

    async fn back(&self) -> Result<(), ScriptError> {
        self.handle_or_err().map_err(ScriptError::from)?.back().await.map_err(Into::into)
    }

    async fn close(&self) -> Result<(), ScriptError> {
        self.handle_or_err().map_err(ScriptError::from)?.close().await.map_err(Into::into)
    }

    async fn dispose(&self) -> Result<(), ScriptError> {
        self.handle_or_err().map_err(ScriptError::from)?.dispose().await;
        Ok(())
    }

    async fn clear_keyboard(&self) -> Result<(), ScriptError> {
        let result: Result<(), DispatchError> = async {
            let session = self.session_or_err()?;
            let handle = self.handle_or_err()?;
            let Some(message) = handle.page().current_message() else { return Ok(()) };
            session.transport().edit_message_reply_markup(session.chat_id(), message.message_id, None).await?;
            Ok(())
        }
        .await;
        result.map_err(Into::into)
    }

    async fn toast(&self, text: &str) -> Result<(), ScriptError> {
        self.toast_impl(text, false).await.map_err(Into::into)
    }

    async fn alert(&self, text: &str) -> Result<(), ScriptError> {
        self.toast_impl(text, true).await.map_err(Into::into)
    }

    async fn status(&self, kind: &str) -> Result<(), ScriptError> {
        let result: Result<(), DispatchError> = async {
            let session = self.session_or_err()?;
            session.transport().send_chat_action(session.chat_id(), kind).await?;
            Ok(())
        }
        .await;
        result.map_err(Into::into)
    }

    async fn next_page(&self) -> Result<(), ScriptError> {
        if let Some(handle) = self.handle() {
            handle.page().next_page();
        }
        Ok(())
    }

    async fn prev_page(&self) -> Result<(), ScriptError> {
        if let Some(handle) = self.handle() {
            handle.page().prev_page();
        }
        Ok(())
    }

    async fn go_to_page(&self, index: i64) -> Result<(), ScriptError> {
        if let Some(handle) = self.handle() {
            handle.page().go_to_page(index);
        }
        Ok(())
    }

    fn get_page_count(&self) -> i64 {
        self.handle().map(|h| h.page().page_count() as i64).unwrap_or(1)
    }

    fn get_current_page(&self) -> i64 {
        self.handle().map(|h| h.page().current_page() as i64).unwrap_or(0)
    }

    fn set_navigated(&self, navigated: bool) {
        self.navigated.store(navigated, Ordering::SeqCst);
    }

    fn navigated(&self) -> bool {
        self.navigated.load(Ordering::SeqCst)
    }

    fn set_callback_query_id(&self, id: Option<String>) {
        self.set_current_callback_query_id(id);
    }
}

#[async_trait]
impl UserHost for PageRuntimeHost {
    async fn send(&self, text: &str) -> Result<(), ScriptError> {
        let result: Result<(), DispatchError> = async {
            let session = self.session_or_err()?;
            let sent = session.transport().send_message(session.chat_id(), text, ParseMode::None, None, false).await?;
            *self.last_user_message.lock().unwrap() = Some(sent.message_id);
            Ok(())
        }
        .await;
        result.map_err(Into::into)
    }

    async fn edit(&self, text: &str) -> Result<(), ScriptError> {
        let result: Result<(), DispatchError> = async {
            let session = self.session_or_err()?;
            let Some(message_id) = *self.last_user_message.lock().unwrap() else {
                return Err(DispatchError::InvalidProps("User.edit called with no prior User.send message".to_string()));
            };
            session.transport().edit_message_text(session.chat_id(), message_id, text, ParseMode::None, None, false).await?;
            Ok(())
        }
        .await;
        result.map_err(Into::into)
    }

    async fn delete(&self) -> Result<(), ScriptError> {
        let result: Result<(), DispatchError> = async {
            let session = self.session_or_err()?;
            let Some(message_id) = self.last_user_message.lock().unwrap().take() else { return Ok(()) };
            session.transport().delete_message(session.chat_id(), message_id).await?;
            Ok(())
        }
        .await;
        result.map_err(Into::into)
    }

    fn chat_id(&self) -> i64 {
        self.session().map(|s| s.chat_id()).unwrap_or(0)
    }

    fn lang(&self) -> String {
        self.session().map(|s| s.lang()).unwrap_or_else(|| "en".to_string())
    }

    fn translate(&self, key: &str) -> String {
        self.session().map(|s| s.translate(key)).unwrap_or_else(|| format!("[[{key}]]"))
    }

    /// Last-resort sink (spec §7): neither a vmodel `handleErrorAsync` nor
    /// this method absorbed the error, so just log it.
    fn handle_error(&self, error: &ScriptError) {
        if let Some(session) = self.session() {
            session.log(Level::Error, "script", &error.to_string());
        }
    }
}
