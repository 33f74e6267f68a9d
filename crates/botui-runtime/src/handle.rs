//! `PageHandle` (spec §4.7): the navigation-tree node controlling a
//! `ScriptPage`'s lifetime. Disposing a handle cascades to every
//! transitive descendant in reverse insertion order before disposing
//! itself and detaching from its parent.

use std::sync::{Arc, Mutex, Weak};

use crate::error::DispatchError;
use crate::script_page::ScriptPage;

struct Inner {
    page: Arc<ScriptPage>,
    parent: Option<Weak<Inner>>,
    children: Mutex<Vec<PageHandle>>,
    disposed: Mutex<bool>,
}

/// Strong reference to a live node in the navigation tree. Cloning is
/// cheap (an `Arc` bump) and every clone observes the same disposal state.
#[derive(Clone)]
pub struct PageHandle(Arc<Inner>);

/// A non-owning reference back to a `PageHandle`, held by the `UiHost`
/// implementation that was constructed *before* the handle existed (the
/// `ScriptContext` needs a host at construction time, but the handle wraps
/// the `ScriptPage` the context belongs to) — see `PageRuntimeHost::bind`.
#[derive(Clone, Default)]
pub struct PageHandleWeak(Option<Weak<Inner>>);

impl PageHandleWeak {
    pub fn upgrade(&self) -> Option<PageHandle> {
        self.0.as_ref()?.upgrade().map(PageHandle)
    }
}

impl PageHandle {
    /// Registers with `parent`'s children list, if one is given (spec §4.7
    /// "`new(page, parent?)` auto-registers with parent's children").
    pub fn new(page: Arc<ScriptPage>, parent: Option<&PageHandle>) -> Self {
        let inner = Arc::new(Inner {
            page,
            parent: parent.map(|p| Arc::downgrade(&p.0)),
            children: Mutex::new(Vec::new()),
            disposed: Mutex::new(false),
        });
        let handle = PageHandle(inner);
        if let Some(parent) = parent {
            parent.0.children.lock().unwrap().push(handle.clone());
        }
        handle
    }

    pub fn downgrade(&self) -> PageHandleWeak {
        PageHandleWeak(Some(Arc::downgrade(&self.0)))
    }

    pub fn page(&self) -> &Arc<ScriptPage> {
        &self.0.page
    }

    pub fn parent(&self) -> Option<PageHandle> {
        self.0.parent.as_ref()?.upgrade().map(PageHandle)
    }

    pub fn is_disposed(&self) -> bool {
        *self.0.disposed.lock().unwrap()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.lock().unwrap().len()
    }

    /// Disposes every descendant in reverse insertion order, then this
    /// handle's own page (triggering `onUnmounted`, element disposal,
    /// view-model disposal), then detaches from the parent's child list.
    /// Idempotent: a second call on an already-disposed handle is a no-op.
    pub async fn dispose(&self) {
        {
            let mut disposed = self.0.disposed.lock().unwrap();
            if *disposed {
                return;
            }
            *disposed = true;
        }
        let children: Vec<PageHandle> = std::mem::take(&mut *self.0.children.lock().unwrap());
        for child in children.into_iter().rev() {
            Box::pin(child.dispose()).await;
        }
        self.0.page.on_disposed().await;
        if let Some(parent) = self.parent() {
            let mut siblings = parent.0.children.lock().unwrap();
            siblings.retain(|c| !Arc::ptr_eq(&c.0, &self.0));
        }
    }

    /// Deletes the chat message backing this page, then disposes (spec
    /// §4.7 `close()`). The dispose cascade still runs even if the delete
    /// call itself fails (message already gone, etc.) — only the error is
    /// reported back to the caller.
    pub async fn close(&self) -> Result<(), DispatchError> {
        let result = self.0.page.delete_message().await;
        self.dispose().await;
        result
    }

    /// Edits the current message to show the parent page, then disposes
    /// this handle (spec §4.7 `back()`).
    pub async fn back(&self) -> Result<(), DispatchError> {
        let Some(parent) = self.parent() else {
            return Err(DispatchError::UnknownPage("no parent page to go back to".to_string()));
        };
        let message = self.0.page.current_message();
        parent.page().render_into(message).await?;
        self.dispose().await;
        Ok(())
    }

    /// Re-renders this page's own message in place (spec §4.7 `update()`).
    pub async fn update(&self) -> Result<(), DispatchError> {
        let message = self.0.page.current_message();
        self.0.page.render_into(message).await
    }

    /// Disposes every current child without disposing this handle itself
    /// (spec §4.2 `navigateFresh`: clear this page's subtree before
    /// opening the new target in its place).
    pub async fn dispose_children(&self) {
        let children: Vec<PageHandle> = std::mem::take(&mut *self.0.children.lock().unwrap());
        for child in children.into_iter().rev() {
            Box::pin(child.dispose()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script_page::test_support::dummy_page;

    #[tokio::test]
    async fn dispose_is_idempotent() {
        let handle = PageHandle::new(dummy_page("a"), None);
        handle.dispose().await;
        assert!(handle.is_disposed());
        handle.dispose().await;
        assert!(handle.is_disposed());
    }

    #[tokio::test]
    async fn disposing_parent_cascades_to_children_in_reverse_order() {
        let root = PageHandle::new(dummy_page("root"), None);
        let child_a = PageHandle::new(dummy_page("a"), Some(&root));
        let child_b = PageHandle::new(dummy_page("b"), Some(&root));
        assert_eq!(root.child_count(), 2);

        root.dispose().await;

        assert!(root.is_disposed());
        assert!(child_a.is_disposed());
        assert!(child_b.is_disposed());
        let order = crate::script_page::test_support::unmount_order();
        assert_eq!(order, vec!["b", "a", "root"]);
    }

    #[tokio::test]
    async fn disposing_a_child_detaches_it_from_the_parents_children() {
        let root = PageHandle::new(dummy_page("root"), None);
        let child = PageHandle::new(dummy_page("child"), Some(&root));
        assert_eq!(root.child_count(), 1);
        child.dispose().await;
        assert_eq!(root.child_count(), 0);
    }

    #[tokio::test]
    async fn weak_handle_upgrades_while_alive_and_fails_after_drop() {
        let handle = PageHandle::new(dummy_page("x"), None);
        let weak = handle.downgrade();
        assert!(weak.upgrade().is_some());
        drop(handle);
        assert!(weak.upgrade().is_none());
    }
}
