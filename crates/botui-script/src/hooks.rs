//! Lifecycle hook registrars (`onMounted`, `onUnmounted`, `beforeRender`,
//! `afterRender`, `onRefresh`, `onPhoto`, `onDocument`; spec §4.2). Each
//! registrar simply appends a callback; the runtime invokes them at the
//! matching point in a `ScriptPage`'s lifecycle.

use std::sync::{Arc, Mutex};

/// One named hook's callback list.
#[derive(Clone, Default)]
pub struct HookSlot(Arc<Mutex<Vec<rhai::FnPtr>>>);

impl HookSlot {
    pub fn push(&self, f: rhai::FnPtr) {
        self.0.lock().unwrap().push(f);
    }

    pub fn callbacks(&self) -> Vec<rhai::FnPtr> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Default)]
pub struct HookRegistry {
    pub on_mounted: HookSlot,
    pub on_unmounted: HookSlot,
    pub before_render: HookSlot,
    pub after_render: HookSlot,
    pub on_refresh: HookSlot,
    pub on_photo: HookSlot,
    pub on_document: HookSlot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_start_empty() {
        let registry = HookRegistry::default();
        assert!(registry.on_mounted.is_empty());
        assert!(registry.on_photo.is_empty());
    }
}
