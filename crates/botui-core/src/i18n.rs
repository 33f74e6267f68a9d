//! Localisation pack trait.
//!
//! Storage format and resource layout are deliberately out of scope here;
//! this module only specifies the lookup contract that `$t(key)` and the
//! `lang` attribute on an element/option drive against.

use std::collections::HashMap;

use crate::constants::missing_translation_marker;

/// A per-language translation pack. Implementations own however they load
/// and cache their backing store; this trait only needs a synchronous
/// lookup since templates render synchronously once bindings are frozen.
pub trait LocalizationPack: Send + Sync {
    /// Look up `key` in `lang`. `None` means "no pack for this language or
    /// no entry for this key" — callers apply the missing-key fallback.
    fn translate(&self, lang: &str, key: &str) -> Option<String>;
}

/// `$t(key)` lookup against a pack, applying the bracketed-key fallback
/// (`"[[key]]"`) for a missing translation (DESIGN.md Open Question).
pub fn lookup(pack: &dyn LocalizationPack, lang: &str, key: &str) -> String {
    pack.translate(lang, key).unwrap_or_else(|| missing_translation_marker(key))
}

/// In-memory pack keyed by `(lang, key) -> text`, used by tests and as a
/// trivial production pack for apps that don't need file-backed resources.
#[derive(Debug, Clone, Default)]
pub struct MapLocalizationPack {
    entries: HashMap<String, HashMap<String, String>>,
}

impl MapLocalizationPack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lang: impl Into<String>, key: impl Into<String>, text: impl Into<String>) {
        self.entries.entry(lang.into()).or_default().insert(key.into(), text.into());
    }
}

impl LocalizationPack for MapLocalizationPack {
    fn translate(&self, lang: &str, key: &str) -> Option<String> {
        self.entries.get(lang)?.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_falls_back_to_bracketed_marker() {
        let pack = MapLocalizationPack::new();
        assert_eq!(lookup(&pack, "en", "greeting"), "[[greeting]]");
    }

    #[test]
    fn present_key_returns_translation() {
        let mut pack = MapLocalizationPack::new();
        pack.insert("en", "greeting", "Hello");
        assert_eq!(lookup(&pack, "en", "greeting"), "Hello");
    }

    #[test]
    fn missing_language_falls_back_too() {
        let mut pack = MapLocalizationPack::new();
        pack.insert("en", "greeting", "Hello");
        assert_eq!(lookup(&pack, "fr", "greeting"), "[[greeting]]");
    }
}
