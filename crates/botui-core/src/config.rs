//! Runtime configuration.
//!
//! Collects the page runtime's knobs (clear-cache time, active-page
//! capacity, skip-on-start, default back-button title) into one struct
//! rather than scattering bare constants through call sites.

use serde::Deserialize;

use crate::constants::{
    DEFAULT_ACTIVE_PAGES_CAPACITY, DEFAULT_CLEAR_CACHE_TIME_SECS, DEFAULT_STOPPING_TEXT,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Idle duration (seconds) before a cached session is evicted.
    pub clear_cache_time_secs: u64,
    /// Bound on the bot-user's MRU `activePages` list.
    pub active_pages_capacity: usize,
    /// Drop updates whose timestamp precedes worker start.
    pub skip_on_start: bool,
    /// Default title for the auto-generated back button.
    pub default_back_title: String,
    /// Text shown on a click during safe-stop drain.
    pub stopping_text: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            clear_cache_time_secs: DEFAULT_CLEAR_CACHE_TIME_SECS,
            active_pages_capacity: DEFAULT_ACTIVE_PAGES_CAPACITY,
            skip_on_start: true,
            default_back_title: "« Back".to_string(),
            stopping_text: DEFAULT_STOPPING_TEXT.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Parse from a YAML document. Any field omitted keeps its default.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.clear_cache_time_secs, 24 * 60 * 60);
        assert_eq!(cfg.active_pages_capacity, 10);
        assert!(cfg.skip_on_start);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg = RuntimeConfig::from_yaml("active_pages_capacity: 3\n").unwrap();
        assert_eq!(cfg.active_pages_capacity, 3);
        assert_eq!(cfg.clear_cache_time_secs, 24 * 60 * 60);
    }
}
