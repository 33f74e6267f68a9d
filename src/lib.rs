//! Reference wiring for the chat-bot page runtime (SPEC_FULL §10): builds a
//! [`Dispatcher`] over the three demo pages in [`pages`], against whichever
//! `BotClient` the caller supplies. The demo binary (`src/main.rs`) and the
//! `tests/` integration suite both start from [`build_dispatcher`].

pub mod pages;

use std::sync::Arc;

use botui_core::config::RuntimeConfig;
use botui_core::i18n::MapLocalizationPack;
use botui_core::log::{LogSink, StderrSink};
use botui_core::resources::MapResourceLoader;
use botui_runtime::{BotUserHooks, Dispatcher, NoopHooks, PageManager};
use botui_transport::client::BotClient;

/// Builds a `Dispatcher` wired to the three reference pages, a fresh
/// `PageManager`, and the given transport. `start_time` pins the
/// skip-on-start watermark so tests don't depend on wall-clock time; the
/// demo binary uses [`build_dispatcher`] instead, which stamps real time.
pub fn build_dispatcher_at(transport: Arc<dyn BotClient>, start_time: i64) -> Dispatcher {
    let mut manager = PageManager::new(Arc::new(MapResourceLoader::new()));
    pages::register_all(&mut manager);

    let hooks_factory: botui_runtime::HooksFactory = Arc::new(|_chat_id| Arc::new(NoopHooks) as Arc<dyn BotUserHooks>);
    let log_sink: Arc<dyn LogSink> = Arc::new(StderrSink);

    Dispatcher::with_start_time(
        Arc::new(manager),
        transport,
        Arc::new(MapLocalizationPack::new()),
        RuntimeConfig::default(),
        hooks_factory,
        log_sink,
        start_time,
    )
}

/// As [`build_dispatcher_at`], stamping the current time as the
/// skip-on-start watermark (spec §5).
pub fn build_dispatcher(transport: Arc<dyn BotClient>) -> Dispatcher {
    let mut manager = PageManager::new(Arc::new(MapResourceLoader::new()));
    pages::register_all(&mut manager);

    let hooks_factory: botui_runtime::HooksFactory = Arc::new(|_chat_id| Arc::new(NoopHooks) as Arc<dyn BotUserHooks>);
    let log_sink: Arc<dyn LogSink> = Arc::new(StderrSink);

    Dispatcher::new(Arc::new(manager), transport, Arc::new(MapLocalizationPack::new()), RuntimeConfig::default(), hooks_factory, log_sink)
}
