//! Per-chat page lifecycle and update dispatch (spec §2-§5, §4.5, §4.7-§4.8):
//! `PageManager` builds live `ScriptPage`s from compiled `PageDefinition`s,
//! `PageHandle` owns their navigation-tree lifetime, `Session`/`SessionCache`
//! hold everything scoped to one chat, and `Dispatcher` is the entry point
//! that turns a `botui_transport::Update` into hook calls and re-renders.

pub mod critical_section;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod host;
pub mod keyboard;
pub mod page_manager;
pub mod script_page;
pub mod session;
pub mod session_cache;

pub use critical_section::{CriticalSectionGuard, SafeStop};
pub use dispatch::{Dispatcher, HooksFactory};
pub use error::DispatchError;
pub use handle::{PageHandle, PageHandleWeak};
pub use host::PageRuntimeHost;
pub use keyboard::{assemble_rows, to_reply_markup, with_back_row};
pub use page_manager::{PageManager, VModelFactory};
pub use script_page::{MessageRef, ScriptPage};
pub use session::{BotUserHooks, NoopHooks, Session};
pub use session_cache::{Clock, SessionCache, SystemClock};
