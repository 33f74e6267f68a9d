pub mod component_context;
pub mod context;
pub mod entities;
pub mod error;
pub mod hooks;
pub mod host;
mod template_bridge;

pub use component_context::ComponentContext;
pub use context::{BaseApi, ComponentLookup, ScriptContext, UiApi, UserApi};
pub use error::ScriptError;
pub use host::{UiHost, UserHost};

pub use rhai;
