//! Application use cases / business logic

pub mod dispatch;
pub mod render;

pub use dispatch::{DispatchConfig, DispatchCycle, Selection, advance, pending, select_next};
pub use render::{DEFAULT_CAPTION_LIMIT, RenderConfig, Renderer};
