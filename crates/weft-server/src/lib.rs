//! Detached server rendering for weft components.
//!
//! This crate provides the headless render entry points:
//! - `render` - Full-string output wrapped in a declarative shadow boundary
//! - `render_to_stream` - The same materialization as chunked output
//! - `preload` - Stylesheet-link extraction and rewriting for document heads
//! - `RenderOptions` - Explicit configuration threaded into each render

mod options;
mod preload;
mod render;
mod stream;

pub use options::RenderOptions;
pub use preload::preload;
pub use render::{render, RenderError};
pub use stream::{render_to_stream, RenderStream, StreamError};
