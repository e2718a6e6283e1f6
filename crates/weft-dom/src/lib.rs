//! Tree primitives for weft components.
//!
//! This crate provides the output side of the framework:
//! - `VNode` - Declarative tree produced by view functions
//! - `LiveNode` - Live mutable tree patched in place on the client
//! - `reconcile` - Keyed diff-and-patch of a live boundary subtree
//! - `serialize` - Detached HTML string output for server rendering
//! - `DomEvent` / `EventSink` - Lifecycle and custom event dispatch

mod event;
mod live;
mod reconcile;
mod serialize;
mod vnode;

pub use event::*;
pub use live::*;
pub use reconcile::*;
pub use serialize::*;
pub use vnode::*;
