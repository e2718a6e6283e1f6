//! Boundary transformers for weft components.
//!
//! Each transformer is a ready-made pipeline stage:
//! - `attrs` - Typed parsing of host-element attributes into props
//! - `store` - External store binding with a one-shot subscription
//! - `rescue` - Installs the error-recovery capability
//! - `path` - Component-relative resource path resolution
//! - `style` - Stylesheet import node for a resolved path
//! - `delay` - Suspends the pipeline for a duration

mod attrs;
mod delay;
mod path;
mod rescue;
mod store;
mod style;

pub use attrs::{attrs, AttrType};
pub use delay::delay;
pub use path::path;
pub use rescue::rescue;
pub use store::{store, Store};
pub use style::style;
