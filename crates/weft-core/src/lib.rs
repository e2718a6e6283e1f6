//! Props pipeline and client runtime for weft components.
//!
//! A component is an ordered chain of asynchronous props transformers plus a
//! view function. This crate provides:
//! - `Props` - The immutable-per-pass snapshot threaded through the pipeline
//! - `Transform` - A single pipeline stage
//! - `pipeline::run` - The ordered async reduction over a snapshot
//! - `LifecycleRegistry` - Per-instance previous props, rescue handler, and
//!   one-shot subscription guards, released on explicit teardown
//! - `ComponentRegistry` - Registration with collision renegotiation
//! - `Runtime` - The client host that mounts, reconciles, and serializes
//!   render passes per instance

mod component;
mod error;
mod lifecycle;
pub mod pipeline;
mod props;
mod registry;
mod rescue;
mod runtime;
mod transform;

pub use component::*;
pub use error::*;
pub use lifecycle::*;
pub use props::*;
pub use registry::*;
pub use rescue::*;
pub use runtime::*;
pub use transform::*;
