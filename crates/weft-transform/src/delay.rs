//! Artificial pipeline suspension.

use std::sync::Arc;
use std::time::Duration;

use weft_core::{transform_fn, Transform};

/// Suspend the pipeline for a duration before passing the snapshot through
/// untouched. Useful for demonstrating that sequencing holds across
/// suspension points, and for simulating slow stages in tests.
pub fn delay(duration: Duration) -> Arc<dyn Transform> {
    transform_fn(move |props| async move {
        tokio::time::sleep(duration).await;
        Ok(props)
    })
}
