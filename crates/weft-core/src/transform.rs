//! A single pipeline stage: `(props) -> props'`, possibly suspending.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransformError;
use crate::props::Props;

/// One unit of the props pipeline. Stages are invoked strictly in
/// declaration order and never concurrently within one pass.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Consume the predecessor's snapshot and yield the successor's.
    async fn apply(&self, props: Props) -> Result<Props, TransformError>;
}

/// Adapter turning an async closure into a [`Transform`].
pub struct FnTransform<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Transform for FnTransform<F>
where
    F: Fn(Props) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Props, TransformError>> + Send,
{
    async fn apply(&self, props: Props) -> Result<Props, TransformError> {
        (self.f)(props).await
    }
}

/// Wrap an async closure as a shareable pipeline stage.
pub fn transform_fn<F, Fut>(f: F) -> Arc<dyn Transform>
where
    F: Fn(Props) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Props, TransformError>> + Send + 'static,
{
    Arc::new(FnTransform { f })
}
