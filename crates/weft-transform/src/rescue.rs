//! Rescue-capability installation.

use std::sync::Arc;

use weft_core::{transform_fn, RescueHandler, RescueProps, Transform};

/// Install an error-recovery handler for the instance.
///
/// The handler is invoked if a later stage (or a later pass) fails, with
/// the last committed values, the error, and a restart capability. When
/// several stages install a handler in one pass, the last one wins.
pub fn rescue(handler: impl Fn(RescueProps) + Send + Sync + 'static) -> Arc<dyn Transform> {
    let handler = RescueHandler::new(handler);
    transform_fn(move |props| {
        let handler = handler.clone();
        async move { Ok(props.with_rescue(handler)) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use weft_core::{
        pipeline, transform_fn, Dispatcher, InstanceId, LifecycleRegistry, Props, PropsMap,
        RenderHandle, ResolvedProbe, TransformError,
    };
    use weft_dom::{NodeId, NullSink};

    fn snapshot(lifecycle: &mut LifecycleRegistry, instance: InstanceId) -> Props {
        let (tx, _rx) = mpsc::unbounded_channel();
        lifecycle.initial_props(
            instance,
            PropsMap::new(),
            Default::default(),
            RenderHandle::new(instance, tx),
            Dispatcher::new(NodeId::next(), Arc::new(NullSink)),
            ResolvedProbe::resolved_now(),
            None,
        )
    }

    #[tokio::test]
    async fn test_handler_is_registered_for_the_instance() {
        let mut lifecycle = LifecycleRegistry::new();
        let instance = InstanceId::next();
        let transforms = vec![rescue(|_| {})];

        let initial = snapshot(&mut lifecycle, instance);
        pipeline::run(&mut lifecycle, instance, &transforms, initial)
            .await
            .unwrap();

        assert!(lifecycle.rescue(instance).is_some());
    }

    #[tokio::test]
    async fn test_registered_handler_sees_error_and_values() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut lifecycle = LifecycleRegistry::new();
        let instance = InstanceId::next();
        lifecycle.commit(instance, PropsMap::from([("a".to_string(), json!(1))]));
        let transforms = vec![
            rescue(move |rescue_props| {
                sink.lock().unwrap().push(rescue_props.error.clone());
            }),
            transform_fn(|_| async move { Err(TransformError::new("exploded")) }),
        ];

        let initial = snapshot(&mut lifecycle, instance);
        let err = pipeline::run(&mut lifecycle, instance, &transforms, initial)
            .await
            .unwrap_err();

        let (render_tx, _render_rx) = mpsc::unbounded_channel();
        weft_core::handle_error(
            &mut lifecycle,
            instance,
            &err,
            RenderHandle::new(instance, render_tx),
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("exploded"));
    }
}
