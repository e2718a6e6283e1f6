//! Recoverable-error escape hatch.
//!
//! A failure in one transformer aborts the pass, not the instance: if a
//! stage registered a rescue handler, the instance transitions to the
//! rescuing state and the handler is invoked with a restart capability;
//! otherwise the error is reported on the diagnostic side-channel and the
//! instance stays normal and usable.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::WeftError;
use crate::lifecycle::{InstanceState, LifecycleRegistry, StateCell};
use crate::props::{InstanceId, PropsMap, RenderHandle};

/// Props handed to a rescue handler: the snapshot the handler was
/// registered with (plus an `error` field), and the restart capability.
#[derive(Debug, Clone)]
pub struct RescueProps {
    /// Registration-time values with `error` merged in.
    pub values: PropsMap,
    /// The failure message.
    pub error: String,
    /// Re-enter the pipeline and return to normal.
    pub restart: Restart,
}

/// Restart capability: flips the instance back to normal and re-enters the
/// pipeline with caller-supplied override props.
#[derive(Debug, Clone)]
pub struct Restart {
    state: StateCell,
    render: RenderHandle,
}

impl Restart {
    pub(crate) fn new(state: StateCell, render: RenderHandle) -> Self {
        Self { state, render }
    }

    /// Restart with no overrides.
    pub fn restart(&self) {
        self.restart_with(PropsMap::new());
    }

    /// Restart with override props merged into the next pass.
    pub fn restart_with(&self, overrides: PropsMap) {
        self.state.set(InstanceState::Normal);
        self.render.schedule_with(overrides);
    }
}

/// The per-instance error-recovery callback.
///
/// The slot is an infallible plain callback, so "the handler itself throws"
/// cannot arise in this design.
#[derive(Clone)]
pub struct RescueHandler(Arc<dyn Fn(RescueProps) + Send + Sync>);

impl RescueHandler {
    /// Wrap a callback.
    pub fn new(handler: impl Fn(RescueProps) + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    /// Invoke the callback.
    pub fn invoke(&self, props: RescueProps) {
        (self.0)(props);
    }
}

impl fmt::Debug for RescueHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RescueHandler(..)")
    }
}

/// Route a failed pass through the instance's registered handler, or report
/// it on the diagnostic side-channel when none is registered.
pub fn handle_error(
    lifecycle: &mut LifecycleRegistry,
    instance: InstanceId,
    error: &WeftError,
    render: RenderHandle,
) {
    let Some(entry) = lifecycle.rescue(instance) else {
        tracing::error!(instance = %instance, error = %error, "pipeline failed with no rescue handler");
        return;
    };

    lifecycle.annotate_error(instance, &error.to_string());
    let state = lifecycle.state_cell(instance);
    state.set(InstanceState::Rescuing);

    let mut values = entry.values.clone();
    values.insert("error".to_string(), Value::String(error.to_string()));

    entry.handler.invoke(RescueProps {
        values,
        error: error.to_string(),
        restart: Restart::new(state, render),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    fn failure() -> WeftError {
        WeftError::Pipeline {
            stage: 1,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_no_handler_keeps_instance_normal() {
        let mut lifecycle = LifecycleRegistry::new();
        let instance = InstanceId::next();
        let (tx, _rx) = mpsc::unbounded_channel();

        handle_error(
            &mut lifecycle,
            instance,
            &failure(),
            RenderHandle::new(instance, tx),
        );

        assert_eq!(lifecycle.state(instance), InstanceState::Normal);
    }

    #[test]
    fn test_handler_receives_error_and_rescuing_state() {
        let mut lifecycle = LifecycleRegistry::new();
        let instance = InstanceId::next();
        let (tx, _rx) = mpsc::unbounded_channel();
        let seen = Arc::new(Mutex::new(None));
        let seen_in_handler = Arc::clone(&seen);

        lifecycle.set_rescue(
            instance,
            RescueHandler::new(move |props| {
                *seen_in_handler.lock().unwrap() = Some(props.values.clone());
            }),
            PropsMap::from([("name".to_string(), json!("Ada"))]),
        );
        handle_error(
            &mut lifecycle,
            instance,
            &failure(),
            RenderHandle::new(instance, tx),
        );

        assert_eq!(lifecycle.state(instance), InstanceState::Rescuing);
        let values = seen.lock().unwrap().clone().expect("handler invoked");
        assert_eq!(values.get("name"), Some(&json!("Ada")));
        assert_eq!(
            values.get("error"),
            Some(&json!("pipeline stage 1 failed: boom"))
        );
        // The stored previous snapshot gains the error field too.
        let prev = lifecycle.previous(instance).unwrap();
        assert!(prev.contains_key("error"));
    }

    #[test]
    fn test_restart_returns_to_normal_and_schedules_pass() {
        let mut lifecycle = LifecycleRegistry::new();
        let instance = InstanceId::next();
        let (tx, mut rx) = mpsc::unbounded_channel();

        lifecycle.set_rescue(
            instance,
            RescueHandler::new(move |props| {
                props
                    .restart
                    .restart_with(PropsMap::from([("retry".to_string(), json!(true))]));
            }),
            PropsMap::new(),
        );
        handle_error(
            &mut lifecycle,
            instance,
            &failure(),
            RenderHandle::new(instance, tx),
        );

        assert_eq!(lifecycle.state(instance), InstanceState::Normal);
        let request = rx.try_recv().expect("restart scheduled a pass");
        assert_eq!(request.instance, instance);
        assert_eq!(request.overrides.get("retry"), Some(&json!(true)));
    }
}
