//! The ordered asynchronous reduction over a props snapshot.

use std::sync::Arc;

use crate::error::WeftError;
use crate::lifecycle::LifecycleRegistry;
use crate::props::{InstanceId, Props, Rescue};
use crate::transform::Transform;

/// Run a component's transformer chain over the initial snapshot.
///
/// Stages run strictly in declaration order, each awaited before the next;
/// every stage receives the snapshot its predecessor produced, with the
/// pre-merge view frozen at stage entry. A stage that returns a rescue
/// capability replaces the instance's registered handler (last wins). On
/// success the final snapshot is committed as the instance's previous
/// props; a stage error aborts the remaining chain.
pub async fn run(
    lifecycle: &mut LifecycleRegistry,
    instance: InstanceId,
    transforms: &[Arc<dyn Transform>],
    initial: Props,
) -> Result<Props, WeftError> {
    let mut props = initial;

    for (stage, transform) in transforms.iter().enumerate() {
        props.begin_stage();
        props = transform
            .apply(props)
            .await
            .map_err(|err| WeftError::Pipeline {
                stage,
                message: err.to_string(),
            })?;

        if let Rescue::Handler(handler) = props.rescue() {
            lifecycle.set_rescue(instance, handler.clone(), props.values().clone());
        }
    }

    lifecycle.commit(instance, props.values().clone());
    Ok(props)
}
