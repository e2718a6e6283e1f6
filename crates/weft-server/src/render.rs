//! Headless full-string rendering.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use weft_core::{
    pipeline, Component, Dispatcher, InstanceId, LifecycleRegistry, PropsMap, RenderHandle,
    ResolvedProbe, WeftError,
};
use weft_dom::{to_html, NodeId, NullSink, VElement, VNode};

use crate::options::RenderOptions;

/// Failure of a detached render. There is no rescue handling on a cold
/// render: a pipeline abort surfaces directly to the caller.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A transformer aborted the pipeline.
    #[error(transparent)]
    Pipeline(#[from] WeftError),
}

/// Host element plus the view output it wraps, pre-serialization.
pub(crate) struct Rendered {
    pub(crate) host: VElement,
    pub(crate) children: Vec<VNode>,
}

/// Render a component to a full HTML string, detached from any live
/// document.
///
/// The pipeline and view run exactly as on the client; the output wraps the
/// view children in a declarative shadow boundary on the host element:
///
/// ```html
/// <x-greet class="resolved" data-weft name="Ada">
///   <template shadowroot="open"><p>Hi Ada</p></template>
/// </x-greet>
/// ```
pub async fn render(
    component: &Component,
    props: PropsMap,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let rendered = materialize(component, props, options).await?;
    Ok(to_html(&assemble(rendered)))
}

/// Wrap the view children in the declarative shadow boundary.
pub(crate) fn assemble(rendered: Rendered) -> VNode {
    let template = VElement::new("template")
        .attr("shadowroot", "open")
        .children(rendered.children)
        .build();
    rendered.host.child(template).build()
}

/// Run the pipeline for a detached instance and produce the host element
/// and view children. No diffing: a cold render has no previous state, so
/// the tree is materialized directly.
pub(crate) async fn materialize(
    component: &Component,
    props: PropsMap,
    options: &RenderOptions,
) -> Result<Rendered, RenderError> {
    let instance = InstanceId::next();
    let mut lifecycle = LifecycleRegistry::new();

    // The render queue and event sink have nowhere to deliver here;
    // transformers scheduling or dispatching against them is a no-op.
    let (queue_tx, _queue_rx) = mpsc::unbounded_channel();
    let render = RenderHandle::new(instance, queue_tx);
    let dispatch = Dispatcher::new(NodeId::next(), Arc::new(NullSink));
    let (resolved_tx, probe) = ResolvedProbe::pair();

    let attrs = serialize_attrs(&props);
    let initial = lifecycle.initial_props(
        instance,
        props,
        attrs.clone(),
        render,
        dispatch,
        probe,
        Some(options.to_config()),
    );

    let final_props =
        pipeline::run(&mut lifecycle, instance, component.transforms(), initial).await?;
    let children = component.render_view(&final_props);
    let _ = resolved_tx.send(true);

    let mut host = VElement::new(component.tag())
        .attr("data-weft", "")
        .attr("class", "resolved");
    if let Some(extends) = component.extends() {
        host = host.attr("is", extends);
    }
    for (name, value) in attrs {
        host = host.attr(name, value);
    }

    Ok(Rendered { host, children })
}

/// Serialize prop overrides into host-element attributes: the attribute
/// surface is the string form of the props passed to the render.
fn serialize_attrs(props: &PropsMap) -> BTreeMap<String, String> {
    props
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let serialized = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            (name.clone(), serialized)
        })
        .collect()
}
