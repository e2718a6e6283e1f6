//! The client host: a live document plus the registries and render queue.
//!
//! All rendering for a runtime happens through `&mut self`, so passes are
//! cooperatively scheduled and strictly serialized: a re-render triggered
//! while a pass is in flight (a store notification, a rescue restart) lands
//! on the queue and runs only after the prior pass has committed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use weft_dom::{reconcile, DomEvent, EventSink, LiveNode, NodeId, NullSink};

use crate::component::{Component, ComponentBuilder};
use crate::error::WeftError;
use crate::lifecycle::LifecycleRegistry;
use crate::pipeline;
use crate::props::{
    Dispatcher, InstanceId, PropsMap, RenderHandle, RenderRequest, ResolvedProbe,
};
use crate::registry::ComponentRegistry;
use crate::rescue;

struct Mounted {
    component: Arc<Component>,
    host: NodeId,
}

/// Client runtime hosting mounted component instances.
pub struct Runtime {
    components: ComponentRegistry,
    lifecycle: LifecycleRegistry,
    document: LiveNode,
    sink: Arc<dyn EventSink>,
    queue_tx: mpsc::UnboundedSender<RenderRequest>,
    queue_rx: mpsc::UnboundedReceiver<RenderRequest>,
    mounted: HashMap<InstanceId, Mounted>,
}

impl Runtime {
    /// Create a runtime with an event sink that drops events.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(NullSink))
    }

    /// Create a runtime dispatching events to the given sink.
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            components: ComponentRegistry::new(),
            lifecycle: LifecycleRegistry::new(),
            document: LiveNode::element("document"),
            sink,
            queue_tx,
            queue_rx,
            mounted: HashMap::new(),
        }
    }

    /// Register a component; see [`ComponentRegistry::create`].
    pub fn create(&mut self, name: &str, builder: ComponentBuilder) -> Arc<Component> {
        self.components.create(name, builder)
    }

    /// The live document root.
    pub fn document(&self) -> &LiveNode {
        &self.document
    }

    /// The lifecycle registry (inspection only).
    pub fn lifecycle(&self) -> &LifecycleRegistry {
        &self.lifecycle
    }

    /// The host node of a mounted instance.
    pub fn host(&self, instance: InstanceId) -> Option<&LiveNode> {
        let mounted = self.mounted.get(&instance)?;
        self.document.find(mounted.host)
    }

    /// Mount an instance of a registered component into the document, with
    /// the given serialized host attributes, and run its first pass.
    pub async fn mount(
        &mut self,
        tag: &str,
        attrs: BTreeMap<String, String>,
    ) -> Result<InstanceId, WeftError> {
        let component = self
            .components
            .get(tag)
            .ok_or_else(|| WeftError::UnknownComponent(tag.to_string()))?;

        let mut host = LiveNode::element(component.tag());
        host.set_attr("data-weft", "");
        if let Some(extends) = component.extends() {
            host.set_attr("is", extends);
        }
        for (name, value) in &attrs {
            host.set_attr(name, value);
        }
        // The host is a boundary: ancestors' reconciliation must not touch it.
        host.set_managed(true);
        let host_id = host.id();
        self.document.append(host);

        let instance = InstanceId::next();
        self.mounted.insert(instance, Mounted { component, host: host_id });
        tracing::debug!(instance = %instance, tag, "mounted");

        self.render_pass(instance, PropsMap::new()).await;
        self.drain().await;
        Ok(instance)
    }

    /// Explicitly re-render an instance with override props.
    pub async fn rerender(
        &mut self,
        instance: InstanceId,
        overrides: PropsMap,
    ) -> Result<(), WeftError> {
        if !self.mounted.contains_key(&instance) {
            return Err(WeftError::UnknownInstance(instance));
        }
        self.render_pass(instance, overrides).await;
        self.drain().await;
        Ok(())
    }

    /// Tear an instance down: dispatch destroy notifications for its
    /// subtree, detach the host node, and purge its lifecycle entry.
    pub fn unmount(&mut self, instance: InstanceId) -> Result<(), WeftError> {
        let mounted = self
            .mounted
            .remove(&instance)
            .ok_or(WeftError::UnknownInstance(instance))?;

        if let Some(children) = self.document.children_mut() {
            if let Some(position) = children.iter().position(|c| c.id() == mounted.host) {
                let host = children.remove(position);
                dispatch_destroyed(&host, self.sink.as_ref());
            }
        }
        self.lifecycle.remove(instance);
        tracing::debug!(instance = %instance, "unmounted");
        Ok(())
    }

    /// Run one pipeline pass for an instance and reconcile its boundary.
    ///
    /// A transformer failure is not fatal here: it is routed through the
    /// rescue machinery and the previously rendered output stays live.
    async fn render_pass(&mut self, instance: InstanceId, overrides: PropsMap) {
        // The instance may have been unmounted while the request was queued.
        let Some(mounted) = self.mounted.get(&instance) else {
            tracing::debug!(instance = %instance, "dropping pass for unmounted instance");
            return;
        };
        let component = Arc::clone(&mounted.component);
        let host_id = mounted.host;

        let attrs = self
            .document
            .find(host_id)
            .and_then(|host| host.attrs().cloned())
            .unwrap_or_default();

        let (resolved_tx, probe) = ResolvedProbe::pair();
        let render = RenderHandle::new(instance, self.queue_tx.clone());
        let dispatch = Dispatcher::new(host_id, Arc::clone(&self.sink));
        let initial = self.lifecycle.initial_props(
            instance,
            overrides,
            attrs,
            render.clone(),
            dispatch,
            probe,
            None,
        );

        match pipeline::run(&mut self.lifecycle, instance, component.transforms(), initial).await {
            Ok(props) => {
                let tree = component.render_view(&props);
                let sink = Arc::clone(&self.sink);
                let host = self
                    .document
                    .find_mut(host_id)
                    .expect("host node present while mounted");
                reconcile(host, &tree, sink.as_ref());
                let _ = resolved_tx.send(true);
            }
            Err(err) => {
                rescue::handle_error(&mut self.lifecycle, instance, &err, render);
            }
        }
    }

    /// Run render requests scheduled from outside a pass: store
    /// notifications, rescue restarts, any [`RenderHandle::schedule`] fired
    /// after the triggering pass completed. Hosts call this whenever their
    /// event loop turns; without it externally scheduled passes sit on the
    /// queue forever.
    pub async fn process_pending(&mut self) {
        self.drain().await;
    }

    /// Process queued re-render requests, in order, one pass at a time.
    async fn drain(&mut self) {
        while let Ok(request) = self.queue_rx.try_recv() {
            self.render_pass(request.instance, request.overrides).await;
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch_destroyed(node: &LiveNode, sink: &dyn EventSink) {
    sink.dispatch(DomEvent::new("destroy", node.id(), json!({})));
    for child in node.children() {
        dispatch_destroyed(child, sink);
    }
}
