//! The props snapshot threaded through the pipeline.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use weft_dom::{DomEvent, EventSink, NodeId};

use crate::rescue::RescueHandler;

/// String-keyed arbitrary values carried between pipeline stages.
pub type PropsMap = BTreeMap<String, Value>;

/// Identity of one running component occurrence, client-live or
/// server-detached. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocate a fresh instance id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// A re-render request delivered to the host's render queue.
#[derive(Debug)]
pub struct RenderRequest {
    /// Instance whose pipeline should re-run.
    pub instance: InstanceId,
    /// Caller-supplied override props merged over the previous snapshot.
    pub overrides: PropsMap,
}

/// Render trigger carried in every snapshot. Scheduling is non-blocking; the
/// host drains its queue strictly serialized per instance.
#[derive(Clone)]
pub struct RenderHandle {
    instance: InstanceId,
    queue: mpsc::UnboundedSender<RenderRequest>,
}

impl RenderHandle {
    /// Create a handle feeding the given queue.
    pub fn new(instance: InstanceId, queue: mpsc::UnboundedSender<RenderRequest>) -> Self {
        Self { instance, queue }
    }

    /// Schedule a re-render with no overrides.
    pub fn schedule(&self) {
        self.schedule_with(PropsMap::new());
    }

    /// Schedule a re-render with override props.
    ///
    /// A handle may outlive its host (a subscription firing after teardown);
    /// scheduling then is a no-op.
    pub fn schedule_with(&self, overrides: PropsMap) {
        let _ = self.queue.send(RenderRequest {
            instance: self.instance,
            overrides,
        });
    }

    /// Instance this handle renders.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }
}

impl fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandle")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

/// Event-dispatch capability bound to the instance's host node.
#[derive(Clone)]
pub struct Dispatcher {
    target: NodeId,
    sink: Arc<dyn EventSink>,
}

impl Dispatcher {
    /// Create a dispatcher targeting `target`.
    pub fn new(target: NodeId, sink: Arc<dyn EventSink>) -> Self {
        Self { target, sink }
    }

    /// Dispatch a custom event; the payload gains a `version` field and the
    /// event bubbles across shadow boundaries.
    pub fn dispatch(&self, label: &str, payload: Value) {
        self.sink.dispatch(DomEvent::new(label, self.target, payload));
    }

    /// Node events are dispatched on.
    pub fn target(&self) -> NodeId {
        self.target
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Non-blocking probe answering whether the pass this snapshot was issued
/// for has committed. A pass that never resolves leaves the probe
/// permanently false.
#[derive(Debug, Clone)]
pub struct ResolvedProbe {
    rx: watch::Receiver<bool>,
}

impl ResolvedProbe {
    /// Create a probe and the sender that resolves it.
    pub fn pair() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A probe that is already resolved, for detached snapshots.
    pub fn resolved_now() -> Self {
        let (tx, probe) = Self::pair();
        let _ = tx.send(true);
        probe
    }

    /// Whether the pass has committed. Never blocks.
    pub fn resolved(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Per-instance one-shot markers used by transformers that must attach
/// exactly one external subscription regardless of how many times the
/// pipeline re-runs.
#[derive(Debug, Clone, Default)]
pub struct Guards {
    markers: Arc<Mutex<HashSet<String>>>,
}

impl Guards {
    /// Create an empty marker set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once per key for this instance.
    pub fn once(&self, key: &str) -> bool {
        self.markers
            .lock()
            .expect("guard set poisoned")
            .insert(key.to_string())
    }

    /// Whether a marker has been claimed.
    pub fn claimed(&self, key: &str) -> bool {
        self.markers.lock().expect("guard set poisoned").contains(key)
    }

    /// Weak liveness view of this marker set. The canonical set is owned by
    /// the instance's lifecycle entry, so the view answers false once the
    /// entry has been released on teardown. External subscriptions hold this
    /// instead of a strong clone to avoid keeping the instance alive.
    pub fn watch(&self) -> GuardsWatch {
        GuardsWatch {
            markers: Arc::downgrade(&self.markers),
        }
    }
}

/// Weak counterpart of [`Guards`]; see [`Guards::watch`].
#[derive(Debug, Clone)]
pub struct GuardsWatch {
    markers: Weak<Mutex<HashSet<String>>>,
}

impl GuardsWatch {
    /// Whether the owning instance's lifecycle entry is still live.
    pub fn is_live(&self) -> bool {
        self.markers.upgrade().is_some()
    }
}

/// Explicit server-render configuration, threaded into detached snapshots
/// by the server entry points; never read from ambient process state.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Base URL for resolving relative resource paths.
    pub path: Option<String>,
    /// Filesystem root for server-relative path math.
    pub root: Option<std::path::PathBuf>,
}

/// Explicit optional rescue capability slot.
#[derive(Debug, Clone, Default)]
pub enum Rescue {
    /// No handler registered by this snapshot.
    #[default]
    None,
    /// A handler to invoke when a later stage (or pass) fails.
    Handler(RescueHandler),
}

/// The immutable-per-pass state threaded through the pipeline.
///
/// Values live in a string-keyed map; the framework capabilities (render
/// trigger, event dispatch, resolved probe, subscription guards, rescue
/// slot) are typed fields rather than conventionally-named map entries.
#[derive(Debug, Clone)]
pub struct Props {
    values: PropsMap,
    instance: InstanceId,
    prev: Option<Arc<PropsMap>>,
    stage: Option<Arc<PropsMap>>,
    attrs: BTreeMap<String, String>,
    render: RenderHandle,
    dispatch: Dispatcher,
    resolved: ResolvedProbe,
    guards: Guards,
    rescue: Rescue,
    server: Option<Arc<ServerConfig>>,
}

impl Props {
    /// Assemble a snapshot. Called by the lifecycle registry; transformers
    /// only ever derive new snapshots from an existing one.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        values: PropsMap,
        instance: InstanceId,
        prev: Option<Arc<PropsMap>>,
        attrs: BTreeMap<String, String>,
        render: RenderHandle,
        dispatch: Dispatcher,
        resolved: ResolvedProbe,
        guards: Guards,
        server: Option<Arc<ServerConfig>>,
    ) -> Self {
        Self {
            values,
            instance,
            prev,
            stage: None,
            attrs,
            render,
            dispatch,
            resolved,
            guards,
            rescue: Rescue::None,
            server,
        }
    }

    /// Value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Integer value by key.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Boolean value by key.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Chainable merge, for transformer contributions. Later writes win.
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// In-place write.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// All accumulated values.
    pub fn values(&self) -> &PropsMap {
        &self.values
    }

    /// Owning instance.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// The previous committed snapshot, `None` on first mount.
    pub fn prev(&self) -> Option<&PropsMap> {
        self.prev.as_deref()
    }

    /// The pre-merge view frozen when the current stage was entered, so a
    /// transformer can introspect the state its predecessor produced.
    pub fn pre_merge(&self) -> Option<&PropsMap> {
        self.stage.as_deref()
    }

    /// Freeze the pre-merge view for the next stage.
    pub(crate) fn begin_stage(&mut self) {
        self.stage = Some(Arc::new(self.values.clone()));
    }

    /// Serialized host-element attributes.
    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// Render trigger for this instance.
    pub fn render_handle(&self) -> &RenderHandle {
        &self.render
    }

    /// Event dispatch bound to the host node.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatch
    }

    /// Whether the pass this snapshot belongs to has committed.
    pub fn resolved(&self) -> bool {
        self.resolved.resolved()
    }

    /// Per-instance one-shot subscription markers.
    pub fn guards(&self) -> &Guards {
        &self.guards
    }

    /// The rescue capability slot.
    pub fn rescue(&self) -> &Rescue {
        &self.rescue
    }

    /// Install a rescue handler; the last stage to do so wins.
    pub fn with_rescue(mut self, handler: RescueHandler) -> Self {
        self.rescue = Rescue::Handler(handler);
        self
    }

    /// Whether this snapshot belongs to a detached server render.
    pub fn is_server(&self) -> bool {
        self.server.is_some()
    }

    /// Server-render configuration, present only on detached snapshots.
    pub fn server_config(&self) -> Option<&ServerConfig> {
        self.server.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weft_dom::NullSink;

    fn snapshot() -> Props {
        let (tx, _rx) = mpsc::unbounded_channel();
        let instance = InstanceId::next();
        Props::assemble(
            PropsMap::new(),
            instance,
            None,
            BTreeMap::new(),
            RenderHandle::new(instance, tx),
            Dispatcher::new(NodeId::next(), Arc::new(NullSink)),
            ResolvedProbe::resolved_now(),
            Guards::new(),
            None,
        )
    }

    #[test]
    fn test_set_is_later_wins() {
        let props = snapshot().set("a", json!(1)).set("a", json!(2));

        assert_eq!(props.get_i64("a"), Some(2));
    }

    #[test]
    fn test_pre_merge_view_freezes_stage_entry() {
        let mut props = snapshot().set("a", json!(1));
        props.begin_stage();
        let props = props.set("a", json!(2)).set("b", json!(3));

        assert_eq!(props.get_i64("a"), Some(2));
        let stage = props.pre_merge().expect("stage frozen");
        assert_eq!(stage.get("a"), Some(&json!(1)));
        assert!(!stage.contains_key("b"));
    }

    #[test]
    fn test_guards_once_is_one_shot() {
        let guards = Guards::new();

        assert!(guards.once("store"));
        for _ in 0..10 {
            assert!(!guards.once("store"));
        }
        assert!(guards.claimed("store"));
        assert!(guards.once("other"));
    }

    #[test]
    fn test_guards_watch_observes_release() {
        let guards = Guards::new();
        let watch = guards.watch();

        assert!(watch.is_live());
        drop(guards);
        assert!(!watch.is_live());
    }

    #[test]
    fn test_resolved_probe_is_non_blocking() {
        let (tx, probe) = ResolvedProbe::pair();

        assert!(!probe.resolved());
        tx.send(true).unwrap();
        assert!(probe.resolved());
    }

    #[test]
    fn test_schedule_after_teardown_is_noop() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = RenderHandle::new(InstanceId::next(), tx);
        drop(rx);

        handle.schedule();
    }
}
