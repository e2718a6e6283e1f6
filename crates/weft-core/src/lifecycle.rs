//! Per-instance lifecycle state, explicitly created and released.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::props::{
    Dispatcher, Guards, InstanceId, Props, PropsMap, RenderHandle, ResolvedProbe, ServerConfig,
};
use crate::rescue::RescueHandler;

/// Error-recovery state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceState {
    /// Rendering normally.
    #[default]
    Normal,
    /// A rescue handler is showing for this instance.
    Rescuing,
}

/// Shared handle to an instance's state, so the restart capability can flip
/// it back to normal from inside a rescue handler.
#[derive(Debug, Clone, Default)]
pub struct StateCell(Arc<Mutex<InstanceState>>);

impl StateCell {
    /// Current state.
    pub fn get(&self) -> InstanceState {
        *self.0.lock().expect("state cell poisoned")
    }

    /// Transition to a new state.
    pub fn set(&self, state: InstanceState) {
        *self.0.lock().expect("state cell poisoned") = state;
    }
}

/// A registered rescue handler together with the snapshot it was
/// registered with.
#[derive(Debug, Clone)]
pub struct RescueEntry {
    /// The handler to invoke on failure.
    pub handler: RescueHandler,
    /// The accumulated values at registration time.
    pub values: PropsMap,
}

#[derive(Debug, Default)]
struct LifecycleEntry {
    prev: Option<Arc<PropsMap>>,
    rescue: Option<RescueEntry>,
    guards: Guards,
    state: StateCell,
}

/// Per-instance state keyed by instance identity.
///
/// Entries are created on first use and must be released with
/// [`LifecycleRegistry::remove`] on teardown: the association carries no
/// ownership of the instance, so nothing else reclaims them.
#[derive(Debug, Default)]
pub struct LifecycleRegistry {
    entries: HashMap<InstanceId, LifecycleEntry>,
}

impl LifecycleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the initial snapshot for a pass: the stored previous values
    /// (empty on first mount) merged with caller-supplied overrides, plus
    /// the standard capability slots.
    ///
    /// Repeated calls without an intervening pass are idempotent.
    #[allow(clippy::too_many_arguments)]
    pub fn initial_props(
        &mut self,
        instance: InstanceId,
        overrides: PropsMap,
        attrs: BTreeMap<String, String>,
        render: RenderHandle,
        dispatch: Dispatcher,
        resolved: ResolvedProbe,
        server: Option<Arc<ServerConfig>>,
    ) -> Props {
        let entry = self.entries.entry(instance).or_default();
        let mut values: PropsMap = entry.prev.as_deref().cloned().unwrap_or_default();
        values.extend(overrides);

        Props::assemble(
            values,
            instance,
            entry.prev.clone(),
            attrs,
            render,
            dispatch,
            resolved,
            entry.guards.clone(),
            server,
        )
    }

    /// Store the final snapshot of a successful pass as the instance's
    /// previous props, and return the instance to normal.
    pub fn commit(&mut self, instance: InstanceId, values: PropsMap) {
        let entry = self.entries.entry(instance).or_default();
        entry.prev = Some(Arc::new(values));
        entry.state.set(InstanceState::Normal);
    }

    /// Register a rescue handler; replaces any prior one.
    pub fn set_rescue(&mut self, instance: InstanceId, handler: RescueHandler, values: PropsMap) {
        let entry = self.entries.entry(instance).or_default();
        entry.rescue = Some(RescueEntry { handler, values });
    }

    /// The currently registered rescue entry, if any.
    pub fn rescue(&self, instance: InstanceId) -> Option<RescueEntry> {
        self.entries.get(&instance).and_then(|e| e.rescue.clone())
    }

    /// Update the stored previous snapshot in place with an `error` field.
    pub fn annotate_error(&mut self, instance: InstanceId, error: &str) {
        let entry = self.entries.entry(instance).or_default();
        let mut values = entry.prev.as_deref().cloned().unwrap_or_default();
        values.insert(
            "error".to_string(),
            serde_json::Value::String(error.to_string()),
        );
        entry.prev = Some(Arc::new(values));
    }

    /// The previous committed snapshot, `None` before the first pass.
    pub fn previous(&self, instance: InstanceId) -> Option<Arc<PropsMap>> {
        self.entries.get(&instance).and_then(|e| e.prev.clone())
    }

    /// Current error-recovery state.
    pub fn state(&self, instance: InstanceId) -> InstanceState {
        self.entries
            .get(&instance)
            .map(|e| e.state.get())
            .unwrap_or_default()
    }

    /// Shared state handle for an instance.
    pub fn state_cell(&mut self, instance: InstanceId) -> StateCell {
        self.entries.entry(instance).or_default().state.clone()
    }

    /// One-shot subscription markers for an instance.
    pub fn guards(&mut self, instance: InstanceId) -> Guards {
        self.entries.entry(instance).or_default().guards.clone()
    }

    /// Whether an entry exists.
    pub fn contains(&self, instance: InstanceId) -> bool {
        self.entries.contains_key(&instance)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release an instance's entry on teardown. Without this, entries would
    /// accumulate without bound.
    pub fn remove(&mut self, instance: InstanceId) {
        self.entries.remove(&instance);
    }
}
