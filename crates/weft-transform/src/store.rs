//! External store binding with a one-shot subscription per instance.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use weft_core::{transform_fn, Transform};

type Reducer = dyn Fn(&Value, &Value) -> Value + Send + Sync;
type Subscriber = dyn Fn() -> bool + Send + Sync;

struct StoreInner {
    state: Mutex<Value>,
    subscribers: Mutex<Vec<Box<Subscriber>>>,
    reducer: Box<Reducer>,
}

/// A reducer-driven store over JSON values, shared across components.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store with a reducer `(state, action) -> state` and an
    /// initial state.
    pub fn new(
        reducer: impl Fn(&Value, &Value) -> Value + Send + Sync + 'static,
        initial: Value,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(initial),
                subscribers: Mutex::new(Vec::new()),
                reducer: Box::new(reducer),
            }),
        }
    }

    /// The current state.
    pub fn state(&self) -> Value {
        self.inner.state.lock().expect("store state poisoned").clone()
    }

    /// Reduce an action into the state and notify every subscriber.
    /// Subscribers that report themselves stale are detached here, so
    /// instance churn does not grow the subscriber list without bound.
    pub fn dispatch(&self, action: Value) {
        {
            let mut state = self.inner.state.lock().expect("store state poisoned");
            *state = (self.inner.reducer)(&state, &action);
        }
        self.inner
            .subscribers
            .lock()
            .expect("store subscribers poisoned")
            .retain(|subscriber| subscriber());
    }

    /// Attach a change subscriber; it stays attached for as long as it
    /// returns true.
    pub fn subscribe(&self, subscriber: impl Fn() -> bool + Send + Sync + 'static) {
        self.inner
            .subscribers
            .lock()
            .expect("store subscribers poisoned")
            .push(Box::new(subscriber));
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .expect("store subscribers poisoned")
            .len()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

/// Bind a store's state into props as `store`, and subscribe the instance's
/// render trigger to changes.
///
/// The subscription is attached at most once per instance, however many
/// times the pipeline re-runs, via the per-instance one-shot guard. It
/// holds only a weak view of the instance's lifecycle, and detaches itself
/// on the first notification after the instance is torn down.
pub fn store(store: Store) -> Arc<dyn Transform> {
    transform_fn(move |props| {
        let store = store.clone();
        async move {
            if props.guards().once("store") {
                let render = props.render_handle().clone();
                let live = props.guards().watch();
                tracing::debug!(instance = %props.instance(), "subscribing to store");
                store.subscribe(move || {
                    if !live.is_live() {
                        return false;
                    }
                    render.schedule();
                    true
                });
            }
            let state = store.state();
            Ok(props.set("store", state))
        }
    })
}
