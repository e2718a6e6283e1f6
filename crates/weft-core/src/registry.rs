//! Component registration with collision renegotiation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::component::{Component, ComponentBuilder};

/// Random hex suffix for renegotiated tag names. A seeded LCG is plenty
/// here; uniqueness is re-checked against the registry after every draw.
pub(crate) fn random_id() -> String {
    static SEED: AtomicU32 = AtomicU32::new(0x5eed);
    let next = SEED
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |seed| {
            Some(seed.wrapping_mul(1103515245).wrapping_add(12345))
        })
        .unwrap_or_default()
        .wrapping_mul(1103515245)
        .wrapping_add(12345);
    format!("{next:x}")
}

/// Split a registration name into `tag` and optional extended native tag
/// (`"my-input/input"` extends the native `input` element).
fn parse_name(name: &str) -> (String, Option<String>) {
    match name.split_once('/') {
        Some((tag, extend)) if !extend.is_empty() => (tag.to_string(), Some(extend.to_string())),
        _ => (name.to_string(), None),
    }
}

/// Component registrations keyed by assigned tag. Descriptors are read-only
/// after registration; the registry is the only shared state that crosses
/// instance boundaries.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<Component>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under `name` (`tag` or `tag/extended-native-tag`).
    ///
    /// A name collision is never an error: a fresh tag is derived by
    /// appending a random suffix and retrying until an unused name is found.
    /// The caller reads the actually assigned name from the returned
    /// descriptor's [`Component::tag`].
    pub fn create(&mut self, name: &str, builder: ComponentBuilder) -> Arc<Component> {
        let (tag, extends) = parse_name(name);
        let tag = self.resolve_tag(&tag);

        let component = Arc::new(builder.into_component(tag.clone(), extends));
        self.components.insert(tag, Arc::clone(&component));
        component
    }

    /// First attempt the requested tag; while it is taken, append a random
    /// suffix and try again.
    fn resolve_tag(&self, tag: &str) -> String {
        if !self.components.contains_key(tag) {
            return tag.to_string();
        }
        self.resolve_tag(&format!("{tag}-{}", random_id()))
    }

    /// Look up a component by assigned tag.
    pub fn get(&self, tag: &str) -> Option<Arc<Component>> {
        self.components.get(tag).cloned()
    }

    /// Whether a tag is taken.
    pub fn contains(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_requested_tag() {
        let mut registry = ComponentRegistry::new();

        let component = registry.create("x-app", ComponentBuilder::new());

        assert_eq!(component.tag(), "x-app");
        assert!(registry.contains("x-app"));
    }

    #[test]
    fn test_extended_native_tag_is_parsed() {
        let mut registry = ComponentRegistry::new();

        let component = registry.create("fancy-input/input", ComponentBuilder::new());

        assert_eq!(component.tag(), "fancy-input");
        assert_eq!(component.extends(), Some("input"));
    }

    #[test]
    fn test_collision_yields_fresh_unique_name() {
        let mut registry = ComponentRegistry::new();
        let first = registry.create("x-app", ComponentBuilder::new());
        let second = registry.create("x-app", ComponentBuilder::new());

        assert_eq!(first.tag(), "x-app");
        assert_ne!(second.tag(), "x-app");
        assert!(second.tag().starts_with("x-app-"));
        assert!(registry.contains(second.tag()));
    }

    #[test]
    fn test_collision_against_renegotiated_name_renegotiates_again() {
        let mut registry = ComponentRegistry::new();
        registry.create("x-app", ComponentBuilder::new());
        let second = registry.create("x-app", ComponentBuilder::new());
        let third = registry.create(second.tag(), ComponentBuilder::new());

        assert_ne!(third.tag(), second.tag());
        assert!(third.tag().starts_with(second.tag()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(random_id(), random_id());
    }
}
