//! Live mutable tree the client reconciler patches in place.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::vnode::{VNode, KEY_ATTR};

/// Opaque identity of one live node. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh node id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of the live tree.
///
/// Unlike a [`VNode`], a live node has a stable identity across
/// reconciliation passes and can be flagged as externally managed, meaning
/// it is owned by a nested component boundary and must not be touched by an
/// ancestor's pass.
#[derive(Debug, Clone)]
pub struct LiveNode {
    id: NodeId,
    kind: LiveKind,
}

/// Element or text payload of a [`LiveNode`].
#[derive(Debug, Clone)]
pub enum LiveKind {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        children: Vec<LiveNode>,
        /// Owned by a nested component boundary; skipped by ancestors.
        managed: bool,
    },
    Text(String),
}

impl LiveNode {
    /// Create an empty live element.
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            kind: LiveKind::Element {
                tag: tag.into(),
                attrs: BTreeMap::new(),
                children: Vec::new(),
                managed: false,
            },
        }
    }

    /// Create a live text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            kind: LiveKind::Text(value.into()),
        }
    }

    /// Materialize a declarative node into a fresh live subtree.
    pub fn from_vnode(vnode: &VNode) -> Self {
        match vnode {
            VNode::Text(value) => Self::text(value.clone()),
            VNode::Element(el) => Self {
                id: NodeId::next(),
                kind: LiveKind::Element {
                    tag: el.tag.clone(),
                    attrs: el.attrs.clone(),
                    children: el.children.iter().map(Self::from_vnode).collect(),
                    managed: false,
                },
            },
        }
    }

    /// Stable identity of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node payload.
    pub fn kind(&self) -> &LiveKind {
        &self.kind
    }

    /// Mutable node payload.
    pub fn kind_mut(&mut self) -> &mut LiveKind {
        &mut self.kind
    }

    /// Tag name for elements, `None` for text.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            LiveKind::Element { tag, .. } => Some(tag.as_str()),
            LiveKind::Text(_) => None,
        }
    }

    /// Reconciliation key, if one is set.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            LiveKind::Element { attrs, .. } => attrs.get(KEY_ATTR).map(|s| s.as_str()),
            LiveKind::Text(_) => None,
        }
    }

    /// Whether this node is owned by a nested component boundary.
    pub fn is_managed(&self) -> bool {
        matches!(&self.kind, LiveKind::Element { managed: true, .. })
    }

    /// Flag this node as owned by a nested component boundary.
    pub fn set_managed(&mut self, value: bool) {
        if let LiveKind::Element { managed, .. } = &mut self.kind {
            *managed = value;
        }
    }

    /// All attributes of an element, `None` for text.
    pub fn attrs(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            LiveKind::Element { attrs, .. } => Some(attrs),
            LiveKind::Text(_) => None,
        }
    }

    /// Attribute value by name, for elements.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            LiveKind::Element { attrs, .. } => attrs.get(name).map(|s| s.as_str()),
            LiveKind::Text(_) => None,
        }
    }

    /// Set an attribute on an element; no-op for text nodes.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if let LiveKind::Element { attrs, .. } = &mut self.kind {
            attrs.insert(name.into(), value.into());
        }
    }

    /// Children of an element, empty for text.
    pub fn children(&self) -> &[LiveNode] {
        match &self.kind {
            LiveKind::Element { children, .. } => children,
            LiveKind::Text(_) => &[],
        }
    }

    /// Mutable children of an element.
    pub fn children_mut(&mut self) -> Option<&mut Vec<LiveNode>> {
        match &mut self.kind {
            LiveKind::Element { children, .. } => Some(children),
            LiveKind::Text(_) => None,
        }
    }

    /// Append a child to an element.
    pub fn append(&mut self, child: LiveNode) {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
    }

    /// Find a descendant (or self) by id.
    pub fn find(&self, id: NodeId) -> Option<&LiveNode> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    /// Find a descendant (or self) by id, mutably.
    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut LiveNode> {
        if self.id == id {
            return Some(self);
        }
        match &mut self.kind {
            LiveKind::Element { children, .. } => {
                children.iter_mut().find_map(|child| child.find_mut(id))
            }
            LiveKind::Text(_) => None,
        }
    }

    /// Ids of this node and every descendant, in document order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = vec![self.id];
        for child in self.children() {
            out.extend(child.ids());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::{h, text};

    #[test]
    fn test_node_ids_are_unique() {
        let a = LiveNode::element("div");
        let b = LiveNode::element("div");

        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_from_vnode_materializes_subtree() {
        let tree = h("ul", &[], vec![h("li", &[("key", "a")], vec![text("A")])]);
        let live = LiveNode::from_vnode(&tree);

        assert_eq!(live.tag(), Some("ul"));
        assert_eq!(live.children().len(), 1);
        assert_eq!(live.children()[0].key(), Some("a"));
        assert_eq!(live.ids().len(), 3);
    }

    #[test]
    fn test_managed_flag_only_applies_to_elements() {
        let mut el = LiveNode::element("div");
        let mut txt = LiveNode::text("hello");

        el.set_managed(true);
        txt.set_managed(true);

        assert!(el.is_managed());
        assert!(!txt.is_managed());
    }

    #[test]
    fn test_find_by_id() {
        let mut root = LiveNode::element("main");
        let child = LiveNode::element("section");
        let child_id = child.id();
        root.append(child);

        assert!(root.find(child_id).is_some());
        root.find_mut(child_id).unwrap().set_attr("class", "x");
        assert_eq!(root.find(child_id).unwrap().attr("class"), Some("x"));
    }
}
