//! Keyed diff-and-patch of a live boundary subtree.
//!
//! The reconciler morphs the children of a boundary root into the shape of
//! the next declarative tree. Node identity across passes is decided by the
//! `key` attribute when present, falling back to structural position. Live
//! nodes flagged as externally managed belong to a nested component boundary
//! and are returned unchanged, whatever the declarative input says.

use std::collections::HashMap;

use serde_json::json;

use crate::event::{DomEvent, EventSink};
use crate::live::{LiveKind, LiveNode, NodeId};
use crate::vnode::{VElement, VNode};

/// One mutation applied to the live tree during a pass. Transient; callers
/// that don't need diagnostics discard the returned set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// Attribute written on an existing element.
    SetAttr {
        node: NodeId,
        name: String,
        value: String,
    },
    /// Attribute removed from an existing element.
    RemoveAttr { node: NodeId, name: String },
    /// Text content replaced.
    SetText { node: NodeId, text: String },
    /// New subtree inserted under `parent` at `index`.
    Insert {
        parent: NodeId,
        index: usize,
        node: NodeId,
    },
    /// Subtree removed from `parent`.
    Remove { parent: NodeId, node: NodeId },
    /// Incompatible node swapped for a fresh subtree.
    Replace {
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    },
}

/// Morph the children of `boundary` into the shape of `next`.
///
/// An empty boundary degenerates to a pure insertion. Creation and
/// destruction notifications are dispatched on every node physically added
/// or removed.
pub fn reconcile(boundary: &mut LiveNode, next: &[VNode], sink: &dyn EventSink) -> Vec<Patch> {
    let mut patches = Vec::new();
    reconcile_children(boundary, next, sink, &mut patches);
    patches
}

fn reconcile_children(
    parent: &mut LiveNode,
    next: &[VNode],
    sink: &dyn EventSink,
    patches: &mut Vec<Patch>,
) {
    let parent_id = parent.id();
    let Some(children) = parent.children_mut() else {
        return;
    };

    let old: Vec<LiveNode> = std::mem::take(children);
    let mut slots: Vec<Option<LiveNode>> = old.into_iter().map(Some).collect();

    // Keyed live children, looked up before falling back to position.
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for (index, slot) in slots.iter().enumerate() {
        if let Some(key) = slot.as_ref().and_then(|node| node.key()) {
            by_key.entry(key.to_string()).or_insert(index);
        }
    }

    let mut updated: Vec<LiveNode> = Vec::with_capacity(next.len());

    for (position, vnode) in next.iter().enumerate() {
        let matched = match vnode.key() {
            Some(key) => by_key
                .get(key)
                .copied()
                .filter(|&index| slots[index].is_some())
                .or_else(|| positional_match(&slots, position, vnode)),
            None => positional_match(&slots, position, vnode),
        };

        match matched {
            Some(index) => {
                let mut live = slots[index].take().expect("slot already consumed");

                if live.is_managed() {
                    // Nested boundary: never mutated or replaced by an
                    // ancestor's pass.
                    tracing::debug!(node = %live.id(), "skipping externally managed node");
                    updated.push(live);
                } else if compatible(&live, vnode) {
                    morph(&mut live, vnode, sink, patches);
                    updated.push(live);
                } else {
                    let fresh = LiveNode::from_vnode(vnode);
                    patches.push(Patch::Replace {
                        parent: parent_id,
                        old: live.id(),
                        new: fresh.id(),
                    });
                    dispatch_destroyed(&live, sink);
                    dispatch_created(&fresh, sink);
                    updated.push(fresh);
                }
            }
            None => {
                let fresh = LiveNode::from_vnode(vnode);
                patches.push(Patch::Insert {
                    parent: parent_id,
                    index: position,
                    node: fresh.id(),
                });
                dispatch_created(&fresh, sink);
                updated.push(fresh);
            }
        }
    }

    for slot in slots.into_iter().flatten() {
        patches.push(Patch::Remove {
            parent: parent_id,
            node: slot.id(),
        });
        dispatch_destroyed(&slot, sink);
    }

    *parent.children_mut().expect("parent is an element") = updated;
}

/// Structural fallback: the unconsumed live child at the same position,
/// unless a key claims it for elsewhere in the pass. Shape mismatches are
/// matched anyway and left to the caller's replace branch.
fn positional_match(slots: &[Option<LiveNode>], position: usize, vnode: &VNode) -> Option<usize> {
    let live = slots.get(position)?.as_ref()?;
    if live.key().is_some() && live.key() != vnode.key() {
        return None;
    }
    Some(position)
}

fn compatible(live: &LiveNode, vnode: &VNode) -> bool {
    match (live.kind(), vnode) {
        (LiveKind::Text(_), VNode::Text(_)) => true,
        (LiveKind::Element { tag, .. }, VNode::Element(el)) => *tag == el.tag,
        _ => false,
    }
}

fn morph(live: &mut LiveNode, vnode: &VNode, sink: &dyn EventSink, patches: &mut Vec<Patch>) {
    match vnode {
        VNode::Text(value) => {
            if let LiveKind::Text(current) = live.kind_mut() {
                if current != value {
                    *current = value.clone();
                    patches.push(Patch::SetText {
                        node: live.id(),
                        text: value.clone(),
                    });
                }
            }
        }
        VNode::Element(el) => {
            morph_attrs(live, el, patches);
            reconcile_children(live, &el.children, sink, patches);
        }
    }
}

fn morph_attrs(live: &mut LiveNode, el: &VElement, patches: &mut Vec<Patch>) {
    let id = live.id();
    let LiveKind::Element { attrs, .. } = live.kind_mut() else {
        return;
    };

    let stale: Vec<String> = attrs
        .keys()
        .filter(|name| !el.attrs.contains_key(*name))
        .cloned()
        .collect();
    for name in stale {
        attrs.remove(&name);
        patches.push(Patch::RemoveAttr { node: id, name });
    }

    for (name, value) in &el.attrs {
        if attrs.get(name) != Some(value) {
            attrs.insert(name.clone(), value.clone());
            patches.push(Patch::SetAttr {
                node: id,
                name: name.clone(),
                value: value.clone(),
            });
        }
    }
}

fn dispatch_created(node: &LiveNode, sink: &dyn EventSink) {
    sink.dispatch(DomEvent::new("create", node.id(), json!({})));
    for child in node.children() {
        dispatch_created(child, sink);
    }
}

fn dispatch_destroyed(node: &LiveNode, sink: &dyn EventSink) {
    sink.dispatch(DomEvent::new("destroy", node.id(), json!({})));
    for child in node.children() {
        dispatch_destroyed(child, sink);
    }
}
