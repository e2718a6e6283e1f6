//! Declarative tree produced fresh on every pipeline pass.

use std::collections::BTreeMap;

/// Attribute that carries a node's reconciliation identity.
pub const KEY_ATTR: &str = "key";

/// A node in the declarative tree. Immutable once produced; carries no
/// reference to any live document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNode {
    /// An element with a tag, attributes, and ordered children.
    Element(VElement),
    /// A text node.
    Text(String),
}

/// Element variant of a [`VNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VElement {
    /// Tag name (lowercase by convention).
    pub tag: String,
    /// Attributes in deterministic (sorted) order.
    pub attrs: BTreeMap<String, String>,
    /// Ordered children.
    pub children: Vec<VNode>,
}

impl VElement {
    /// Create an element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Append a child node.
    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append multiple children.
    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Finish the builder.
    pub fn build(self) -> VNode {
        VNode::Element(self)
    }

    /// Reconciliation key, if one was declared.
    pub fn key(&self) -> Option<&str> {
        self.attrs.get(KEY_ATTR).map(|s| s.as_str())
    }
}

impl VNode {
    /// Tag name for elements, `None` for text.
    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element(el) => Some(el.tag.as_str()),
            VNode::Text(_) => None,
        }
    }

    /// Reconciliation key, if this is a keyed element.
    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element(el) => el.key(),
            VNode::Text(_) => None,
        }
    }

    /// Whether this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, VNode::Text(_))
    }
}

/// Shorthand element constructor in the `h(tag, attrs, children)` shape.
pub fn h(tag: &str, attrs: &[(&str, &str)], children: Vec<VNode>) -> VNode {
    let mut el = VElement::new(tag);
    for (name, value) in attrs {
        el.attrs.insert((*name).to_string(), (*value).to_string());
    }
    el.children = children;
    VNode::Element(el)
}

/// Shorthand text constructor.
pub fn text(value: impl Into<String>) -> VNode {
    VNode::Text(value.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velement_builder() {
        let node = VElement::new("div")
            .attr("class", "card")
            .child(text("hello"))
            .build();

        assert_eq!(node.tag(), Some("div"));
        match node {
            VNode::Element(el) => {
                assert_eq!(el.attrs.get("class").map(String::as_str), Some("card"));
                assert_eq!(el.children.len(), 1);
            }
            VNode::Text(_) => panic!("expected element"),
        }
    }

    #[test]
    fn test_h_shorthand() {
        let node = h("li", &[("key", "a"), ("class", "row")], vec![text("A")]);

        assert_eq!(node.tag(), Some("li"));
        assert_eq!(node.key(), Some("a"));
    }

    #[test]
    fn test_text_has_no_key_or_tag() {
        let node = text("plain");

        assert!(node.is_text());
        assert_eq!(node.tag(), None);
        assert_eq!(node.key(), None);
    }
}
