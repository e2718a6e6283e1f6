//! Detached HTML serialization for server rendering.

use crate::live::{LiveKind, LiveNode};
use crate::vnode::VNode;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Escape text node content.
pub fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value for double-quoted output.
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn write_open_tag(out: &mut String, tag: &str, attrs: &std::collections::BTreeMap<String, String>) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        if value.is_empty() {
            out.push_str(&format!(" {name}"));
        } else {
            out.push_str(&format!(r#" {name}="{}""#, escape_attr(value)));
        }
    }
    out.push('>');
}

/// Serialize one declarative node.
pub fn to_html(node: &VNode) -> String {
    let mut out = String::new();
    write_vnode(&mut out, node);
    out
}

fn write_vnode(out: &mut String, node: &VNode) {
    match node {
        VNode::Text(value) => out.push_str(&escape_text(value)),
        VNode::Element(el) => {
            write_open_tag(out, &el.tag, &el.attrs);
            if !is_void(&el.tag) {
                for child in &el.children {
                    write_vnode(out, child);
                }
                out.push_str(&format!("</{}>", el.tag));
            }
        }
    }
}

/// Serialize a live subtree, used to compare boundary content in tests and
/// to snapshot the document.
pub fn live_to_html(node: &LiveNode) -> String {
    let mut out = String::new();
    write_live(&mut out, node);
    out
}

fn write_live(out: &mut String, node: &LiveNode) {
    match node.kind() {
        LiveKind::Text(value) => out.push_str(&escape_text(value)),
        LiveKind::Element {
            tag,
            attrs,
            children,
            ..
        } => {
            write_open_tag(out, tag, attrs);
            if !is_void(tag) {
                for child in children {
                    write_live(out, child);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::{h, text};

    #[test]
    fn test_escapes_text_and_attributes() {
        let node = h("p", &[("title", r#"a "b" <c>"#)], vec![text("1 < 2 & 3 > 2")]);

        assert_eq!(
            to_html(&node),
            r#"<p title="a &quot;b&quot; &lt;c&gt;">1 &lt; 2 &amp; 3 &gt; 2</p>"#
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let node = h("link", &[("href", "a.css"), ("rel", "stylesheet")], vec![]);

        assert_eq!(to_html(&node), r#"<link href="a.css" rel="stylesheet">"#);
    }

    #[test]
    fn test_empty_attribute_is_bare() {
        let node = h("x-app", &[("data-weft", "")], vec![]);

        assert_eq!(to_html(&node), "<x-app data-weft></x-app>");
    }

    #[test]
    fn test_live_and_vnode_serialize_identically() {
        let tree = h(
            "ul",
            &[("class", "list")],
            vec![h("li", &[("key", "a")], vec![text("A")])],
        );
        let live = crate::live::LiveNode::from_vnode(&tree);

        assert_eq!(live_to_html(&live), to_html(&tree));
    }
}
