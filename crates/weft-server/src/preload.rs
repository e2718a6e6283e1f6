//! Preload-hint extraction for document heads.

use weft_dom::escape_attr;

use crate::options::RenderOptions;

/// Collate stylesheet links out of rendered trees so the caller can splice
/// them into the document head ahead of the body.
///
/// Every `<link …>` fragment found in the input strings is rewritten: its
/// `href` path is resolved against the configured base URL, `rel` is forced
/// to `preload` and `as` to `style`, and the `key`/`type` attributes are
/// dropped. The fragments are joined with newlines. Pure function of its
/// inputs.
pub fn preload(trees: &[&str], options: &RenderOptions) -> String {
    let mut links = Vec::new();
    for tree in trees {
        for fragment in link_fragments(tree) {
            links.push(rewrite_link(fragment, options.base_path()));
        }
    }
    links.join("\n")
}

/// All `<link …>` fragments of a tree, matched case-insensitively.
fn link_fragments(tree: &str) -> Vec<&str> {
    let lower = tree.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(offset) = lower[from..].find("<link") {
        let start = from + offset;
        let Some(end) = lower[start..].find('>') else {
            break;
        };
        out.push(&tree[start..start + end + 1]);
        from = start + end + 1;
    }
    out
}

fn rewrite_link(fragment: &str, base: Option<&str>) -> String {
    // Strip the "<link" open and the ">" (or "/>") close.
    let inner = fragment[5..].trim_end_matches('>').trim_end_matches('/');
    let mut attrs = parse_attrs(inner);

    attrs.retain(|(name, _)| name != "key" && name != "type");
    if let Some(href) = attrs.iter_mut().find(|(name, _)| name == "href") {
        href.1 = resolve_href(&href.1, base);
    }
    set_attr(&mut attrs, "as", "style");
    set_attr(&mut attrs, "rel", "preload");

    let mut out = String::from("<link");
    for (name, value) in &attrs {
        out.push_str(&format!(r#" {name}="{}""#, escape_attr(value)));
    }
    out.push('>');
    out
}

/// Minimal attribute scanner: `name`, `name=bare`, `name="…"`, `name='…'`.
/// Names are lowercased; declaration order is preserved.
fn parse_attrs(inner: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let bytes = inner.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = inner[start..i].to_ascii_lowercase();
        if name.is_empty() {
            i += 1;
            continue;
        }

        let mut value = String::new();
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                value = inner[value_start..i].to_string();
                i += 1;
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                value = inner[value_start..i].to_string();
            }
        }
        attrs.push((name, value));
    }

    attrs
}

fn set_attr(attrs: &mut Vec<(String, String)>, name: &str, value: &str) {
    match attrs.iter_mut().find(|(existing, _)| existing == name) {
        Some(attr) => attr.1 = value.to_string(),
        None => attrs.push((name.to_string(), value.to_string())),
    }
}

/// Resolve an href's path against the configured base URL: only the path
/// portion of the href survives, rooted at the base's origin. Without a
/// base the href is returned untouched.
fn resolve_href(href: &str, base: Option<&str>) -> String {
    let Some(base) = base else {
        return href.to_string();
    };
    let path = href_path(href);
    format!("{}/{}", origin(base), path.trim_start_matches('/'))
}

/// The path portion of an href; absolute URLs lose scheme and authority.
fn href_path(href: &str) -> &str {
    match href.find("://") {
        Some(scheme_end) => {
            let rest = &href[scheme_end + 3..];
            match rest.find('/') {
                Some(path_start) => &rest[path_start..],
                None => "/",
            }
        }
        None => href,
    }
}

/// Scheme and authority of a base URL, without any trailing path.
fn origin(base: &str) -> &str {
    match base.find("://") {
        Some(scheme_end) => {
            let rest = &base[scheme_end + 3..];
            match rest.find('/') {
                Some(path_start) => &base[..scheme_end + 3 + path_start],
                None => base,
            }
        }
        None => base.trim_end_matches('/'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_href_resolves_against_base() {
        let options = RenderOptions::new().path("https://x/").root("/srv");

        let hints = preload(&["<link href='a.css'>"], &options);

        assert_eq!(hints, r#"<link href="https://x/a.css" as="style" rel="preload">"#);
    }

    #[test]
    fn test_rel_is_forced_and_key_type_dropped() {
        let options = RenderOptions::new().path("https://cdn.example");

        let hints = preload(
            &[r#"<link rel="stylesheet" type="text/css" key="x" href="/styles/app.css">"#],
            &options,
        );

        assert_eq!(
            hints,
            r#"<link rel="preload" href="https://cdn.example/styles/app.css" as="style">"#
        );
    }

    #[test]
    fn test_absolute_href_keeps_only_its_path() {
        let options = RenderOptions::new().path("https://x/assets/");

        let hints = preload(&["<link href='https://cdn.other/z/a.css'>"], &options);

        assert_eq!(hints, r#"<link href="https://x/z/a.css" as="style" rel="preload">"#);
    }

    #[test]
    fn test_links_from_multiple_trees_join_with_newlines() {
        let options = RenderOptions::new().path("https://x/");

        let hints = preload(
            &[
                "<p>one</p><link href='a.css'><link href='b.css'>",
                "<LINK HREF='c.css'>",
            ],
            &options,
        );

        let lines: Vec<&str> = hints.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("https://x/a.css"));
        assert!(lines[1].contains("https://x/b.css"));
        assert!(lines[2].contains("https://x/c.css"));
    }

    #[test]
    fn test_without_base_href_is_untouched() {
        let hints = preload(&["<link href='a.css'>"], &RenderOptions::new());

        assert_eq!(hints, r#"<link href="a.css" as="style" rel="preload">"#);
    }

    #[test]
    fn test_preload_is_deterministic() {
        let options = RenderOptions::new().path("https://x/");
        let trees = ["<link href='a.css' key='1'>"];

        assert_eq!(preload(&trees, &options), preload(&trees, &options));
    }

    #[test]
    fn test_tree_without_links_yields_empty_string() {
        let hints = preload(&["<p>no links here</p>"], &RenderOptions::new());

        assert!(hints.is_empty());
    }
}
