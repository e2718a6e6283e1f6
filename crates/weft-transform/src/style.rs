//! Stylesheet import helper for view functions.

use weft_dom::{h, text, VNode};

/// A `<style>` node importing a stylesheet by resolved path, for use
/// together with the `path` transformer:
///
/// ```rust,ignore
/// let base = props.get_str("path").unwrap_or("");
/// vec![style(&format!("{base}styles.css")), /* … */]
/// ```
pub fn style(href: &str) -> VNode {
    h(
        "style",
        &[("type", "text/css")],
        vec![text(format!("@import \"{href}\";"))],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_dom::to_html;

    #[test]
    fn test_style_imports_the_stylesheet() {
        let node = style("https://x/components/app/styles.css");

        assert_eq!(
            to_html(&node),
            "<style type=\"text/css\">@import \"https://x/components/app/styles.css\";</style>"
        );
    }
}
