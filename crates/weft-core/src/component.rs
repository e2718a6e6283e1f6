//! Immutable component descriptors.

use std::fmt;
use std::sync::Arc;

use weft_dom::VNode;

use crate::props::Props;
use crate::transform::Transform;

/// The function turning final props into a declarative tree.
pub type ViewFn = dyn Fn(&Props) -> Vec<VNode> + Send + Sync;

/// A registered component: tag, optional native-element extension point,
/// ordered transformer chain, and view function. Created once at
/// registration time and immutable thereafter.
#[derive(Clone)]
pub struct Component {
    tag: String,
    extends: Option<String>,
    transforms: Vec<Arc<dyn Transform>>,
    view: Arc<ViewFn>,
}

impl Component {
    pub(crate) fn new(
        tag: String,
        extends: Option<String>,
        transforms: Vec<Arc<dyn Transform>>,
        view: Arc<ViewFn>,
    ) -> Self {
        Self {
            tag,
            extends,
            transforms,
            view,
        }
    }

    /// The tag this component was actually registered under. May differ from
    /// the requested name after collision renegotiation.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Native element this component extends, if any.
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// The ordered transformer chain.
    pub fn transforms(&self) -> &[Arc<dyn Transform>] {
        &self.transforms
    }

    /// Produce the declarative tree for the given final props.
    pub fn render_view(&self, props: &Props) -> Vec<VNode> {
        (self.view)(props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("tag", &self.tag)
            .field("extends", &self.extends)
            .field("transforms", &self.transforms.len())
            .finish_non_exhaustive()
    }
}

/// Builder for the transformer chain and view of a component.
///
/// # Example
///
/// ```rust,ignore
/// let component = registry.create(
///     "x-counter",
///     ComponentBuilder::new()
///         .transform(add_count)
///         .view(|props| vec![text(format!("{}", props.get_i64("count").unwrap_or(0)))]),
/// );
/// ```
#[derive(Default)]
pub struct ComponentBuilder {
    transforms: Vec<Arc<dyn Transform>>,
    view: Option<Arc<ViewFn>>,
}

impl ComponentBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pipeline stage; stages run in the order they were added.
    pub fn transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Set the view function.
    pub fn view(mut self, view: impl Fn(&Props) -> Vec<VNode> + Send + Sync + 'static) -> Self {
        self.view = Some(Arc::new(view));
        self
    }

    pub(crate) fn into_component(self, tag: String, extends: Option<String>) -> Component {
        // Components without a view render nothing.
        let view = self.view.unwrap_or_else(|| Arc::new(|_: &Props| Vec::new()));
        Component::new(tag, extends, self.transforms, view)
    }
}

impl fmt::Debug for ComponentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBuilder")
            .field("transforms", &self.transforms.len())
            .field("has_view", &self.view.is_some())
            .finish()
    }
}
