//! Small components for observing the engine from tests.

use std::cell::RefCell;

use canopy_core::{
    Component, ComponentContext, ComponentType, ElementType, Lifecycle, PropPath, PropValue,
    Props, Render, RenderError, VNode,
};

thread_local! {
    static TRACER_EVENTS: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

fn record(label: &str, what: &str) {
    TRACER_EVENTS.with(|events| events.borrow_mut().push(format!("{label}:{what}")));
}

/// Events recorded by tracers on this thread, as `label:Event` strings.
pub fn tracer_events() -> Vec<String> {
    TRACER_EVENTS.with(|events| events.borrow().clone())
}

/// Drains the events recorded by tracers on this thread.
pub fn take_tracer_events() -> Vec<String> {
    TRACER_EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
}

/// Renders one `tracer` leaf and logs every render and lifecycle event under its `label` prop.
///
/// The leaf carries the `text` prop when one is given, otherwise the label.
#[derive(Debug, Default)]
pub struct Tracer {
    label: String,
    text: Option<String>,
}

impl Tracer {
    pub const ELEMENT: ElementType = ElementType::new("tracer");

    /// Builds a tracer node with the given label.
    pub fn node(label: &str) -> VNode {
        Self::node_with(label, Props::new())
    }

    /// Builds a tracer node, merging `label` into `props`.
    pub fn node_with(label: &str, props: Props) -> VNode {
        VNode::component(
            ComponentType::of::<Tracer>(),
            props.with("label", label),
            Vec::new(),
        )
    }
}

impl Component for Tracer {
    fn render(&mut self, _cx: &mut ComponentContext<'_>) -> Result<Render, RenderError> {
        record(&self.label, "render");
        let text = self.text.clone().unwrap_or_else(|| self.label.clone());
        Ok(VNode::leaf(Self::ELEMENT, Props::new().with("text", text)).into())
    }

    fn set_property(&mut self, path: &PropPath, value: &PropValue) {
        match path.leaf() {
            "label" => self.label = value.as_str().unwrap_or_default().to_owned(),
            "text" => self.text = value.as_str().map(str::to_owned),
            _ => {}
        }
    }

    fn lifecycle(&mut self, event: Lifecycle, _cx: &mut ComponentContext<'_>) {
        record(&self.label, &format!("{event:?}"));
    }
}

/// Passes its children through while the `visible` prop is true, and renders nothing otherwise.
#[derive(Debug, Default)]
pub struct Switch {
    visible: bool,
}

impl Switch {
    pub fn node(visible: bool, children: Vec<Option<VNode>>) -> VNode {
        Self::node_with(Props::new(), visible, children)
    }

    pub fn node_with(props: Props, visible: bool, children: Vec<Option<VNode>>) -> VNode {
        VNode::component(
            ComponentType::of::<Switch>(),
            props.with("visible", visible),
            children,
        )
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl Component for Switch {
    fn render(&mut self, cx: &mut ComponentContext<'_>) -> Result<Render, RenderError> {
        if !self.visible {
            return Ok(Render::Empty);
        }
        Ok(Render::Nodes(cx.children().to_vec()))
    }

    fn set_property(&mut self, path: &PropPath, value: &PropValue) {
        if path.leaf() == "visible" {
            self.visible = value.as_bool().unwrap_or(false);
        }
    }
}
