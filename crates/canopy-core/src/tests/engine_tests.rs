use super::*;
use crate::adapter::MemoryAdapter;
use crate::props::PropValue;
use crate::vnode::ElementType;

fn label(key: i64, text: &str) -> VNode {
    VNode::leaf(
        ElementType::new("label"),
        Props::new().with("key", key).with("text", text),
    )
}

#[derive(Default)]
struct Pair;

impl Component for Pair {
    fn render(
        &mut self,
        _cx: &mut crate::component::ComponentContext<'_>,
    ) -> Result<crate::component::Render, crate::error::RenderError> {
        Ok(vec![label(1, "a"), label(2, "b")].into())
    }
}

#[test]
fn render_without_parent_returns_the_single_node() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let node = engine.render(VNode::text("hello"), None).expect("render");
    assert_eq!(
        engine.adapter().property(node, "value"),
        Some(&PropValue::from("hello"))
    );
    assert_eq!(engine.adapter().parent(node), Ok(None));
}

#[test]
fn render_without_parent_rejects_multiple_nodes() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let group = VNode::group(vec![Some(label(1, "a")), Some(label(2, "b"))]).expect("group");

    let err = engine.render(group, None).expect_err("two top-level nodes");

    assert!(matches!(err, Error::InvalidRoot { .. }));
    assert!(engine.adapter().is_empty());
}

#[test]
fn render_with_parent_appends_every_top_level_node() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let host = engine.adapter_mut().construct(&ElementType::VIEW).expect("host");

    let first = engine
        .render(ComponentType::of::<Pair>(), Some(host))
        .expect("render");

    let children = engine.adapter().children(host);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], first);
}

#[test]
fn unmount_releases_nodes_and_components() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let host = engine.adapter_mut().construct(&ElementType::VIEW).expect("host");
    let root = engine
        .mount(ComponentType::of::<Pair>(), Some(host))
        .expect("mount");
    assert_eq!(engine.component_count(), 1);

    engine.unmount(root).expect("unmount");

    assert!(engine.adapter().children(host).is_empty());
    assert_eq!(engine.component_count(), 0);
    assert_eq!(engine.adapter().len(), 1);
    assert!(matches!(engine.unmount(root), Err(Error::UnknownRoot)));
}

#[test]
fn shutdown_unmounts_every_root() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let host = engine.adapter_mut().construct(&ElementType::VIEW).expect("host");
    engine
        .mount(ComponentType::of::<Pair>(), Some(host))
        .expect("first");
    engine.mount(VNode::text("x"), Some(host)).expect("second");

    engine.shutdown().expect("shutdown");

    assert!(engine.adapter().children(host).is_empty());
    assert_eq!(engine.component_count(), 0);
}

#[test]
fn update_root_keeps_live_identity_for_unchanged_parts() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let host = engine.adapter_mut().construct(&ElementType::VIEW).expect("host");
    let tree = |second: &str| {
        VNode::element(
            ElementType::VIEW,
            Props::new(),
            vec![Some(label(1, "a")), Some(label(2, second))],
        )
    };
    let root = engine.mount(tree("b"), Some(host)).expect("mount");
    let before = engine.root_nodes(root);

    engine.update_root(root, tree("c")).expect("update");

    assert_eq!(engine.root_nodes(root), before);
    assert!(matches!(
        engine.update_root(RootId::default(), tree("d")),
        Err(Error::UnknownRoot)
    ));
}
