use super::*;
use crate::adapter::{AdapterOp, MemoryAdapter};
use crate::config::EngineConfig;
use crate::engine::RootId;
use crate::props::Props;
use crate::vnode::ElementType;

const LABEL: ElementType = ElementType::new("label");
const BUTTON: ElementType = ElementType::new("button");

fn label(text: &str) -> VNode {
    VNode::leaf(LABEL, Props::new().with("text", text))
}

fn view(props: Props, children: Vec<Option<VNode>>) -> VNode {
    VNode::element(ElementType::VIEW, props, children)
}

fn mount(engine: &mut Engine<MemoryAdapter>, tree: VNode) -> (RootId, LiveNode) {
    let host = engine
        .adapter_mut()
        .construct(&ElementType::new("host"))
        .expect("host");
    let root = engine.mount(tree, Some(host)).expect("mount");
    let node = engine.root_node(root).expect("root node");
    engine.adapter_mut().clear_ops();
    (root, node)
}

#[test]
fn materialize_builds_children_before_assigning_props() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let tree = view(
        Props::new().with("color", "red").with("key", 7),
        vec![Some(label("a")), None, Some(label("b"))],
    );

    let node = engine.render(tree, None).expect("render");

    let adapter = engine.adapter();
    let children = adapter.children(node);
    assert_eq!(children.len(), 2);
    assert_eq!(adapter.property(children[0], "text"), Some(&PropValue::from("a")));
    assert_eq!(adapter.property(children[1], "text"), Some(&PropValue::from("b")));
    assert_eq!(adapter.property(node, "color"), Some(&PropValue::from("red")));
    assert_eq!(adapter.property(node, "key"), None);

    let last_append = adapter
        .ops()
        .iter()
        .rposition(|op| matches!(op, AdapterOp::Append { .. }))
        .expect("children appended");
    let color = adapter
        .ops()
        .iter()
        .position(|op| matches!(op, AdapterOp::SetProperty { node: n, .. } if *n == node))
        .expect("color assigned");
    assert!(last_append < color);
}

#[test]
fn identical_tree_issues_no_mutations() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let tree = || view(Props::new().with("color", "red"), vec![Some(label("a"))]);
    let (root, _) = mount(&mut engine, tree());

    engine.update_root(root, tree()).expect("update");

    assert!(engine.adapter().ops().is_empty());
}

#[test]
fn only_changed_properties_are_assigned() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let (root, node) = mount(
        &mut engine,
        view(Props::new().with("color", "red").with("width", 10), Vec::new()),
    );

    engine
        .update_root(
            root,
            view(Props::new().with("color", "blue").with("width", 10), Vec::new()),
        )
        .expect("update");

    assert_eq!(
        engine.adapter().ops(),
        &[AdapterOp::SetProperty {
            node,
            path: "color".into(),
            value: PropValue::from("blue"),
        }]
    );
}

#[test]
fn dropped_properties_are_reset_to_null() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let (root, node) = mount(
        &mut engine,
        view(Props::new().with("color", "red").with("border.width", 2), Vec::new()),
    );

    engine
        .update_root(root, view(Props::new().with("color", "red"), Vec::new()))
        .expect("update");

    assert_eq!(engine.adapter().property(node, "border.width"), Some(&PropValue::Null));
    assert_eq!(engine.adapter().ops().len(), 1);
}

#[test]
fn type_change_replaces_the_subtree_in_place() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let (root, node) = mount(
        &mut engine,
        view(Props::new(), vec![Some(label("a")), Some(label("b")), Some(label("c"))]),
    );
    let before = engine.adapter().children(node);

    let button = VNode::leaf(BUTTON, Props::new().with("text", "b"));
    engine
        .update_root(
            root,
            view(Props::new(), vec![Some(label("a")), Some(button), Some(label("c"))]),
        )
        .expect("update");

    let after = engine.adapter().children(node);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(engine.adapter().node_type(after[1]), Some(&BUTTON));
    assert!(!engine.adapter().exists(before[1]));
    assert_eq!(
        engine.adapter().ops().last(),
        Some(&AdapterOp::Remove { node: before[1] })
    );
}

#[test]
fn absent_slot_gaining_a_child_inserts_at_its_position() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let (root, node) = mount(
        &mut engine,
        view(Props::new(), vec![Some(label("a")), None, Some(label("c"))]),
    );
    let before = engine.adapter().children(node);

    engine
        .update_root(
            root,
            view(Props::new(), vec![Some(label("a")), Some(label("b")), Some(label("c"))]),
        )
        .expect("update");

    let after = engine.adapter().children(node);
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[1]);
    assert_eq!(engine.adapter().property(after[1], "text"), Some(&PropValue::from("b")));
}

#[test]
fn first_slot_gaining_a_child_is_prepended() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let (root, node) = mount(&mut engine, view(Props::new(), vec![None, Some(label("b"))]));

    engine
        .update_root(root, view(Props::new(), vec![Some(label("a")), Some(label("b"))]))
        .expect("update");

    let texts: Vec<_> = engine
        .adapter()
        .children(node)
        .into_iter()
        .filter_map(|child| engine.adapter().property(child, "text").cloned())
        .collect();
    assert_eq!(texts, vec![PropValue::from("a"), PropValue::from("b")]);
}

#[test]
fn trailing_children_are_removed() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let (root, node) = mount(
        &mut engine,
        view(Props::new(), vec![Some(label("a")), Some(label("b"))]),
    );
    let before = engine.adapter().children(node);

    engine
        .update_root(root, view(Props::new(), vec![Some(label("a"))]))
        .expect("update");

    assert_eq!(engine.adapter().children(node), vec![before[0]]);
    assert_eq!(engine.adapter().ops(), &[AdapterOp::Remove { node: before[1] }]);
}

#[test]
fn identifiers_follow_their_nodes() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let titled = |id: &str| {
        view(
            Props::new(),
            vec![Some(VNode::leaf(LABEL, Props::new().with("id", id).with("text", "t")))],
        )
    };
    let (root, node) = mount(&mut engine, titled("title"));
    let title = engine.adapter().children(node)[0];
    assert_eq!(engine.root_lookup(root, "title"), Some(IdTarget::Node(title)));
    assert!(engine.adapter().property(title, "id").is_none());

    engine.update_root(root, titled("heading")).expect("rename");
    assert_eq!(engine.root_lookup(root, "title"), None);
    assert_eq!(engine.root_lookup(root, "heading"), Some(IdTarget::Node(title)));

    engine
        .update_root(root, view(Props::new(), Vec::new()))
        .expect("drop child");
    assert_eq!(engine.root_lookup(root, "heading"), None);
}

#[test]
fn duplicate_identifier_in_one_scope_fails() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let tree = view(
        Props::new(),
        vec![
            Some(VNode::leaf(LABEL, Props::new().with("id", "x"))),
            Some(VNode::leaf(LABEL, Props::new().with("id", "x"))),
        ],
    );

    let err = engine.render(tree, None).expect_err("duplicate id");
    assert!(matches!(err, Error::DuplicateId { id } if id == "x"));
}

#[test]
fn type_change_keeps_the_identifier_on_the_replacement() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let (root, outer) = mount(
        &mut engine,
        view(
            Props::new(),
            vec![Some(view(Props::new().with("id", "title"), Vec::new()))],
        ),
    );

    engine
        .update_root(
            root,
            view(
                Props::new(),
                vec![Some(VNode::leaf(LABEL, Props::new().with("id", "title")))],
            ),
        )
        .expect("replace keeps the id");

    let replacement = engine.adapter().children(outer)[0];
    assert_eq!(engine.adapter().node_type(replacement), Some(&LABEL));
    assert_eq!(
        engine.root_lookup(root, "title"),
        Some(IdTarget::Node(replacement))
    );
}

#[test]
fn identifier_can_move_to_an_earlier_sibling() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let (root, outer) = mount(
        &mut engine,
        view(
            Props::new(),
            vec![
                Some(label("a")),
                Some(VNode::leaf(LABEL, Props::new().with("text", "b").with("id", "sel"))),
            ],
        ),
    );

    engine
        .update_root(
            root,
            view(
                Props::new(),
                vec![
                    Some(VNode::leaf(LABEL, Props::new().with("text", "a").with("id", "sel"))),
                    Some(label("b")),
                ],
            ),
        )
        .expect("id moves");

    let first = engine.adapter().children(outer)[0];
    assert_eq!(engine.root_lookup(root, "sel"), Some(IdTarget::Node(first)));
}

#[test]
fn update_adding_a_second_holder_of_an_identifier_fails() {
    let mut engine = Engine::new(MemoryAdapter::new());
    let held = || VNode::leaf(LABEL, Props::new().with("id", "x"));
    let (root, _) = mount(&mut engine, view(Props::new(), vec![Some(held())]));

    let err = engine
        .update_root(root, view(Props::new(), vec![Some(held()), Some(held())]))
        .expect_err("duplicate id");
    assert!(matches!(err, Error::DuplicateId { id } if id == "x"));
}

#[test]
fn verified_hash_matches_still_reuse_equal_trees() {
    let config = EngineConfig::default().with_verify_hash_matches(true);
    let mut engine = Engine::with_config(MemoryAdapter::new(), config);
    let tree = || view(Props::new(), vec![Some(label("a"))]);
    let (root, _) = mount(&mut engine, tree());

    engine.update_root(root, tree()).expect("update");

    assert!(engine.adapter().ops().is_empty());
}
