use super::*;

fn adapter_with_parent() -> (MemoryAdapter, LiveNode) {
    let mut adapter = MemoryAdapter::new();
    let parent = adapter.construct(&ElementType::VIEW).expect("parent");
    (adapter, parent)
}

fn attach(adapter: &mut MemoryAdapter, parent: LiveNode, count: usize) -> Vec<LiveNode> {
    (0..count)
        .map(|_| {
            let node = adapter.construct(&ElementType::TEXT).expect("child");
            adapter.append(parent, node).expect("append");
            node
        })
        .collect()
}

/// Delegates everything except `prepend`, so the trait's default is exercised.
struct NoPrepend(MemoryAdapter);

impl LiveNodeAdapter for NoPrepend {
    fn construct(&mut self, ty: &ElementType) -> Result<LiveNode, NodeError> {
        self.0.construct(ty)
    }

    fn append(&mut self, parent: LiveNode, child: LiveNode) -> Result<(), NodeError> {
        self.0.append(parent, child)
    }

    fn insert_after(&mut self, sibling: LiveNode, node: LiveNode) -> Result<(), NodeError> {
        self.0.insert_after(sibling, node)
    }

    fn remove(&mut self, node: LiveNode) -> Result<(), NodeError> {
        self.0.remove(node)
    }

    fn set_property(
        &mut self,
        node: LiveNode,
        path: &PropPath,
        value: &PropValue,
    ) -> Result<(), NodeError> {
        self.0.set_property(node, path, value)
    }

    fn first_child(&self, parent: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        self.0.first_child(parent)
    }

    fn last_child(&self, parent: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        self.0.last_child(parent)
    }

    fn previous_sibling(&self, node: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        self.0.previous_sibling(node)
    }

    fn parent(&self, node: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        self.0.parent(node)
    }
}

#[test]
fn insert_after_moves_an_attached_node() {
    let (mut adapter, parent) = adapter_with_parent();
    let nodes = attach(&mut adapter, parent, 3);
    adapter.clear_ops();

    adapter.insert_after(nodes[2], nodes[0]).expect("move");

    assert_eq!(adapter.children(parent), vec![nodes[1], nodes[2], nodes[0]]);
    assert_eq!(
        adapter.ops(),
        &[AdapterOp::InsertAfter {
            sibling: nodes[2],
            node: nodes[0],
            moved: true,
        }]
    );
    assert!(adapter.ops()[0].is_move());
}

#[test]
fn insert_after_requires_an_attached_sibling() {
    let mut adapter = MemoryAdapter::new();
    let loose = adapter.construct(&ElementType::VIEW).expect("loose");
    let other = adapter.construct(&ElementType::VIEW).expect("other");

    let err = adapter.insert_after(loose, other).expect_err("no parent");
    assert_eq!(err, NodeError::NotAttached { node: loose });
}

#[test]
fn appending_an_ancestor_is_a_cycle() {
    let (mut adapter, parent) = adapter_with_parent();
    let nodes = attach(&mut adapter, parent, 1);

    let err = adapter.append(nodes[0], parent).expect_err("cycle");
    assert_eq!(err, NodeError::Cycle { node: parent });
}

#[test]
fn prepend_places_node_first() {
    let (mut adapter, parent) = adapter_with_parent();
    let nodes = attach(&mut adapter, parent, 3);

    adapter.prepend(parent, nodes[2]).expect("prepend");

    assert_eq!(adapter.children(parent), vec![nodes[2], nodes[0], nodes[1]]);
}

#[test]
fn default_prepend_is_built_from_insert_after() {
    let mut adapter = NoPrepend(MemoryAdapter::new());
    let parent = adapter.construct(&ElementType::VIEW).expect("parent");
    let first = adapter.construct(&ElementType::TEXT).expect("first");
    let second = adapter.construct(&ElementType::TEXT).expect("second");

    adapter.prepend(parent, second).expect("prepend into empty parent");
    adapter.prepend(parent, first).expect("prepend before existing child");
    adapter.prepend(parent, first).expect("already first");

    assert_eq!(adapter.0.children(parent), vec![first, second]);
}

#[test]
fn remove_releases_descendants() {
    let (mut adapter, parent) = adapter_with_parent();
    let nodes = attach(&mut adapter, parent, 2);
    let grandchild = adapter.construct(&ElementType::TEXT).expect("grandchild");
    adapter.append(nodes[0], grandchild).expect("append");

    adapter.remove(nodes[0]).expect("remove");

    assert_eq!(adapter.children(parent), vec![nodes[1]]);
    assert!(!adapter.exists(nodes[0]));
    assert!(!adapter.exists(grandchild));
    assert_eq!(
        adapter.remove(nodes[0]),
        Err(NodeError::Missing { node: nodes[0] })
    );
}

#[test]
fn nested_property_paths_walk_intermediate_maps() {
    let (mut adapter, node) = adapter_with_parent();

    adapter
        .set_property(node, &PropPath::parse("border.color"), &PropValue::from("blue"))
        .expect("nested");
    adapter
        .set_property(node, &PropPath::parse("border.width"), &PropValue::from(2))
        .expect("sibling field");

    assert_eq!(
        adapter.property(node, "border.color"),
        Some(&PropValue::from("blue"))
    );
    assert_eq!(adapter.property(node, "border.width"), Some(&PropValue::Int(2)));

    adapter
        .set_property(node, &PropPath::parse("title"), &PropValue::from("x"))
        .expect("flat");
    let err = adapter
        .set_property(node, &PropPath::parse("title.size"), &PropValue::from(1))
        .expect_err("title is not an object");
    assert!(matches!(err, NodeError::PathNotFound { .. }));
}

#[test]
fn sibling_queries_follow_child_order() {
    let (mut adapter, parent) = adapter_with_parent();
    let nodes = attach(&mut adapter, parent, 2);

    assert_eq!(adapter.first_child(parent), Ok(Some(nodes[0])));
    assert_eq!(adapter.last_child(parent), Ok(Some(nodes[1])));
    assert_eq!(adapter.previous_sibling(nodes[1]), Ok(Some(nodes[0])));
    assert_eq!(adapter.previous_sibling(nodes[0]), Ok(None));
    assert_eq!(adapter.parent(nodes[0]), Ok(Some(parent)));
    assert_eq!(adapter.parent(parent), Ok(None));
}

#[test]
fn dump_tree_lists_types_and_props() {
    let (mut adapter, parent) = adapter_with_parent();
    let nodes = attach(&mut adapter, parent, 1);
    adapter
        .set_property(nodes[0], &PropPath::parse("value"), &PropValue::from("hi"))
        .expect("prop");

    let dump = adapter.dump_tree(parent);
    assert_eq!(dump, format!("view #{}\n  text #{} value=hi\n", parent.0, nodes[0].0));
}
