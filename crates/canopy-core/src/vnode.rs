//! Immutable virtual nodes and their structural hashes.
//!
//! A [`VNode`] is built bottom-up: its hash folds the node type, the
//! property hash and every child hash, so two nodes with equal hashes are
//! treated as structurally identical by the reconciler. Nodes are shared as
//! `Rc<VNode>` once built; the only mutation allowed afterwards is
//! [`VNode::set_default_style`], which requires exclusive ownership.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::component::Component;
use crate::error::{Error, Result};
use crate::hash::{self, hash_one};
use crate::keyed::KeyedGroup;
use crate::props::{PropValue, Props, STYLE};

/// Tag of a host element understood by the [`LiveNodeAdapter`](crate::LiveNodeAdapter).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementType(Cow<'static, str>);

impl ElementType {
    /// Generic container; also the default placeholder type.
    pub const VIEW: ElementType = ElementType(Cow::Borrowed("view"));
    /// Text leaf; its content lives in the `value` property.
    pub const TEXT: ElementType = ElementType(Cow::Borrowed("text"));

    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type Factory = Rc<dyn Fn() -> Box<dyn Component>>;

/// Identity of a component class plus the factory that instantiates it.
///
/// Two component types are the same type when they wrap the same Rust type,
/// regardless of which factory produced them.
#[derive(Clone)]
pub struct ComponentType {
    name: &'static str,
    type_id: TypeId,
    factory: Option<Factory>,
}

impl ComponentType {
    pub fn of<C: Component + Default>() -> Self {
        Self::with_factory(C::default)
    }

    pub fn with_factory<C: Component>(factory: impl Fn() -> C + 'static) -> Self {
        Self {
            name: short_type_name::<C>(),
            type_id: TypeId::of::<C>(),
            factory: Some(Rc::new(move || Box::new(factory()) as Box<dyn Component>)),
        }
    }

    /// A type without a factory; only usable for already-created instances.
    pub(crate) fn instance_only<C: Component>() -> Self {
        Self {
            name: short_type_name::<C>(),
            type_id: TypeId::of::<C>(),
            factory: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn instantiate(&self) -> Result<Box<dyn Component>> {
        self.factory
            .as_ref()
            .map(|factory| factory())
            .ok_or(Error::NoFactory {
                component: self.name,
            })
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}

fn short_type_name<C>() -> &'static str {
    let full = std::any::type_name::<C>();
    full.rsplit("::").next().unwrap_or(full)
}

/// What a virtual node describes.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(ElementType),
    Component(ComponentType),
    Group(KeyedGroup),
}

impl NodeKind {
    /// Same element tag, same component class, or both keyed groups.
    pub fn same_type(&self, other: &NodeKind) -> bool {
        match (self, other) {
            (NodeKind::Element(a), NodeKind::Element(b)) => a == b,
            (NodeKind::Component(a), NodeKind::Component(b)) => a == b,
            (NodeKind::Group(_), NodeKind::Group(_)) => true,
            _ => false,
        }
    }

    fn type_hash(&self) -> u64 {
        match self {
            NodeKind::Element(ty) => hash_one(&("element", ty.name())),
            NodeKind::Component(ty) => hash_one(&ty.type_id()),
            NodeKind::Group(_) => hash_one("group"),
        }
    }

    pub fn describe(&self) -> &str {
        match self {
            NodeKind::Element(ty) => ty.name(),
            NodeKind::Component(ty) => ty.name(),
            NodeKind::Group(_) => "group",
        }
    }
}

/// Immutable description of a host element, a component or a keyed group.
#[derive(Debug, Clone)]
pub struct VNode {
    kind: NodeKind,
    props: Props,
    children: Vec<Option<Rc<VNode>>>,
    hash: u64,
}

impl VNode {
    pub fn element(ty: ElementType, props: Props, children: Vec<Option<VNode>>) -> Self {
        Self::new(
            NodeKind::Element(ty),
            props,
            children.into_iter().map(|child| child.map(Rc::new)).collect(),
        )
    }

    /// Shorthand for an element without children.
    pub fn leaf(ty: ElementType, props: Props) -> Self {
        Self::element(ty, props, Vec::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::leaf(ElementType::TEXT, Props::new().with("value", value.into()))
    }

    /// A component node; `children` are handed to the instance as pending children.
    pub fn component(ty: ComponentType, props: Props, children: Vec<Option<VNode>>) -> Self {
        Self::new(
            NodeKind::Component(ty),
            props,
            children.into_iter().map(|child| child.map(Rc::new)).collect(),
        )
    }

    /// Builds a keyed group; fails when two entries share a key.
    pub fn group(entries: Vec<Option<VNode>>) -> Result<Self> {
        let group = KeyedGroup::new(entries.into_iter().flatten().map(Rc::new).collect())?;
        Ok(Self::from_group(group))
    }

    pub fn from_group(group: KeyedGroup) -> Self {
        Self::new(NodeKind::Group(group), Props::new(), Vec::new())
    }

    /// Builds a node from already shared children.
    pub fn with_shared_children(
        kind: NodeKind,
        props: Props,
        children: Vec<Option<Rc<VNode>>>,
    ) -> Self {
        Self::new(kind, props, children)
    }

    fn new(kind: NodeKind, props: Props, children: Vec<Option<Rc<VNode>>>) -> Self {
        let hash = Self::structural_hash(&kind, &props, &children);
        Self {
            kind,
            props,
            children,
            hash,
        }
    }

    fn structural_hash(kind: &NodeKind, props: &Props, children: &[Option<Rc<VNode>>]) -> u64 {
        let mut acc = hash::combine(kind.type_hash(), props.hash());
        match kind {
            NodeKind::Group(group) => {
                for (_, entry) in group.iter() {
                    acc = hash::fold(acc, entry.hash);
                }
            }
            _ => {
                // absent children still shift the hash so positions stay significant
                for child in children {
                    acc = hash::fold(acc, child.as_ref().map_or(0, |child| child.hash));
                }
            }
        }
        acc
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn prop(&self, path: &str) -> Option<&PropValue> {
        self.props.get(path)
    }

    pub fn children(&self) -> &[Option<Rc<VNode>>] {
        &self.children
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    /// Applies a component's default style when this node does not set one.
    ///
    /// Takes `&mut self`, so it can only run on a node that is not yet shared
    /// with (or materialized by) the engine. Groups ignore the style.
    pub fn set_default_style(&mut self, style: PropValue) {
        if self.is_group() || style.is_null() {
            return;
        }
        if self.props.insert_default(STYLE, style).is_some() {
            self.hash = Self::structural_hash(&self.kind, &self.props, &self.children);
        }
    }
}

impl PartialEq for VNode {
    fn eq(&self, other: &Self) -> bool {
        if !self.kind.same_type(&other.kind) || self.props != other.props {
            return false;
        }
        match (&self.kind, &other.kind) {
            (NodeKind::Group(a), NodeKind::Group(b)) => a == b,
            _ => self.children == other.children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> VNode {
        VNode::leaf(ElementType::new("label"), Props::new().with("text", text))
    }

    #[test]
    fn equal_trees_hash_equal() {
        let a = VNode::element(ElementType::VIEW, Props::new(), vec![Some(label("a"))]);
        let b = VNode::element(ElementType::VIEW, Props::new(), vec![Some(label("a"))]);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a, b);
    }

    #[test]
    fn child_change_changes_parent_hash() {
        let a = VNode::element(ElementType::VIEW, Props::new(), vec![Some(label("a"))]);
        let b = VNode::element(ElementType::VIEW, Props::new(), vec![Some(label("b"))]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn absent_child_positions_are_significant() {
        let a = VNode::element(ElementType::VIEW, Props::new(), vec![None, Some(label("a"))]);
        let b = VNode::element(ElementType::VIEW, Props::new(), vec![Some(label("a")), None]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn trailing_absent_child_changes_the_hash() {
        let a = VNode::element(ElementType::VIEW, Props::new(), vec![Some(label("a"))]);
        let b = VNode::element(ElementType::VIEW, Props::new(), vec![Some(label("a")), None]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn element_type_participates_in_hash() {
        let a = VNode::leaf(ElementType::new("label"), Props::new());
        let b = VNode::leaf(ElementType::new("button"), Props::new());
        assert_ne!(a.hash(), b.hash());
        assert!(!a.kind().same_type(b.kind()));
    }

    #[test]
    fn default_style_only_fills_missing_style() {
        let mut plain = label("a");
        let before = plain.hash();
        plain.set_default_style(PropValue::from("bold"));
        assert_eq!(plain.prop(STYLE), Some(&PropValue::from("bold")));
        assert_ne!(plain.hash(), before);

        let mut styled = VNode::leaf(ElementType::new("label"), Props::new().with(STYLE, "thin"));
        let before = styled.hash();
        styled.set_default_style(PropValue::from("bold"));
        assert_eq!(styled.prop(STYLE), Some(&PropValue::from("thin")));
        assert_eq!(styled.hash(), before);
    }
}
