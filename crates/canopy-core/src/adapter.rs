//! The seam between the engine and a host scene graph.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::error::NodeError;
use crate::props::{PropPath, PropValue};
use crate::vnode::ElementType;
use crate::LiveNode;

/// Host operations the reconciler needs.
///
/// Mutations are issued only when a diff requires them; the four queries are
/// used to resolve insertion points and never mutate.
pub trait LiveNodeAdapter {
    fn construct(&mut self, ty: &ElementType) -> Result<LiveNode, NodeError>;

    /// Appends `child` as the last child of `parent`, detaching it first if attached.
    fn append(&mut self, parent: LiveNode, child: LiveNode) -> Result<(), NodeError>;

    /// Places `node` directly after `sibling`, moving it if already attached.
    fn insert_after(&mut self, sibling: LiveNode, node: LiveNode) -> Result<(), NodeError>;

    /// Places `child` as the first child of `parent`.
    fn prepend(&mut self, parent: LiveNode, child: LiveNode) -> Result<(), NodeError> {
        match self.first_child(parent)? {
            Some(first) if first == child => Ok(()),
            Some(first) => {
                self.insert_after(first, child)?;
                self.insert_after(child, first)
            }
            None => self.append(parent, child),
        }
    }

    /// Detaches `node` and releases it together with its descendants.
    fn remove(&mut self, node: LiveNode) -> Result<(), NodeError>;

    fn set_property(
        &mut self,
        node: LiveNode,
        path: &PropPath,
        value: &PropValue,
    ) -> Result<(), NodeError>;

    fn first_child(&self, parent: LiveNode) -> Result<Option<LiveNode>, NodeError>;
    fn last_child(&self, parent: LiveNode) -> Result<Option<LiveNode>, NodeError>;
    fn previous_sibling(&self, node: LiveNode) -> Result<Option<LiveNode>, NodeError>;
    fn parent(&self, node: LiveNode) -> Result<Option<LiveNode>, NodeError>;
}

/// One recorded mutation of a [`MemoryAdapter`].
///
/// `moved` is set when the node was already attached before the call, i.e.
/// the operation repositioned an existing node.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterOp {
    Construct { node: LiveNode, ty: ElementType },
    Append { parent: LiveNode, child: LiveNode, moved: bool },
    Prepend { parent: LiveNode, child: LiveNode, moved: bool },
    InsertAfter { sibling: LiveNode, node: LiveNode, moved: bool },
    Remove { node: LiveNode },
    SetProperty { node: LiveNode, path: String, value: PropValue },
}

impl AdapterOp {
    pub fn is_move(&self) -> bool {
        matches!(
            self,
            AdapterOp::Append { moved: true, .. }
                | AdapterOp::Prepend { moved: true, .. }
                | AdapterOp::InsertAfter { moved: true, .. }
        )
    }
}

#[derive(Debug)]
struct MemoryNode {
    ty: ElementType,
    parent: Option<LiveNode>,
    children: Vec<LiveNode>,
    props: IndexMap<String, PropValue>,
}

/// In-memory scene graph that records every mutation it receives.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    nodes: Vec<Option<MemoryNode>>,
    ops: Vec<AdapterOp>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, id: LiveNode) -> Result<&MemoryNode, NodeError> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(NodeError::Missing { node: id })
    }

    fn node_mut(&mut self, id: LiveNode) -> Result<&mut MemoryNode, NodeError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(NodeError::Missing { node: id })
    }

    fn detach(&mut self, node: LiveNode) -> Result<bool, NodeError> {
        let Some(parent) = self.node_mut(node)?.parent.take() else {
            return Ok(false);
        };
        self.node_mut(parent)?.children.retain(|child| *child != node);
        Ok(true)
    }

    /// Fails when `node` is `target` or one of its ancestors.
    fn ensure_acyclic(&self, node: LiveNode, target: LiveNode) -> Result<(), NodeError> {
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            if current == node {
                return Err(NodeError::Cycle { node });
            }
            cursor = self.node(current)?.parent;
        }
        Ok(())
    }

    fn insert_at(&mut self, parent: LiveNode, index: usize, node: LiveNode) -> Result<(), NodeError> {
        let children = &mut self.node_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn release(&mut self, node: LiveNode) {
        let Some(released) = self.nodes.get_mut(node.index()).and_then(Option::take) else {
            return;
        };
        for child in released.children {
            self.release(child);
        }
    }

    pub fn exists(&self, node: LiveNode) -> bool {
        self.node(node).is_ok()
    }

    /// Number of live (not yet removed) nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_type(&self, node: LiveNode) -> Option<&ElementType> {
        self.node(node).ok().map(|node| &node.ty)
    }

    pub fn children(&self, node: LiveNode) -> Vec<LiveNode> {
        self.node(node)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Reads a (possibly nested, dotted) property.
    pub fn property(&self, node: LiveNode, path: &str) -> Option<&PropValue> {
        let node = self.node(node).ok()?;
        let mut segments = path.split('.');
        let mut value = node.props.get(segments.next()?)?;
        for segment in segments {
            value = value.as_map()?.get(segment)?;
        }
        Some(value)
    }

    pub fn ops(&self) -> &[AdapterOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<AdapterOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Renders the subtree under `root` as an indented outline.
    pub fn dump_tree(&self, root: LiveNode) -> String {
        let mut out = String::new();
        self.dump_node(root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: LiveNode, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let Ok(node) = self.node(id) else {
            let _ = writeln!(out, "{indent}<missing #{}>", id.0);
            return;
        };
        let _ = write!(out, "{indent}{} #{}", node.ty, id.0);
        for (name, value) in &node.props {
            if !value.is_null() {
                let _ = write!(out, " {name}={value}");
            }
        }
        out.push('\n');
        for child in &node.children {
            self.dump_node(*child, depth + 1, out);
        }
    }
}

impl LiveNodeAdapter for MemoryAdapter {
    fn construct(&mut self, ty: &ElementType) -> Result<LiveNode, NodeError> {
        let node = LiveNode(self.nodes.len() as u64);
        self.nodes.push(Some(MemoryNode {
            ty: ty.clone(),
            parent: None,
            children: Vec::new(),
            props: IndexMap::new(),
        }));
        self.ops.push(AdapterOp::Construct {
            node,
            ty: ty.clone(),
        });
        Ok(node)
    }

    fn append(&mut self, parent: LiveNode, child: LiveNode) -> Result<(), NodeError> {
        self.ensure_acyclic(child, parent)?;
        let moved = self.detach(child)?;
        let end = self.node(parent)?.children.len();
        self.insert_at(parent, end, child)?;
        self.ops.push(AdapterOp::Append {
            parent,
            child,
            moved,
        });
        Ok(())
    }

    fn insert_after(&mut self, sibling: LiveNode, node: LiveNode) -> Result<(), NodeError> {
        if sibling == node {
            return Err(NodeError::Cycle { node });
        }
        let parent = self
            .node(sibling)?
            .parent
            .ok_or(NodeError::NotAttached { node: sibling })?;
        self.ensure_acyclic(node, parent)?;
        let moved = self.detach(node)?;
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|child| *child == sibling)
            .ok_or(NodeError::NotAttached { node: sibling })?;
        self.insert_at(parent, index + 1, node)?;
        self.ops.push(AdapterOp::InsertAfter {
            sibling,
            node,
            moved,
        });
        Ok(())
    }

    fn prepend(&mut self, parent: LiveNode, child: LiveNode) -> Result<(), NodeError> {
        self.ensure_acyclic(child, parent)?;
        let moved = self.detach(child)?;
        self.insert_at(parent, 0, child)?;
        self.ops.push(AdapterOp::Prepend {
            parent,
            child,
            moved,
        });
        Ok(())
    }

    fn remove(&mut self, node: LiveNode) -> Result<(), NodeError> {
        self.node(node)?;
        self.detach(node)?;
        self.release(node);
        self.ops.push(AdapterOp::Remove { node });
        Ok(())
    }

    fn set_property(
        &mut self,
        node: LiveNode,
        path: &PropPath,
        value: &PropValue,
    ) -> Result<(), NodeError> {
        let (leaf, parents) = path
            .segments()
            .split_last()
            .ok_or_else(|| NodeError::PathNotFound {
                node,
                path: path.dotted(),
            })?;
        let mut target = &mut self.node_mut(node)?.props;
        for segment in parents {
            let entry = target
                .entry(segment.clone())
                .or_insert_with(|| PropValue::Map(IndexMap::new()));
            if entry.is_null() {
                *entry = PropValue::Map(IndexMap::new());
            }
            target = entry.as_map_mut().ok_or_else(|| NodeError::PathNotFound {
                node,
                path: path.dotted(),
            })?;
        }
        target.insert(leaf.clone(), value.clone());
        self.ops.push(AdapterOp::SetProperty {
            node,
            path: path.dotted(),
            value: value.clone(),
        });
        Ok(())
    }

    fn first_child(&self, parent: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        Ok(self.node(parent)?.children.first().copied())
    }

    fn last_child(&self, parent: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        Ok(self.node(parent)?.children.last().copied())
    }

    fn previous_sibling(&self, node: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(None);
        };
        let siblings = &self.node(parent)?.children;
        let index = siblings
            .iter()
            .position(|child| *child == node)
            .ok_or(NodeError::NotAttached { node })?;
        Ok(index.checked_sub(1).map(|prev| siblings[prev]))
    }

    fn parent(&self, node: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        Ok(self.node(node)?.parent)
    }
}

#[cfg(test)]
#[path = "tests/adapter_tests.rs"]
mod tests;
