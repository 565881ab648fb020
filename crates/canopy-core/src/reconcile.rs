//! Materializing virtual trees into live nodes and patching them in place.
//!
//! A realized subtree is tracked as a [`Mounted`]: the virtual node it was
//! last built from plus the live structure that represents it. Reconciling
//! an old `Mounted` against a new virtual node either reuses it untouched
//! (equal structural hash), patches it (same type), or replaces it.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::adapter::LiveNodeAdapter;
use crate::component::{ComponentId, Content};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::keyed::{GroupState, Key};
use crate::props::PropValue;
use crate::registry::{IdTarget, Owner};
use crate::vnode::{NodeKind, VNode};
use crate::LiveNode;

/// A virtual node together with the live structure realizing it.
pub(crate) struct Mounted {
    pub vnode: Rc<VNode>,
    pub realized: Realized,
}

pub(crate) enum Realized {
    Element {
        live: LiveNode,
        children: Vec<Option<Mounted>>,
    },
    Component(ComponentId),
    Group {
        entries: IndexMap<Key, Mounted>,
        placeholder: Option<LiveNode>,
    },
}

/// Where the next live node goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    After(LiveNode),
    /// First child of the given parent.
    Start(LiveNode),
    /// Wherever the given node currently sits; resolved before any mutation.
    Before(LiveNode),
    /// No parent to insert into; nodes stay unattached.
    Detached,
}

impl Anchor {
    pub(crate) fn advance(self, last: LiveNode) -> Anchor {
        match self {
            Anchor::Detached => Anchor::Detached,
            _ => Anchor::After(last),
        }
    }
}

impl<A: LiveNodeAdapter> Engine<A> {
    pub(crate) fn same_output(&self, old: &Rc<VNode>, new: &Rc<VNode>) -> bool {
        if Rc::ptr_eq(old, new) {
            return true;
        }
        old.hash() == new.hash() && (!self.config.verify_hash_matches || old == new)
    }

    /// Whether `old` can stand for `new` untouched.
    ///
    /// A component removed directly by the host is never reusable, so the
    /// next diff that reaches it re-creates it.
    pub(crate) fn reusable(&self, old: &Mounted, new: &Rc<VNode>) -> bool {
        if let Realized::Component(id) = old.realized {
            if !self.components.contains_key(id) {
                return false;
            }
        }
        self.same_output(&old.vnode, new)
    }

    /// Builds the live structure for `vnode`. Top-level nodes are left unattached.
    pub(crate) fn materialize(&mut self, vnode: Rc<VNode>, owner: Owner) -> Result<Mounted> {
        let realized = match vnode.kind() {
            NodeKind::Element(ty) => {
                let live = self.adapter.construct(ty)?;
                let mut children = Vec::with_capacity(vnode.children().len());
                for child in vnode.children() {
                    let mounted = match child {
                        Some(child) => {
                            let mounted = self.materialize(Rc::clone(child), owner)?;
                            self.append_all(live, &mounted)?;
                            Some(mounted)
                        }
                        None => None,
                    };
                    children.push(mounted);
                }
                for prop in vnode.props().assignable() {
                    self.adapter.set_property(live, &prop.path, &prop.value)?;
                }
                if let Some(name) = vnode.props().id() {
                    self.register_id(owner, name, IdTarget::Node(live));
                }
                Realized::Element { live, children }
            }
            NodeKind::Component(ty) => {
                let instance = ty.instantiate()?;
                Realized::Component(self.create_component(instance, Rc::clone(&vnode), owner)?)
            }
            NodeKind::Group(group) => {
                let mut entries = IndexMap::with_capacity(group.len());
                for (key, entry) in group.iter() {
                    entries.insert(key.clone(), self.materialize(Rc::clone(entry), owner)?);
                }
                let placeholder = if entries.is_empty() {
                    Some(self.adapter.construct(&self.config.placeholder_type)?)
                } else {
                    None
                };
                Realized::Group {
                    entries,
                    placeholder,
                }
            }
        };
        Ok(Mounted { vnode, realized })
    }

    /// Reconciles `old` into `new`, returning the structure that now realizes `new`.
    ///
    /// `anchor` marks where the first live node of this subtree belongs; only
    /// keyed groups and revived components consult it.
    pub(crate) fn reconcile(
        &mut self,
        old: Mounted,
        new: Rc<VNode>,
        anchor: Anchor,
        owner: Owner,
    ) -> Result<Mounted> {
        if !old.vnode.kind().same_type(new.kind()) {
            return self.replace(old, new, anchor, owner);
        }
        if self.reusable(&old, &new) {
            return Ok(old);
        }

        let Mounted {
            vnode: previous,
            realized,
        } = old;
        let realized = match (realized, new.kind()) {
            (Realized::Element { live, children }, NodeKind::Element(_)) => {
                self.patch_props(live, &previous, &new, owner)?;
                let children = self.patch_children(live, children, &new, owner)?;
                Realized::Element { live, children }
            }
            (Realized::Component(id), NodeKind::Component(ty)) => {
                if self.components.contains_key(id) {
                    self.patch_component(id, &previous, &new, owner)?;
                    Realized::Component(id)
                } else {
                    // removed directly by the host since the last diff
                    let instance = ty.instantiate()?;
                    let id = self.create_component(instance, Rc::clone(&new), owner)?;
                    let revived = Mounted {
                        vnode: Rc::clone(&new),
                        realized: Realized::Component(id),
                    };
                    self.place(anchor, &revived)?;
                    revived.realized
                }
            }
            (
                Realized::Group {
                    entries,
                    placeholder,
                },
                NodeKind::Group(group),
            ) => {
                let state = self.diff_group(
                    GroupState {
                        entries,
                        placeholder,
                    },
                    group,
                    anchor,
                    owner,
                )?;
                Realized::Group {
                    entries: state.entries,
                    placeholder: state.placeholder,
                }
            }
            (realized, _) => {
                let old = Mounted {
                    vnode: previous,
                    realized,
                };
                return self.replace(old, new, anchor, owner);
            }
        };
        Ok(Mounted {
            vnode: new,
            realized,
        })
    }

    /// Materializes `new` after the last live node of `old`, then tears `old` down.
    ///
    /// Ids declared by both trees stay registered: the new holder displaces the
    /// old one and the teardown releases the old claim.
    fn replace(
        &mut self,
        old: Mounted,
        new: Rc<VNode>,
        anchor: Anchor,
        owner: Owner,
    ) -> Result<Mounted> {
        log::trace!(
            "replacing {} with {}",
            old.vnode.kind().describe(),
            new.kind().describe()
        );
        let fresh = self.materialize(new, owner)?;
        let target = match self.last_live(&old) {
            Some(last) => Anchor::After(last),
            None => anchor,
        };
        self.place(target, &fresh)?;
        self.teardown(old, owner, true)?;
        Ok(fresh)
    }

    fn patch_props(
        &mut self,
        live: LiveNode,
        previous: &VNode,
        new: &VNode,
        owner: Owner,
    ) -> Result<()> {
        for prop in new.props().changed_since(previous.props()) {
            self.adapter.set_property(live, &prop.path, &prop.value)?;
        }
        for prop in new.props().removed_since(previous.props()) {
            self.adapter.set_property(live, &prop.path, &PropValue::Null)?;
        }
        self.update_id(
            owner,
            previous.props().id(),
            new.props().id(),
            IdTarget::Node(live),
        );
        Ok(())
    }

    /// Positional diff of element children; absent entries occupy a slot.
    fn patch_children(
        &mut self,
        parent: LiveNode,
        old: Vec<Option<Mounted>>,
        new: &VNode,
        owner: Owner,
    ) -> Result<Vec<Option<Mounted>>> {
        let targets = new.children();
        let len = old.len().max(targets.len());
        let mut old = old.into_iter();
        let mut children = Vec::with_capacity(targets.len());
        let mut prev: Option<LiveNode> = None;

        for index in 0..len {
            let current = old.next().flatten();
            let target = targets.get(index).cloned().flatten();
            let anchor = prev.map_or(Anchor::Start(parent), Anchor::After);
            let slot = match (current, target) {
                (Some(current), Some(target)) => Some(self.reconcile(current, target, anchor, owner)?),
                (Some(current), None) => {
                    self.teardown(current, owner, true)?;
                    None
                }
                (None, Some(target)) => {
                    let mounted = self.materialize(target, owner)?;
                    self.place(anchor, &mounted)?;
                    Some(mounted)
                }
                (None, None) => None,
            };
            if let Some(last) = slot.as_ref().and_then(|mounted| self.last_live(mounted)) {
                prev = Some(last);
            }
            if index < targets.len() {
                children.push(slot);
            }
        }
        Ok(children)
    }

    /// Releases a realized subtree.
    ///
    /// With `detach` the top-level live nodes are removed from their parent;
    /// nested nodes go away with them and are only released logically.
    pub(crate) fn teardown(&mut self, mounted: Mounted, owner: Owner, detach: bool) -> Result<()> {
        match mounted.realized {
            Realized::Element { live, children } => {
                for child in children.into_iter().flatten() {
                    self.teardown(child, owner, false)?;
                }
                if let Some(name) = mounted.vnode.props().id() {
                    self.unregister_id(owner, name, IdTarget::Node(live));
                }
                if detach {
                    self.adapter.remove(live)?;
                }
            }
            Realized::Component(id) => self.remove_component(id, detach)?,
            Realized::Group {
                entries,
                placeholder,
            } => {
                for (_, entry) in entries {
                    self.teardown(entry, owner, detach)?;
                }
                if let (Some(node), true) = (placeholder, detach) {
                    self.adapter.remove(node)?;
                }
            }
        }
        Ok(())
    }

    /// Resolves `Before` against the adapter and drops anchors that are not attached.
    pub(crate) fn resolve(&self, anchor: Anchor) -> Result<Anchor> {
        Ok(match anchor {
            Anchor::Before(node) => match self.adapter.previous_sibling(node)? {
                Some(prev) => Anchor::After(prev),
                None => self
                    .adapter
                    .parent(node)?
                    .map_or(Anchor::Detached, Anchor::Start),
            },
            Anchor::After(node) if self.adapter.parent(node)?.is_none() => Anchor::Detached,
            other => other,
        })
    }

    /// Moves (or inserts) every top-level live node of `mounted` to `anchor`, in order.
    pub(crate) fn place(&mut self, anchor: Anchor, mounted: &Mounted) -> Result<()> {
        let mut nodes = Vec::new();
        self.collect_live(mounted, &mut nodes);
        let mut position = self.resolve(anchor)?;
        for node in nodes {
            position = self.place_node(position, node)?;
        }
        Ok(())
    }

    /// Places one node at an already resolved position.
    pub(crate) fn place_node(&mut self, position: Anchor, node: LiveNode) -> Result<Anchor> {
        match position {
            Anchor::After(prev) => self.adapter.insert_after(prev, node)?,
            Anchor::Start(parent) => self.adapter.prepend(parent, node)?,
            Anchor::Before(_) => {
                return Err(Error::MissingAnchor {
                    context: "unresolved placement",
                })
            }
            Anchor::Detached => return Ok(Anchor::Detached),
        }
        Ok(Anchor::After(node))
    }

    pub(crate) fn append_all(&mut self, parent: LiveNode, mounted: &Mounted) -> Result<()> {
        let mut nodes = Vec::new();
        self.collect_live(mounted, &mut nodes);
        for node in nodes {
            self.adapter.append(parent, node)?;
        }
        Ok(())
    }

    /// Top-level live nodes of `mounted`, in document order.
    pub(crate) fn collect_live(&self, mounted: &Mounted, out: &mut Vec<LiveNode>) {
        match &mounted.realized {
            Realized::Element { live, .. } => out.push(*live),
            Realized::Component(id) => match self.components.get(*id).and_then(|slot| slot.content.as_ref()) {
                Some(Content::Rendered(content)) => self.collect_live(content, out),
                Some(Content::Placeholder(node)) => out.push(*node),
                None => {}
            },
            Realized::Group {
                entries,
                placeholder,
            } => {
                out.extend(placeholder.iter().copied());
                for entry in entries.values() {
                    self.collect_live(entry, out);
                }
            }
        }
    }

    pub(crate) fn first_live(&self, mounted: &Mounted) -> Option<LiveNode> {
        match &mounted.realized {
            Realized::Element { live, .. } => Some(*live),
            Realized::Component(id) => self.content_edge(*id, true),
            Realized::Group {
                entries,
                placeholder,
            } => placeholder.or_else(|| entries.values().find_map(|entry| self.first_live(entry))),
        }
    }

    pub(crate) fn last_live(&self, mounted: &Mounted) -> Option<LiveNode> {
        match &mounted.realized {
            Realized::Element { live, .. } => Some(*live),
            Realized::Component(id) => self.content_edge(*id, false),
            Realized::Group {
                entries,
                placeholder,
            } => placeholder.or_else(|| entries.values().rev().find_map(|entry| self.last_live(entry))),
        }
    }

    fn content_edge(&self, id: ComponentId, first: bool) -> Option<LiveNode> {
        match self.components.get(id)?.content.as_ref()? {
            Content::Rendered(content) if first => self.first_live(content),
            Content::Rendered(content) => self.last_live(content),
            Content::Placeholder(node) => Some(*node),
        }
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
