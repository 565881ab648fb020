//! Identifier registry: `id` properties resolved per owning component.

use crate::adapter::LiveNodeAdapter;
use crate::collections::map::HashMap;
use crate::component::ComponentId;
use crate::engine::{Engine, RootId};
use crate::error::{Error, Result};
use crate::LiveNode;

/// What an identifier resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdTarget {
    Node(LiveNode),
    Component(ComponentId),
}

/// The scope that owns a realized subtree and its identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Root(RootId),
    Component(ComponentId),
}

/// Identifiers declared inside one owner's output.
///
/// A name claimed by a new target displaces the previous holder. Diffs
/// register new nodes before releasing old ones, so the displaced holder is
/// expected to give the name up later in the same pass; [`IdRegistry::settle`]
/// reports a collision for every holder that did not.
#[derive(Debug, Default)]
pub struct IdRegistry {
    entries: HashMap<String, IdTarget>,
    displaced: Vec<(String, IdTarget)>,
}

impl IdRegistry {
    /// Points `name` at `target`, displacing a different previous holder.
    pub fn register(&mut self, name: &str, target: IdTarget) {
        if let Some(previous) = self.entries.insert(name.to_owned(), target) {
            if previous != target {
                self.displaced.push((name.to_owned(), previous));
            }
        }
    }

    /// Releases `name` for `target`.
    ///
    /// A displaced holder only settles its claim; the entry is removed only
    /// while it still points at `target`.
    pub fn unregister(&mut self, name: &str, target: IdTarget) -> bool {
        if let Some(index) = self
            .displaced
            .iter()
            .position(|(held, holder)| held == name && *holder == target)
        {
            self.displaced.swap_remove(index);
            return true;
        }
        if self.entries.get(name) == Some(&target) {
            self.entries.remove(name);
            true
        } else {
            false
        }
    }

    /// Fails with `DuplicateId` if a displaced holder never released its name.
    pub fn settle(&mut self) -> Result<()> {
        let collision = self.displaced.first().map(|(id, _)| id.clone());
        self.displaced.clear();
        match collision {
            Some(id) => Err(Error::DuplicateId { id }),
            None => Ok(()),
        }
    }

    /// Forgets displaced holders left over from an aborted pass.
    pub fn begin_pass(&mut self) {
        self.displaced.clear();
    }

    pub fn get(&self, name: &str) -> Option<IdTarget> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: LiveNodeAdapter> Engine<A> {
    fn registry_mut(&mut self, owner: Owner) -> Option<&mut IdRegistry> {
        match owner {
            Owner::Root(root) => self.roots.get_mut(root).map(|slot| &mut slot.ids),
            Owner::Component(id) => self.components.get_mut(id).map(|slot| &mut slot.ids),
        }
    }

    pub(crate) fn registry(&self, owner: Owner) -> Option<&IdRegistry> {
        match owner {
            Owner::Root(root) => self.roots.get(root).map(|slot| &slot.ids),
            Owner::Component(id) => self.components.get(id).map(|slot| &slot.ids),
        }
    }

    pub(crate) fn register_id(&mut self, owner: Owner, name: &str, target: IdTarget) {
        if let Some(registry) = self.registry_mut(owner) {
            registry.register(name, target);
        }
    }

    pub(crate) fn unregister_id(&mut self, owner: Owner, name: &str, target: IdTarget) {
        if let Some(registry) = self.registry_mut(owner) {
            registry.unregister(name, target);
        }
    }

    pub(crate) fn update_id(
        &mut self,
        owner: Owner,
        old: Option<&str>,
        new: Option<&str>,
        target: IdTarget,
    ) {
        if old == new {
            return;
        }
        if let Some(name) = old {
            self.unregister_id(owner, name, target);
        }
        if let Some(name) = new {
            self.register_id(owner, name, target);
        }
    }

    pub(crate) fn begin_id_pass(&mut self, owner: Owner) {
        if let Some(registry) = self.registry_mut(owner) {
            registry.begin_pass();
        }
    }

    /// Closes a diff pass over `owner`'s output, reporting identifier collisions.
    pub(crate) fn settle_ids(&mut self, owner: Owner) -> Result<()> {
        match self.registry_mut(owner) {
            Some(registry) => registry.settle(),
            None => Ok(()),
        }
    }
}
