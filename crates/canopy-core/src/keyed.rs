//! Keyed groups: ordered virtual children identified by their `key` property.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;

use crate::adapter::LiveNodeAdapter;
use crate::collections::map::{HashMap, HashSet};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::props::{PropValue, KEY};
use crate::reconcile::{Anchor, Mounted};
use crate::registry::Owner;
use crate::vnode::VNode;
use crate::LiveNode;

static MISSING_KEY_WARNED: AtomicBool = AtomicBool::new(false);

/// Identity of one keyed group entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    pub fn from_value(value: &PropValue) -> Self {
        match value {
            PropValue::Int(value) => Key::Int(*value),
            PropValue::Str(value) => Key::Str(value.clone()),
            other => Key::Str(other.to_string()),
        }
    }

    /// Key synthesized for an entry that does not declare one.
    pub fn auto(index: usize) -> Self {
        Key::Str(format!("_$auto{index}"))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(value) => write!(f, "{value}"),
            Key::Str(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_owned())
    }
}

fn warn_missing_key(index: usize) {
    if !MISSING_KEY_WARNED.swap(true, Ordering::Relaxed) {
        log::warn!("keyed group entry {index} has no `key` property; falling back to its position");
    }
}

/// Ordered, duplicate-free list of keyed virtual nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedGroup {
    entries: Vec<(Key, Rc<VNode>)>,
}

impl KeyedGroup {
    /// Assigns keys to `entries`, synthesizing positional keys where missing.
    ///
    /// Two entries resolving to the same key is an error; nothing is built.
    pub fn new(entries: Vec<Rc<VNode>>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        let mut keyed = Vec::with_capacity(entries.len());
        for (index, node) in entries.into_iter().enumerate() {
            let key = match node.prop(KEY) {
                Some(value) if !value.is_null() => Key::from_value(value),
                _ => {
                    warn_missing_key(index);
                    Key::auto(index)
                }
            };
            if !seen.insert(key.clone()) {
                return Err(Error::DuplicateKey { key });
            }
            keyed.push((key, node));
        }
        Ok(Self { entries: keyed })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Rc<VNode>)> {
        self.entries.iter().map(|(key, node)| (key, node))
    }

    pub fn get(&self, key: &Key) -> Option<&Rc<VNode>> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, node)| node)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }
}

/// Realized entries of a group plus its placeholder while empty.
pub(crate) struct GroupState {
    pub entries: IndexMap<Key, Mounted>,
    pub placeholder: Option<LiveNode>,
}

impl<A: LiveNodeAdapter> Engine<A> {
    /// Diffs a realized group against `group`, placing entries starting at `anchor`.
    ///
    /// `order` mirrors the live order of old entries not yet visited; an old
    /// entry is only repositioned when it is not the first of them.
    pub(crate) fn diff_group(
        &mut self,
        old: GroupState,
        group: &KeyedGroup,
        anchor: Anchor,
        owner: Owner,
    ) -> Result<GroupState> {
        let mut cursor = self.resolve(anchor)?;
        let mut placeholder = old.placeholder;
        if !group.is_empty() {
            if let Some(node) = placeholder.take() {
                self.adapter.remove(node)?;
            }
        }

        let mut order: VecDeque<Key> = old.entries.keys().cloned().collect();
        let mut stale: HashMap<Key, Mounted> = old.entries.into_iter().collect();
        let mut entries = IndexMap::with_capacity(group.len());

        for (key, vnode) in group.iter() {
            let mounted = match stale.remove(key) {
                Some(previous) if previous.vnode.kind().same_type(vnode.kind()) => {
                    while order
                        .front()
                        .is_some_and(|front| front != key && !stale.contains_key(front))
                    {
                        order.pop_front();
                    }
                    if order.front() != Some(key) {
                        log::trace!("moving keyed entry {key}");
                        self.place(cursor, &previous)?;
                    }
                    if self.reusable(&previous, vnode) {
                        previous
                    } else {
                        self.reconcile(previous, Rc::clone(vnode), cursor, owner)?
                    }
                }
                Some(previous) => {
                    let fresh = self.materialize(Rc::clone(vnode), owner)?;
                    self.place(cursor, &fresh)?;
                    self.teardown(previous, owner, true)?;
                    fresh
                }
                None => {
                    let fresh = self.materialize(Rc::clone(vnode), owner)?;
                    self.place(cursor, &fresh)?;
                    fresh
                }
            };
            if let Some(last) = self.last_live(&mounted) {
                cursor = cursor.advance(last);
            }
            entries.insert(key.clone(), mounted);
        }

        for key in order {
            if let Some(unused) = stale.remove(&key) {
                self.teardown(unused, owner, true)?;
            }
        }

        if entries.is_empty() && placeholder.is_none() {
            let node = self.adapter.construct(&self.config.placeholder_type)?;
            self.place_node(cursor, node)?;
            placeholder = Some(node);
        }

        Ok(GroupState {
            entries,
            placeholder,
        })
    }
}

#[cfg(test)]
#[path = "tests/keyed_tests.rs"]
mod tests;
