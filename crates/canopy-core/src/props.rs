//! Property values and the hashed property map carried by virtual nodes.
//!
//! Each property is stored together with its own hash so that a diff only
//! reassigns the entries whose hash changed. The map keeps insertion order,
//! which is also the order properties are assigned to a fresh live node.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::hash::{self, hash_one};

/// Property name reserved for keyed-group identity.
pub const KEY: &str = "key";
/// Property name reserved for the identifier registry.
pub const ID: &str = "id";
/// Property name carrying a component's default style.
pub const STYLE: &str = "style";

/// Dynamically typed property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<PropValue>),
    Map(IndexMap<String, PropValue>),
}

impl PropValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, PropValue>> {
        match self {
            PropValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, PropValue>> {
        match self {
            PropValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl Hash for PropValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            PropValue::Null => {}
            PropValue::Bool(value) => value.hash(state),
            PropValue::Int(value) => value.hash(state),
            // -0.0 and 0.0 compare equal but hash apart; nothing downstream relies on that.
            PropValue::Float(value) => value.to_bits().hash(state),
            PropValue::Str(value) => value.hash(state),
            PropValue::List(items) => items.hash(state),
            PropValue::Map(entries) => {
                state.write_usize(entries.len());
                for (name, value) in entries {
                    name.hash(state);
                    value.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("null"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Str(value) => f.write_str(value),
            PropValue::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            PropValue::Map(entries) => {
                f.write_str("{")?;
                for (index, (name, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f32> for PropValue {
    fn from(value: f32) -> Self {
        PropValue::Float(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl<T: Into<PropValue>> From<Vec<T>> for PropValue {
    fn from(items: Vec<T>) -> Self {
        PropValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, PropValue>> for PropValue {
    fn from(entries: IndexMap<String, PropValue>) -> Self {
        PropValue::Map(entries)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

/// A dotted property path such as `border.color`, split into segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropPath {
    segments: Vec<String>,
}

impl PropPath {
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted.split('.').map(str::to_owned).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment, i.e. the field assigned on the innermost object.
    pub fn leaf(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for PropPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// One stored property together with its precomputed hash.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    pub path: PropPath,
    pub value: PropValue,
    pub hash: u64,
}

impl Prop {
    fn new(path: PropPath, value: PropValue) -> Self {
        let path_hash = path
            .segments()
            .iter()
            .fold(0, |acc, segment| hash::fold(acc, hash_one(segment)));
        let hash = hash::combine(path_hash, hash_one(&value));
        Self { path, value, hash }
    }

    /// Reserved properties steer the engine and are never forwarded to live nodes.
    pub fn is_reserved(&self) -> bool {
        !self.path.is_nested() && matches!(self.path.leaf(), KEY | ID)
    }
}

/// Ordered map of dotted path to hashed property.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: IndexMap<String, Prop>,
    hash: u64,
}

impl Props {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            hash: hash::SEED,
        }
    }

    /// Adds a property; setting the same path twice keeps the last value.
    pub fn with(mut self, path: &str, value: impl Into<PropValue>) -> Self {
        self.insert(path, value.into());
        self
    }

    pub(crate) fn insert(&mut self, path: &str, value: PropValue) {
        let prop = Prop::new(PropPath::parse(path), value);
        self.entries.insert(prop.path.dotted(), prop);
        self.rehash();
    }

    /// Inserts only when the path is absent; returns the new prop hash when inserted.
    pub(crate) fn insert_default(&mut self, path: &str, value: PropValue) -> Option<u64> {
        if self.entries.contains_key(path) {
            return None;
        }
        let prop = Prop::new(PropPath::parse(path), value);
        let hash = prop.hash;
        self.entries.insert(prop.path.dotted(), prop);
        self.hash = hash::fold(self.hash(), hash);
        Some(hash)
    }

    fn rehash(&mut self) {
        self.hash = self
            .entries
            .values()
            .fold(hash::SEED, |acc, prop| hash::fold(acc, prop.hash));
    }

    /// Accumulated hash of every property hash.
    pub fn hash(&self) -> u64 {
        if self.entries.is_empty() {
            hash::SEED
        } else {
            self.hash
        }
    }

    pub fn get(&self, path: &str) -> Option<&PropValue> {
        self.entries.get(path).map(|prop| &prop.value)
    }

    pub fn prop(&self, path: &str) -> Option<&Prop> {
        self.entries.get(path)
    }

    pub fn prop_hash(&self, path: &str) -> Option<u64> {
        self.entries.get(path).map(|prop| prop.hash)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prop> {
        self.entries.values()
    }

    /// Properties that are forwarded to live nodes and component instances.
    pub fn assignable(&self) -> impl Iterator<Item = &Prop> {
        self.entries.values().filter(|prop| !prop.is_reserved())
    }

    pub fn id(&self) -> Option<&str> {
        self.get(ID).and_then(PropValue::as_str)
    }

    /// Entries of `self` whose hash differs from (or is missing in) `old`.
    pub fn changed_since<'a>(&'a self, old: &'a Props) -> impl Iterator<Item = &'a Prop> + 'a {
        let unchanged = self.hash() == old.hash();
        self.entries
            .iter()
            .filter(move |(name, prop)| {
                !unchanged && !prop.is_reserved() && old.prop_hash(name) != Some(prop.hash)
            })
            .map(|(_, prop)| prop)
    }

    /// Assignable entries of `old` that no longer exist in `self`.
    pub fn removed_since<'a>(&'a self, old: &'a Props) -> impl Iterator<Item = &'a Prop> + 'a {
        old.entries
            .iter()
            .filter(move |(name, prop)| !prop.is_reserved() && !self.entries.contains_key(*name))
            .map(|(_, prop)| prop)
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((a_name, a), (b_name, b))| a_name == b_name && a.value == b.value)
    }
}
