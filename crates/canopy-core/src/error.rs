//! Error types shared by the reconciler, the scheduler and adapters.

use std::error::Error as StdError;

use thiserror::Error;

use crate::keyed::Key;
use crate::LiveNode;

/// Failure reported by a [`LiveNodeAdapter`](crate::LiveNodeAdapter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("live node {node:?} missing")]
    Missing { node: LiveNode },
    #[error("live node {node:?} is not attached to a parent")]
    NotAttached { node: LiveNode },
    #[error("inserting live node {node:?} would create a cycle")]
    Cycle { node: LiveNode },
    #[error("property path `{path}` not found on live node {node:?}")]
    PathNotFound { node: LiveNode, path: String },
}

/// Error boxed out of a component's `render` or lifecycle hook.
pub type RenderError = Box<dyn StdError + 'static>;

/// Engine-level failures.
///
/// Everything except [`Error::Render`] and [`Error::Node`] signals a broken
/// contract on the caller's side: the operation that produced it is aborted
/// and the live tree may be left partially updated.
#[derive(Debug, Error)]
pub enum Error {
    #[error("DOM key definition duplication in keyed group: {key}")]
    DuplicateKey { key: Key },
    #[error("identifier reference duplication in component: {id}")]
    DuplicateId { id: String },
    #[error("no anchor available to place live nodes for {context}")]
    MissingAnchor { context: &'static str },
    #[error("invalid root: {reason}")]
    InvalidRoot { reason: &'static str },
    #[error("component {component} is the render output of its owner and cannot be removed directly")]
    IllegalRemoval { component: &'static str },
    #[error("component is not mounted")]
    UnknownComponent,
    #[error("root is not mounted")]
    UnknownRoot,
    #[error("component is not a {expected}")]
    ComponentTypeMismatch { expected: &'static str },
    #[error("component type {component} has no factory")]
    NoFactory { component: &'static str },
    #[error("render of component {component} failed: {source}")]
    Render {
        component: &'static str,
        #[source]
        source: RenderError,
    },
    #[error(transparent)]
    Node(#[from] NodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
