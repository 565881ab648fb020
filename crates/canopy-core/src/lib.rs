#![doc = r"Core of the Canopy virtual node engine: hashed virtual trees, reconciliation against a host scene graph, and batched component rendering."]

pub mod adapter;
pub mod collections;
pub mod component;
pub mod config;
mod engine;
pub mod error;
pub mod hash;
pub mod keyed;
pub mod platform;
pub mod props;
mod reconcile;
pub mod registry;
pub mod scheduler;
pub mod vnode;

pub use adapter::{AdapterOp, LiveNodeAdapter, MemoryAdapter};
pub use component::{
    AfterRender, Component, ComponentContext, ComponentId, Hashed, Lifecycle, Render,
};
pub use config::EngineConfig;
pub use engine::{Engine, Root, RootId};
pub use error::{Error, NodeError, RenderError, Result};
pub use keyed::{Key, KeyedGroup};
pub use platform::{ManualTicks, TickScheduler};
pub use props::{PropPath, PropValue, Props};
pub use registry::{IdRegistry, IdTarget, Owner};
pub use scheduler::FlushState;
pub use vnode::{ComponentType, ElementType, NodeKind, VNode};

/// Opaque handle to a node owned by a [`LiveNodeAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiveNode(pub u64);

impl LiveNode {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
