use std::rc::Rc;
use std::sync::Arc;

use slotmap::SlotMap;

use crate::adapter::LiveNodeAdapter;
use crate::collections::map::HashSet;
use crate::component::{Component, ComponentId, ComponentSlot, Content};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::platform::{ManualTicks, TickScheduler};
use crate::props::Props;
use crate::reconcile::{Anchor, Mounted, Realized};
use crate::registry::{IdRegistry, IdTarget, Owner};
use crate::scheduler::{FlushState, RenderQueue};
use crate::vnode::{ComponentType, VNode};
use crate::LiveNode;

slotmap::new_key_type! {
    /// Handle to a tree mounted with [`Engine::mount`].
    pub struct RootId;
}

/// What to mount at the top of a tree.
pub enum Root {
    Node(VNode),
    /// An instance created by the host; its node carries an instance-only type.
    Instance {
        vnode: VNode,
        instance: Box<dyn Component>,
    },
}

impl Root {
    pub fn instance<C: Component>(component: C) -> Self {
        Self::instance_with_props(component, Props::new())
    }

    pub fn instance_with_props<C: Component>(component: C, props: Props) -> Self {
        Root::Instance {
            vnode: VNode::component(ComponentType::instance_only::<C>(), props, Vec::new()),
            instance: Box::new(component),
        }
    }
}

impl From<VNode> for Root {
    fn from(vnode: VNode) -> Self {
        Root::Node(vnode)
    }
}

impl From<ComponentType> for Root {
    fn from(ty: ComponentType) -> Self {
        Root::Node(VNode::component(ty, Props::new(), Vec::new()))
    }
}

pub(crate) struct RootSlot {
    pub mounted: Option<Mounted>,
    pub parent: Option<LiveNode>,
    pub ids: IdRegistry,
}

/// Owns the realized trees, the component instances and the render queue
/// for one host adapter.
pub struct Engine<A: LiveNodeAdapter> {
    pub(crate) adapter: A,
    pub(crate) config: EngineConfig,
    pub(crate) components: SlotMap<ComponentId, ComponentSlot>,
    pub(crate) roots: SlotMap<RootId, RootSlot>,
    pub(crate) queue: RenderQueue,
    pub(crate) ticks: Arc<dyn TickScheduler>,
    pub(crate) removing: HashSet<ComponentId>,
}

impl<A: LiveNodeAdapter> Engine<A> {
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, EngineConfig::default())
    }

    pub fn with_config(adapter: A, config: EngineConfig) -> Self {
        Self::with_scheduler(adapter, Arc::new(ManualTicks), config)
    }

    pub fn with_scheduler(adapter: A, ticks: Arc<dyn TickScheduler>, config: EngineConfig) -> Self {
        Self {
            adapter,
            config,
            components: SlotMap::with_key(),
            roots: SlotMap::with_key(),
            queue: RenderQueue::default(),
            ticks,
            removing: HashSet::default(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Materializes `root` and returns its single top-level live node.
    ///
    /// With a `parent` the output is appended to it. Without one the output
    /// must be exactly one live node, otherwise `Error::InvalidRoot`.
    pub fn render(&mut self, root: impl Into<Root>, parent: Option<LiveNode>) -> Result<LiveNode> {
        let root = self.mount(root, parent)?;
        self.root_node(root).ok_or(Error::InvalidRoot {
            reason: "root realized no live node",
        })
    }

    /// Like [`Engine::render`], but returns a handle for later updates.
    pub fn mount(&mut self, root: impl Into<Root>, parent: Option<LiveNode>) -> Result<RootId> {
        let root_id = self.roots.insert(RootSlot {
            mounted: None,
            parent,
            ids: IdRegistry::default(),
        });
        let owner = Owner::Root(root_id);
        let built = match root.into() {
            Root::Node(vnode) => self.materialize(Rc::new(vnode), owner),
            Root::Instance { vnode, instance } => {
                let vnode = Rc::new(vnode);
                self.create_component(instance, Rc::clone(&vnode), owner)
                    .map(|id| Mounted {
                        vnode,
                        realized: Realized::Component(id),
                    })
            }
        };
        let mounted = match built {
            Ok(mounted) => mounted,
            Err(err) => {
                self.roots.remove(root_id);
                return Err(err);
            }
        };

        let attached = self.settle_ids(owner).and_then(|()| match parent {
            Some(parent) => self.append_all(parent, &mounted),
            None => {
                let mut nodes = Vec::new();
                self.collect_live(&mounted, &mut nodes);
                if nodes.len() == 1 {
                    Ok(())
                } else {
                    Err(Error::InvalidRoot {
                        reason: "a root without parent must realize exactly one live node",
                    })
                }
            }
        });
        if let Err(err) = attached {
            if let Err(cleanup) = self.teardown(mounted, owner, true) {
                log::warn!("releasing rejected root failed: {cleanup}");
            }
            self.roots.remove(root_id);
            return Err(err);
        }

        log::debug!("mounted {} root", mounted.vnode.kind().describe());
        if let Some(slot) = self.roots.get_mut(root_id) {
            slot.mounted = Some(mounted);
        }
        Ok(root_id)
    }

    /// Reconciles a mounted root against a new description.
    ///
    /// On error the root's previous structure is lost and the root should be unmounted.
    pub fn update_root(&mut self, root: RootId, vnode: VNode) -> Result<()> {
        let slot = self.roots.get_mut(root).ok_or(Error::UnknownRoot)?;
        let parent = slot.parent;
        let old = slot.mounted.take().ok_or(Error::UnknownRoot)?;
        let anchor = match self.first_live(&old) {
            Some(first) => Anchor::Before(first),
            None => parent.map_or(Anchor::Detached, Anchor::Start),
        };
        let owner = Owner::Root(root);
        self.begin_id_pass(owner);
        let mounted = self.reconcile(old, Rc::new(vnode), anchor, owner)?;
        if let Some(slot) = self.roots.get_mut(root) {
            slot.mounted = Some(mounted);
        }
        self.settle_ids(owner)
    }

    /// Removes a root and releases everything it realized.
    pub fn unmount(&mut self, root: RootId) -> Result<()> {
        let slot = self.roots.remove(root).ok_or(Error::UnknownRoot)?;
        if let Some(mounted) = slot.mounted {
            self.teardown(mounted, Owner::Root(root), true)?;
        }
        Ok(())
    }

    /// Unmounts every root and drops anything still queued.
    pub fn shutdown(&mut self) -> Result<()> {
        let roots: Vec<RootId> = self.roots.keys().collect();
        for root in roots {
            self.unmount(root)?;
        }
        self.queue.clear();
        Ok(())
    }

    pub fn root_nodes(&self, root: RootId) -> Vec<LiveNode> {
        let mut nodes = Vec::new();
        if let Some(mounted) = self.roots.get(root).and_then(|slot| slot.mounted.as_ref()) {
            self.collect_live(mounted, &mut nodes);
        }
        nodes
    }

    pub fn root_node(&self, root: RootId) -> Option<LiveNode> {
        self.first_live(self.roots.get(root)?.mounted.as_ref()?)
    }

    /// The component a root realizes directly, if it is one.
    pub fn root_component(&self, root: RootId) -> Option<ComponentId> {
        match self.roots.get(root)?.mounted.as_ref()?.realized {
            Realized::Component(id) => Some(id),
            _ => None,
        }
    }

    pub fn root_lookup(&self, root: RootId, name: &str) -> Option<IdTarget> {
        self.registry(Owner::Root(root))?.get(name)
    }

    /// Resolves an identifier declared in the output of component `id`.
    pub fn lookup(&self, id: ComponentId, name: &str) -> Option<IdTarget> {
        self.registry(Owner::Component(id))?.get(name)
    }

    /// Removes a component nested inside an element or group of its owner.
    ///
    /// A component that is its owner's entire output cannot be removed on its own.
    pub fn remove(&mut self, id: ComponentId) -> Result<()> {
        let slot = self.components.get(id).ok_or(Error::UnknownComponent)?;
        let realized = match slot.owner {
            Owner::Component(owner) => match self.content_of(owner) {
                Some(Content::Rendered(mounted)) => Some(&mounted.realized),
                _ => None,
            },
            Owner::Root(root) => self
                .roots
                .get(root)
                .and_then(|root| root.mounted.as_ref())
                .map(|mounted| &mounted.realized),
        };
        if matches!(realized, Some(Realized::Component(direct)) if *direct == id) {
            return Err(Error::IllegalRemoval {
                component: slot.name,
            });
        }
        self.remove_component(id, true)
    }

    /// Runs `f` against the concrete instance of component `id`.
    pub fn with_component<C: Component, R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut C) -> R,
    ) -> Result<R> {
        let instance = self
            .components
            .get_mut(id)
            .and_then(|slot| slot.instance.as_deref_mut())
            .ok_or(Error::UnknownComponent)?;
        let typed = instance
            .as_any_mut()
            .downcast_mut::<C>()
            .ok_or(Error::ComponentTypeMismatch {
                expected: std::any::type_name::<C>(),
            })?;
        Ok(f(typed))
    }

    /// Mutates component state and queues a re-render if the component is mounted.
    pub fn update_component<C: Component, R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut C) -> R,
    ) -> Result<R> {
        let result = self.with_component(id, f)?;
        if self.is_mounted(id) {
            self.mark_rerender(id);
        }
        Ok(result)
    }

    /// Like [`Engine::update_component`], but `f` reports whether the state
    /// changed and `after` runs once the queued re-render completes.
    ///
    /// When `f` reports no change nothing is queued and `after` runs at once.
    pub fn update_component_then<C: Component>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut C) -> bool,
        after: impl FnOnce() + 'static,
    ) -> Result<()> {
        if !self.with_component(id, f)? {
            after();
            return Ok(());
        }
        if let Some(slot) = self.components.get_mut(id) {
            slot.after_render.push(Box::new(after));
        }
        if self.is_mounted(id) {
            self.mark_rerender(id);
        }
        Ok(())
    }

    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.components.contains_key(id)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_loaded(&self, id: ComponentId) -> bool {
        self.components.get(id).is_some_and(|slot| slot.loaded)
    }

    pub fn is_mounted(&self, id: ComponentId) -> bool {
        self.components.get(id).is_some_and(|slot| slot.mounted)
    }

    /// Top-level live nodes currently realizing component `id`.
    pub fn content_nodes(&self, id: ComponentId) -> Vec<LiveNode> {
        match self.content_of(id) {
            Some(Content::Rendered(mounted)) => {
                let mut nodes = Vec::new();
                self.collect_live(mounted, &mut nodes);
                nodes
            }
            Some(Content::Placeholder(node)) => vec![*node],
            None => Vec::new(),
        }
    }

    /// The placeholder standing in for component `id`, while it renders nothing.
    pub fn placeholder_of(&self, id: ComponentId) -> Option<LiveNode> {
        match self.content_of(id)? {
            Content::Placeholder(node) => Some(*node),
            Content::Rendered(_) => None,
        }
    }

    pub fn pending_renders(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queued(&self, id: ComponentId) -> bool {
        self.queue.contains(id)
    }

    pub fn flush_state(&self) -> FlushState {
        self.queue.state()
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
