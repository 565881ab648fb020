//! Stateful components: render functions over props, pending children and local state.

use std::any::Any;
use std::hash::Hash;
use std::ops::Deref;
use std::rc::Rc;

use crate::adapter::LiveNodeAdapter;
use crate::engine::Engine;
use crate::error::{Error, RenderError, Result};
use crate::hash::hash_one;
use crate::keyed::KeyedGroup;
use crate::platform::TickScheduler;
use crate::props::{PropPath, PropValue, Props, STYLE};
use crate::reconcile::{Anchor, Mounted};
use crate::registry::{IdRegistry, IdTarget, Owner};
use crate::scheduler::RenderQueue;
use crate::vnode::{NodeKind, VNode};
use crate::LiveNode;

slotmap::new_key_type! {
    /// Handle to a component instance owned by an [`Engine`].
    pub struct ComponentId;
}

/// Lifecycle notifications delivered to [`Component::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Instance created and props assigned, before the first render.
    Load,
    /// Output realized for the first time.
    Mounted,
    /// A later render changed the realized output.
    Update,
    /// Removal started; content is still realized.
    Remove,
    /// Content released and the instance is about to be dropped.
    Removed,
}

/// Output of [`Component::render`].
#[derive(Debug, Clone, Default)]
pub enum Render {
    /// Nothing; the engine keeps a placeholder in the component's position.
    #[default]
    Empty,
    Text(String),
    Node(Rc<VNode>),
    /// Any number of nodes, realized as a keyed group; an empty list renders nothing.
    Nodes(Vec<Option<Rc<VNode>>>),
}

impl Render {
    pub(crate) fn into_vnode(self) -> Result<Option<Rc<VNode>>> {
        Ok(match self {
            Render::Empty => None,
            Render::Text(text) => Some(Rc::new(VNode::text(text))),
            Render::Node(node) => Some(node),
            Render::Nodes(nodes) => {
                let nodes: Vec<Rc<VNode>> = nodes.into_iter().flatten().collect();
                if nodes.is_empty() {
                    None
                } else {
                    Some(Rc::new(VNode::from_group(KeyedGroup::new(nodes)?)))
                }
            }
        })
    }
}

impl From<VNode> for Render {
    fn from(node: VNode) -> Self {
        Render::Node(Rc::new(node))
    }
}

impl From<Rc<VNode>> for Render {
    fn from(node: Rc<VNode>) -> Self {
        Render::Node(node)
    }
}

impl From<Option<VNode>> for Render {
    fn from(node: Option<VNode>) -> Self {
        node.map_or(Render::Empty, Render::from)
    }
}

impl From<Vec<VNode>> for Render {
    fn from(nodes: Vec<VNode>) -> Self {
        Render::Nodes(nodes.into_iter().map(|node| Some(Rc::new(node))).collect())
    }
}

impl From<Vec<Option<VNode>>> for Render {
    fn from(nodes: Vec<Option<VNode>>) -> Self {
        Render::Nodes(nodes.into_iter().map(|node| node.map(Rc::new)).collect())
    }
}

impl From<&str> for Render {
    fn from(text: &str) -> Self {
        Render::Text(text.to_owned())
    }
}

impl From<String> for Render {
    fn from(text: String) -> Self {
        Render::Text(text)
    }
}

/// A user-defined component.
///
/// Property changes arrive through [`set_property`](Component::set_property)
/// before the next render; the engine re-renders synchronously whenever a
/// parent diff changes the component's node, and otherwise on
/// [`ComponentContext::mark_rerender`].
pub trait Component: Any {
    /// Produces this component's output. Passes pending children through by default.
    fn render(&mut self, cx: &mut ComponentContext<'_>) -> Result<Render, RenderError> {
        Ok(Render::Nodes(cx.children().to_vec()))
    }

    fn set_property(&mut self, path: &PropPath, value: &PropValue) {
        let _ = (path, value);
    }

    fn lifecycle(&mut self, event: Lifecycle, cx: &mut ComponentContext<'_>) {
        let _ = (event, cx);
    }
}

impl dyn Component {
    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What a component can see and request while it renders or handles a lifecycle event.
pub struct ComponentContext<'a> {
    id: ComponentId,
    vnode: &'a VNode,
    ids: &'a IdRegistry,
    after_render: &'a mut Vec<AfterRender>,
    queue: &'a mut RenderQueue,
    ticks: &'a dyn TickScheduler,
}

impl<'a> ComponentContext<'a> {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn props(&self) -> &Props {
        self.vnode.props()
    }

    pub fn prop(&self, path: &str) -> Option<&PropValue> {
        self.vnode.prop(path)
    }

    /// Children passed by the parent, not yet realized by this component.
    pub fn children(&self) -> &[Option<Rc<VNode>>] {
        self.vnode.children()
    }

    /// Resolves an `id` declared inside this component's output.
    pub fn lookup(&self, name: &str) -> Option<IdTarget> {
        self.ids.get(name)
    }

    pub fn mark_rerender(&mut self) {
        self.queue.mark(self.id, self.ticks);
    }

    /// Marks this component and runs `after` once its next render completes.
    pub fn mark_rerender_then(&mut self, after: impl FnOnce() + 'static) {
        self.after_render.push(Box::new(after));
        self.mark_rerender();
    }

    pub fn request_rerender(&mut self, other: ComponentId) {
        self.queue.mark(other, self.ticks);
    }
}

/// A state cell that remembers the hash of its value.
///
/// [`Hashed::set`] reports whether the stored value actually changed, so a
/// component only marks itself for re-render on real changes.
#[derive(Debug, Clone)]
pub struct Hashed<T> {
    value: T,
    hash: u64,
}

impl<T: Hash> Hashed<T> {
    pub fn new(value: T) -> Self {
        let hash = hash_one(&value);
        Self { value, hash }
    }

    pub fn set(&mut self, value: T) -> bool {
        let hash = hash_one(&value);
        self.value = value;
        if hash == self.hash {
            return false;
        }
        self.hash = hash;
        true
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl<T: Hash + Default> Default for Hashed<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Deref for Hashed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Callback waiting for a component's next completed render.
pub type AfterRender = Box<dyn FnOnce()>;

/// What currently occupies a component's position in the live tree.
pub(crate) enum Content {
    Rendered(Mounted),
    Placeholder(LiveNode),
}

pub(crate) struct ComponentSlot {
    /// Taken out while the instance renders or handles an event.
    pub instance: Option<Box<dyn Component>>,
    pub name: &'static str,
    pub owner: Owner,
    pub vnode: Rc<VNode>,
    pub content: Option<Content>,
    pub ids: IdRegistry,
    pub after_render: Vec<AfterRender>,
    pub loaded: bool,
    pub mounted: bool,
}

impl<A: LiveNodeAdapter> Engine<A> {
    /// Registers `instance`, delivers `Load` and renders it once.
    ///
    /// The rendered content is left unattached; the caller places it.
    pub(crate) fn create_component(
        &mut self,
        mut instance: Box<dyn Component>,
        vnode: Rc<VNode>,
        owner: Owner,
    ) -> Result<ComponentId> {
        let name = match vnode.kind() {
            NodeKind::Component(ty) => ty.name(),
            _ => "component",
        };
        for prop in vnode.props().assignable() {
            instance.set_property(&prop.path, &prop.value);
        }
        let declared = vnode.props().id().map(str::to_owned);
        let id = self.components.insert(ComponentSlot {
            instance: Some(instance),
            name,
            owner,
            vnode,
            content: None,
            ids: IdRegistry::default(),
            after_render: Vec::new(),
            loaded: false,
            mounted: false,
        });
        if let Some(declared) = declared {
            self.register_id(owner, &declared, IdTarget::Component(id));
        }

        log::trace!("loading component {name}");
        self.fire(id, Lifecycle::Load);
        if let Some(slot) = self.components.get_mut(id) {
            slot.loaded = true;
        }
        if let Err(err) = self.rerender(id) {
            self.discard(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Runs `f` with the instance taken out of its slot and a context for it.
    fn with_instance<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut dyn Component, &mut ComponentContext<'_>) -> R,
    ) -> Option<R> {
        let mut instance = self
            .components
            .get_mut(id)
            .and_then(|slot| slot.instance.take())?;
        let result = self.components.get_mut(id).map(|slot| {
            let mut cx = ComponentContext {
                id,
                vnode: &slot.vnode,
                ids: &slot.ids,
                after_render: &mut slot.after_render,
                queue: &mut self.queue,
                ticks: &*self.ticks,
            };
            f(&mut *instance, &mut cx)
        });
        if let Some(slot) = self.components.get_mut(id) {
            slot.instance = Some(instance);
        }
        result
    }

    pub(crate) fn fire(&mut self, id: ComponentId, event: Lifecycle) {
        self.with_instance(id, |component, cx| component.lifecycle(event, cx));
    }

    /// Renders `id` now and reconciles its content. Returns whether the live tree changed.
    pub(crate) fn rerender(&mut self, id: ComponentId) -> Result<bool> {
        self.queue.remove(id);
        let Some(slot) = self.components.get(id) else {
            return Ok(false);
        };
        let name = slot.name;
        let style = slot.vnode.prop(STYLE).cloned();
        let Some(output) = self.with_instance(id, |component, cx| component.render(cx)) else {
            // already rendering further up the stack
            return Ok(false);
        };
        let output = output.map_err(|source| Error::Render {
            component: name,
            source,
        })?;
        let mut output = output.into_vnode()?;
        if let (Some(node), Some(style)) = (output.as_mut(), style) {
            Rc::make_mut(node).set_default_style(style);
        }

        let owner = Owner::Component(id);
        self.begin_id_pass(owner);
        let previous = self
            .components
            .get_mut(id)
            .and_then(|slot| slot.content.take());
        let (content, changed) = match (previous, output) {
            (Some(Content::Rendered(old)), Some(new)) => {
                if self.same_output(&old.vnode, &new) {
                    (Content::Rendered(old), false)
                } else {
                    let anchor = self
                        .first_live(&old)
                        .map_or(Anchor::Detached, Anchor::Before);
                    (Content::Rendered(self.reconcile(old, new, anchor, owner)?), true)
                }
            }
            (Some(Content::Rendered(old)), None) => {
                let placeholder = self.adapter.construct(&self.config.placeholder_type)?;
                let anchor = self
                    .last_live(&old)
                    .map_or(Anchor::Detached, Anchor::After);
                let position = self.resolve(anchor)?;
                self.place_node(position, placeholder)?;
                self.teardown(old, owner, true)?;
                (Content::Placeholder(placeholder), true)
            }
            (Some(Content::Placeholder(placeholder)), Some(new)) => {
                let mounted = self.materialize(new, owner)?;
                self.place(Anchor::After(placeholder), &mounted)?;
                self.adapter.remove(placeholder)?;
                (Content::Rendered(mounted), true)
            }
            (Some(Content::Placeholder(placeholder)), None) => {
                (Content::Placeholder(placeholder), false)
            }
            (None, Some(new)) => (Content::Rendered(self.materialize(new, owner)?), false),
            (None, None) => (
                Content::Placeholder(self.adapter.construct(&self.config.placeholder_type)?),
                false,
            ),
        };

        let Some(slot) = self.components.get_mut(id) else {
            return Ok(changed);
        };
        slot.content = Some(content);
        self.settle_ids(owner)?;
        let Some(slot) = self.components.get_mut(id) else {
            return Ok(changed);
        };
        let waiting = std::mem::take(&mut slot.after_render);
        let first_mount = !slot.mounted;
        slot.mounted = true;
        if first_mount {
            self.fire(id, Lifecycle::Mounted);
        }
        if changed {
            log::trace!("component {name} updated");
            self.fire(id, Lifecycle::Update);
        }
        for after in waiting {
            after();
        }
        Ok(changed)
    }

    /// Forwards changed props to the instance, swaps its pending children and re-renders.
    pub(crate) fn patch_component(
        &mut self,
        id: ComponentId,
        previous: &VNode,
        new: &Rc<VNode>,
        owner: Owner,
    ) -> Result<()> {
        if let Some(slot) = self.components.get_mut(id) {
            slot.vnode = Rc::clone(new);
            if let Some(instance) = slot.instance.as_mut() {
                for prop in new.props().changed_since(previous.props()) {
                    instance.set_property(&prop.path, &prop.value);
                }
                for prop in new.props().removed_since(previous.props()) {
                    instance.set_property(&prop.path, &PropValue::Null);
                }
            }
        }
        self.update_id(
            owner,
            previous.props().id(),
            new.props().id(),
            IdTarget::Component(id),
        );
        self.rerender(id)?;
        Ok(())
    }

    /// Removes a component and everything it rendered.
    ///
    /// Nested components are removed first. Calling this again while the
    /// same component is being removed does nothing.
    pub(crate) fn remove_component(&mut self, id: ComponentId, detach: bool) -> Result<()> {
        if !self.components.contains_key(id) || !self.removing.insert(id) {
            return Ok(());
        }
        self.fire(id, Lifecycle::Remove);
        let result = self.release_component(id, detach);
        self.removing.remove(&id);
        result
    }

    fn release_component(&mut self, id: ComponentId, detach: bool) -> Result<()> {
        let content = self
            .components
            .get_mut(id)
            .and_then(|slot| slot.content.take());
        match content {
            Some(Content::Rendered(mounted)) => {
                self.teardown(mounted, Owner::Component(id), detach)?
            }
            Some(Content::Placeholder(node)) if detach => self.adapter.remove(node)?,
            _ => {}
        }
        if let Some(slot) = self.components.get(id) {
            if let Some(name) = slot.vnode.props().id().map(str::to_owned) {
                let owner = slot.owner;
                self.unregister_id(owner, &name, IdTarget::Component(id));
            }
        }
        self.fire(id, Lifecycle::Removed);
        if let Some(slot) = self.components.remove(id) {
            log::trace!("removed component {}", slot.name);
        }
        self.queue.remove(id);
        Ok(())
    }

    /// Drops a component whose first render failed.
    fn discard(&mut self, id: ComponentId) {
        if let Some(slot) = self.components.remove(id) {
            if let Some(name) = slot.vnode.props().id() {
                self.unregister_id(slot.owner, name, IdTarget::Component(id));
            }
        }
        self.queue.remove(id);
    }

    pub(crate) fn content_of(&self, id: ComponentId) -> Option<&Content> {
        self.components.get(id)?.content.as_ref()
    }
}

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod tests;
