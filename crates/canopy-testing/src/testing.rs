use canopy_core::{
    AdapterOp, ComponentId, ElementType, Engine, EngineConfig, Error, IdTarget, LiveNode,
    LiveNodeAdapter, MemoryAdapter, Result, Root, RootId, VNode,
};
use canopy_runtime_std::StdRuntime;

/// Headless harness for exercising reconciliation in tests.
///
/// `ReconcileTestRule` owns an engine over an in-memory adapter, a host node
/// that mounted content is appended to, and the std runtime that collects the
/// engine's tick requests. Tests install content, mutate components, then
/// drive pending renders with [`pump_until_idle`](Self::pump_until_idle).
pub struct ReconcileTestRule {
    runtime: StdRuntime,
    engine: Engine<MemoryAdapter>,
    host: LiveNode,
    root: Option<RootId>,
}

impl ReconcileTestRule {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let runtime = StdRuntime::new();
        let mut adapter = MemoryAdapter::new();
        let host = adapter
            .construct(&ElementType::new("host"))
            .expect("in-memory adapter constructs the host node");
        let engine = runtime.engine(adapter, config);
        Self {
            runtime,
            engine,
            host,
            root: None,
        }
    }

    /// Mounts `content` under the host node, replacing any previous content.
    pub fn set_content(&mut self, content: impl Into<Root>) -> Result<RootId> {
        if let Some(previous) = self.root.take() {
            self.engine.unmount(previous)?;
        }
        let root = self.engine.mount(content, Some(self.host))?;
        self.root = Some(root);
        Ok(root)
    }

    /// Diffs the mounted content against `vnode`.
    pub fn update_content(&mut self, vnode: VNode) -> Result<()> {
        let root = self.root.ok_or(Error::UnknownRoot)?;
        self.engine.update_root(root, vnode)
    }

    /// Runs flushes until the engine stops requesting ticks. Returns the number of renders.
    pub fn pump_until_idle(&mut self) -> Result<usize> {
        let mut rendered = 0;
        while self.runtime.take_tick_request() {
            rendered += self.engine.flush()?;
        }
        Ok(rendered)
    }

    pub fn tick_requested(&self) -> bool {
        self.runtime.scheduler().has_pending_tick()
    }

    pub fn host(&self) -> LiveNode {
        self.host
    }

    /// Live children of the host node, in order.
    pub fn host_children(&self) -> Vec<LiveNode> {
        self.engine.adapter().children(self.host)
    }

    pub fn root(&self) -> Option<RootId> {
        self.root
    }

    /// The component mounted as the content root, if the content is a component.
    pub fn root_component(&self) -> Option<ComponentId> {
        self.root.and_then(|root| self.engine.root_component(root))
    }

    /// Resolves an `id` registered at the content root to a component.
    pub fn lookup_component(&self, name: &str) -> Option<ComponentId> {
        let root = self.root?;
        match self.engine.root_lookup(root, name) {
            Some(IdTarget::Component(id)) => Some(id),
            _ => None,
        }
    }

    pub fn engine(&self) -> &Engine<MemoryAdapter> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<MemoryAdapter> {
        &mut self.engine
    }

    pub fn adapter(&self) -> &MemoryAdapter {
        self.engine.adapter()
    }

    pub fn take_ops(&mut self) -> Vec<AdapterOp> {
        self.engine.adapter_mut().take_ops()
    }

    pub fn clear_ops(&mut self) {
        self.engine.adapter_mut().clear_ops();
    }

    /// Renders the host subtree in the adapter's indented dump format.
    pub fn dump(&self) -> String {
        self.engine.adapter().dump_tree(self.host)
    }
}

impl Default for ReconcileTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `ReconcileTestRule`.
pub fn run_test_reconcile<R>(f: impl FnOnce(&mut ReconcileTestRule) -> R) -> R {
    let mut rule = ReconcileTestRule::new();
    f(&mut rule)
}
