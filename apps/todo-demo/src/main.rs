use canopy_core::{
    Component, ComponentContext, ElementType, Engine, EngineConfig, LiveNode, LiveNodeAdapter,
    MemoryAdapter, NodeError, PropPath, PropValue, Props, Render, RenderError, Root, VNode,
};
use canopy_runtime_std::StdRuntime;

const ROW: ElementType = ElementType::new("row");
const CHECKBOX: ElementType = ElementType::new("checkbox");

/// Forwards to an in-memory scene and logs every mutation it receives.
struct LoggingAdapter {
    inner: MemoryAdapter,
}

impl LiveNodeAdapter for LoggingAdapter {
    fn construct(&mut self, ty: &ElementType) -> Result<LiveNode, NodeError> {
        let node = self.inner.construct(ty)?;
        log::info!("construct {ty} -> #{}", node.0);
        Ok(node)
    }

    fn append(&mut self, parent: LiveNode, child: LiveNode) -> Result<(), NodeError> {
        log::info!("append #{} to #{}", child.0, parent.0);
        self.inner.append(parent, child)
    }

    fn insert_after(&mut self, sibling: LiveNode, node: LiveNode) -> Result<(), NodeError> {
        log::info!("insert #{} after #{}", node.0, sibling.0);
        self.inner.insert_after(sibling, node)
    }

    fn prepend(&mut self, parent: LiveNode, child: LiveNode) -> Result<(), NodeError> {
        log::info!("prepend #{} to #{}", child.0, parent.0);
        self.inner.prepend(parent, child)
    }

    fn remove(&mut self, node: LiveNode) -> Result<(), NodeError> {
        log::info!("remove #{}", node.0);
        self.inner.remove(node)
    }

    fn set_property(
        &mut self,
        node: LiveNode,
        path: &PropPath,
        value: &PropValue,
    ) -> Result<(), NodeError> {
        log::info!("set #{}.{path} = {value}", node.0);
        self.inner.set_property(node, path, value)
    }

    fn first_child(&self, parent: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        self.inner.first_child(parent)
    }

    fn last_child(&self, parent: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        self.inner.last_child(parent)
    }

    fn previous_sibling(&self, node: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        self.inner.previous_sibling(node)
    }

    fn parent(&self, node: LiveNode) -> Result<Option<LiveNode>, NodeError> {
        self.inner.parent(node)
    }
}

#[derive(Clone)]
struct Todo {
    id: i64,
    title: String,
    done: bool,
}

#[derive(Default)]
struct TodoList {
    todos: Vec<Todo>,
    next_id: i64,
}

impl TodoList {
    fn add(&mut self, title: &str) {
        self.next_id += 1;
        self.todos.push(Todo {
            id: self.next_id,
            title: title.to_owned(),
            done: false,
        });
    }

    fn toggle(&mut self, id: i64) {
        if let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) {
            todo.done = !todo.done;
        }
    }

    fn row(todo: &Todo) -> VNode {
        VNode::element(
            ROW,
            Props::new().with("key", todo.id),
            vec![
                Some(VNode::leaf(CHECKBOX, Props::new().with("checked", todo.done))),
                Some(VNode::text(todo.title.clone())),
            ],
        )
    }
}

impl Component for TodoList {
    fn render(&mut self, _cx: &mut ComponentContext<'_>) -> Result<Render, RenderError> {
        let remaining = self.todos.iter().filter(|todo| !todo.done).count();
        let rows = VNode::group(self.todos.iter().map(|todo| Some(Self::row(todo))).collect())?;
        Ok(VNode::element(
            ElementType::VIEW,
            Props::new().with("style.padding", 8),
            vec![
                Some(VNode::text(format!("{remaining} left"))),
                Some(rows),
            ],
        )
        .into())
    }
}

fn step(
    runtime: &StdRuntime,
    engine: &mut Engine<LoggingAdapter>,
    host: LiveNode,
    label: &str,
) -> Result<(), canopy_core::Error> {
    let rendered = runtime.pump(engine)?;
    println!("--- {label} ({rendered} rendered)");
    print!("{}", engine.adapter().inner.dump_tree(host));
    Ok(())
}

fn main() -> Result<(), canopy_core::Error> {
    env_logger::init();

    let runtime = StdRuntime::new();
    let mut adapter = LoggingAdapter {
        inner: MemoryAdapter::new(),
    };
    let host = adapter.construct(&ElementType::new("window"))?;
    let mut engine = runtime.engine(adapter, EngineConfig::default());

    let mut list = TodoList::default();
    list.add("write the parser");
    list.add("review the diff");
    let root = engine.mount(Root::instance(list), Some(host))?;
    let Some(id) = engine.root_component(root) else {
        return Err(canopy_core::Error::UnknownRoot);
    };
    println!("--- mounted");
    print!("{}", engine.adapter().inner.dump_tree(host));

    engine.update_component::<TodoList, _>(id, |list| list.add("ship it"))?;
    step(&runtime, &mut engine, host, "added")?;

    engine.update_component::<TodoList, _>(id, |list| list.toggle(1))?;
    step(&runtime, &mut engine, host, "toggled")?;

    engine.update_component::<TodoList, _>(id, |list| list.todos.reverse())?;
    step(&runtime, &mut engine, host, "reversed")?;

    engine.update_component::<TodoList, _>(id, |list| list.todos.retain(|todo| !todo.done))?;
    step(&runtime, &mut engine, host, "cleared done")?;

    engine.update_component::<TodoList, _>(id, |list| list.todos.clear())?;
    step(&runtime, &mut engine, host, "emptied")?;

    engine.shutdown()?;
    Ok(())
}
