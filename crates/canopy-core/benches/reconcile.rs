use canopy_core::{ElementType, Engine, MemoryAdapter, Props, RootId, VNode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SECTION_COUNT: usize = 4;
const ROWS_PER_SECTION: usize = 32;
const ROW_SAMPLES: &[usize] = &[8, 16, 32, 64, 128];

const ROW: ElementType = ElementType::new("row");

fn row(section: usize, index: usize, revision: usize) -> VNode {
    VNode::element(
        ROW,
        Props::new().with("key", index),
        vec![
            Some(VNode::text(format!("Item {section}-{index}"))),
            Some(VNode::text(format!("Detail {section}-{index} r{revision}"))),
        ],
    )
}

fn section(section: usize, rows: &[usize], revision: usize) -> VNode {
    let entries = rows
        .iter()
        .map(|&index| Some(row(section, index, revision)))
        .collect();
    VNode::element(
        ElementType::VIEW,
        Props::new().with("key", section),
        vec![
            Some(VNode::text(format!("Section {section}"))),
            Some(VNode::group(entries).expect("unique row keys")),
        ],
    )
}

fn screen(sections: usize, rows: &[usize], revision: usize) -> VNode {
    VNode::element(
        ElementType::VIEW,
        Props::new(),
        (0..sections)
            .map(|index| Some(section(index, rows, revision)))
            .collect(),
    )
}

struct ReconcileFixture {
    engine: Engine<MemoryAdapter>,
    root: RootId,
}

impl ReconcileFixture {
    fn new(sections: usize, rows: &[usize]) -> Self {
        let mut engine = Engine::new(MemoryAdapter::new());
        let root = engine
            .mount(screen(sections, rows, 0), None)
            .expect("initial mount");
        Self { engine, root }
    }

    fn update(&mut self, tree: VNode) {
        self.engine.update_root(self.root, tree).expect("update");
        self.engine.adapter_mut().clear_ops();
    }
}

fn bench_materialize(c: &mut Criterion) {
    let rows: Vec<usize> = (0..ROWS_PER_SECTION).collect();
    c.bench_function("reconcile_materialize", |b| {
        b.iter(|| {
            let mut engine = Engine::new(MemoryAdapter::new());
            let node = engine
                .render(screen(SECTION_COUNT, &rows, 0), None)
                .expect("render");
            black_box(node);
        });
    });
}

fn bench_unchanged(c: &mut Criterion) {
    let rows: Vec<usize> = (0..ROWS_PER_SECTION).collect();
    let mut fixture = ReconcileFixture::new(SECTION_COUNT, &rows);
    c.bench_function("reconcile_unchanged", |b| {
        b.iter(|| fixture.update(screen(SECTION_COUNT, &rows, 0)));
    });
}

fn bench_patch_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_patch_text");
    for &count in ROW_SAMPLES {
        let rows: Vec<usize> = (0..count).collect();
        group.bench_with_input(BenchmarkId::new("rows", count), &rows, |b, rows| {
            let mut fixture = ReconcileFixture::new(SECTION_COUNT, rows);
            let mut revision = 0;
            b.iter(|| {
                revision += 1;
                fixture.update(screen(SECTION_COUNT, rows, revision));
            });
        });
    }
    group.finish();
}

fn bench_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_reverse");
    for &count in ROW_SAMPLES {
        let forward: Vec<usize> = (0..count).collect();
        let backward: Vec<usize> = forward.iter().rev().copied().collect();
        group.bench_with_input(BenchmarkId::new("rows", count), &count, |b, _| {
            let mut fixture = ReconcileFixture::new(SECTION_COUNT, &forward);
            let mut flipped = false;
            b.iter(|| {
                flipped = !flipped;
                let order = if flipped { &backward } else { &forward };
                fixture.update(screen(SECTION_COUNT, order, 0));
            });
        });
    }
    group.finish();
}

criterion_group!(
    reconcile,
    bench_materialize,
    bench_unchanged,
    bench_patch_text,
    bench_reverse
);
criterion_main!(reconcile);
