use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use hosting_core::{
    BuildEngine, BuildMode, BuildResult, CollisionPolicy, FlexibleSizeRange, PredicateSet,
    ScopeRoot, Size, SizeRange,
};
use hosting_mount::{MemoryViewContainer, MountCoordinator};
use hosting_testing::{list_provider, CounterController, ListModel};
use hosting_view::{HostingController, HostingOptions};

const ITEM_COUNT: usize = 128;
const BUILD_ITEM_SAMPLES: &[usize] = &[16, 32, 64, 128, 256];
const ROOT_SIZE: Size = Size {
    width: 1080.0,
    height: 1920.0,
};

fn list_model(items: usize) -> ListModel {
    let names: Vec<String> = (0..items).map(|i| format!("item-{i}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    ListModel::new("Pipeline", &names)
}

fn engine() -> BuildEngine<ListModel, ()> {
    let predicates = PredicateSet::new()
        .with_component("views", |component| component.view().is_some())
        .with_controller("counters", |controller| {
            controller.downcast_ref::<CounterController>().is_some()
        });
    BuildEngine::new(list_provider::<()>, predicates, CollisionPolicy::Fail)
}

fn build(engine: &BuildEngine<ListModel, ()>, model: &ListModel, previous: &ScopeRoot, generation: u64) -> BuildResult {
    engine
        .build(model, &(), SizeRange::exactly(ROOT_SIZE), previous, generation)
        .expect("build")
}

fn bench_fresh_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_build");
    let engine = engine();
    for &items in BUILD_ITEM_SAMPLES {
        let model = list_model(items);
        group.bench_with_input(BenchmarkId::new("items", items), &model, |b, model| {
            let empty = ScopeRoot::empty();
            b.iter(|| black_box(build(&engine, model, &empty, 1)));
        });
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let engine = engine();
    let model = list_model(ITEM_COUNT);
    let previous = build(&engine, &model, &ScopeRoot::empty(), 1);

    c.bench_function("pipeline_rebuild", |b| {
        b.iter(|| black_box(build(&engine, &model, previous.scope_root(), 2)));
    });
}

fn bench_mount(c: &mut Criterion) {
    let engine = engine();
    let full = build(&engine, &list_model(ITEM_COUNT), &ScopeRoot::empty(), 1);
    let half = build(&engine, &list_model(ITEM_COUNT / 2), full.scope_root(), 2);

    c.bench_function("pipeline_mount", |b| {
        b.iter_batched(
            || {
                let mut coordinator = MountCoordinator::new();
                let mut container = MemoryViewContainer::new();
                coordinator.apply(&full, &mut container).expect("mount full");
                (coordinator, container)
            },
            |(mut coordinator, mut container)| {
                let stats = coordinator.apply(&half, &mut container).expect("mount half");
                black_box(stats);
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut controller: HostingController<ListModel, (), MemoryViewContainer> = HostingController::new(
        list_provider::<()>,
        FlexibleSizeRange::FlexibleHeight,
        (),
        PredicateSet::new(),
        None,
        HostingOptions::default().with_initial_size(ROOT_SIZE),
        None,
        MemoryViewContainer::new(),
    );
    let models = [list_model(ITEM_COUNT), list_model(ITEM_COUNT - 1)];
    let mut flip = 0;

    c.bench_function("pipeline_full", |b| {
        b.iter(|| {
            flip ^= 1;
            let generation = controller
                .update_model(models[flip].clone(), BuildMode::Synchronous)
                .expect("update");
            black_box(generation);
        });
    });
}

criterion_group!(
    pipeline,
    bench_fresh_build,
    bench_rebuild,
    bench_mount,
    bench_full_pipeline
);
criterion_main!(pipeline);
