use criterion::{Criterion, criterion_group, criterion_main};
use pursuit_bot::{DecisionEngine, EngineConfig};
use pursuit_core::game::GameSetup;
use pursuit_core::map::TransportGraph;
use std::hint::black_box;
use std::sync::Arc;

fn bench_decisions(c: &mut Criterion) {
    let graph = Arc::new(TransportGraph::builtin().expect("demo map"));
    let engine = DecisionEngine::new(Arc::clone(&graph), EngineConfig::default());
    let state = GameSetup::default()
        .deal_with_seed(&graph, 2024)
        .expect("deal");
    let culprit_state = state.clone();
    let mut detective_state = state;
    let opening = engine.calculate_move(&detective_state, detective_state.to_move());
    detective_state
        .apply_move(&graph, opening)
        .expect("opening move applies");
    let detective = detective_state.to_move();

    let mut group = c.benchmark_group("decision");
    group.sample_size(20);
    group.bench_function("culprit_opening", |b| {
        b.iter(|| black_box(engine.calculate_move(&culprit_state, black_box(culprit_state.to_move()))))
    });
    group.bench_function("detective_reply", |b| {
        b.iter(|| black_box(engine.calculate_move(&detective_state, black_box(detective))))
    });
    group.finish();
}

criterion_group!(benches, bench_decisions);
criterion_main!(benches);
