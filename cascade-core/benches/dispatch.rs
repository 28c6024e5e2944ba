//! Dispatch throughput with and without watched projections.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cascade_core::store::Store;

#[derive(Debug, Clone)]
enum Action {
    Inc(i64),
    Mark,
}

#[derive(Debug, Clone, Default)]
struct State {
    counter: i64,
    marks: u64,
    fields: [i64; 8],
}

fn reduce(state: &State, action: &Action) -> State {
    let mut next = state.clone();
    match action {
        Action::Inc(n) => next.counter += n,
        Action::Mark => next.marks += 1,
    }
    next
}

fn bench_dispatch(c: &mut Criterion) {
    let bare: Store<State, Action> = Store::new(State::default(), reduce);
    c.bench_function("dispatch_no_dependencies", |b| {
        b.iter(|| bare.dispatch(black_box(Action::Inc(1))))
    });

    let watched: Store<State, Action> = Store::new(State::default(), reduce);
    for field in 0..8 {
        watched
            .when_changed(move |s: &State| s.fields[field])
            .then_dispatch(Action::Mark);
    }
    c.bench_function("dispatch_eight_quiet_dependencies", |b| {
        b.iter(|| watched.dispatch(black_box(Action::Inc(1))))
    });

    let firing: Store<State, Action> = Store::new(State::default(), reduce);
    firing
        .when_changed(|s: &State| s.counter)
        .then_dispatch(Action::Mark);
    c.bench_function("dispatch_one_derived_action", |b| {
        b.iter(|| firing.dispatch(black_box(Action::Inc(1))))
    });
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
