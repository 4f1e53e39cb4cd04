use criterion::{criterion_group, criterion_main, Criterion};
use sokoban_solver::{Level, SearchContext};
use std::hint::black_box;

const LEVEL: &str = include_str!("../levels/warehouse.txt");

fn context() -> SearchContext {
    SearchContext::new(Level::parse(LEVEL).unwrap()).unwrap()
}

fn bench_successors(c: &mut Criterion) {
    let ctx = context();
    let start = ctx.initial_config();
    let mut frontier = vec![start.number()];
    for b in 0..ctx.n_boxes() {
        frontier.extend(start.successors(b).iter().map(|(_, s)| s.number));
    }

    c.bench_function("codec/successors", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &n in &frontier {
                let conf = ctx.config(n);
                for b in 0..ctx.n_boxes() {
                    for (_, s) in conf.successors(b) {
                        acc = acc.wrapping_add(s.number);
                    }
                }
            }
            black_box(acc)
        })
    });
}

fn bench_rank(c: &mut Criterion) {
    let ctx = context();
    let indexer = ctx.indexer();
    let total = indexer.num_subsets();
    c.bench_function("indexer/unrank_rank", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for i in (0..total).step_by((total / 997).max(1) as usize) {
                let subset = indexer.unrank(black_box(i));
                acc = acc.wrapping_add(indexer.rank(&subset));
            }
            black_box(acc)
        })
    });
}

criterion_group!(codec, bench_successors, bench_rank);
criterion_main!(codec);
