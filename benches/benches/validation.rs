// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_validation::{Flags, ValidationGraph};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_below(&mut self, upper_exclusive: u32) -> u32 {
        if upper_exclusive == 0 {
            return 0;
        }
        self.next_u32() % upper_exclusive
    }
}

/// Builds a graph of `n` nodes where node `i` depends on up to `deps` earlier
/// nodes, declared in reverse so compilation has to reorder everything.
fn build_dag(n: u32, deps: u32, seed: u64) -> ValidationGraph<u64> {
    let mut rng = Lcg::new(seed);
    let mut masks = Vec::with_capacity(n as usize);
    for i in 0..n {
        let mut mask = Flags::empty();
        for _ in 0..deps.min(i) {
            mask |= Flags::bit(rng.gen_below(i));
        }
        masks.push(mask);
    }

    let mut graph = ValidationGraph::new();
    for i in (0..n).rev() {
        let weight = u64::from(i);
        graph.add_node_with_dependencies(Flags::bit(i), masks[i as usize], move |sum, _| {
            *sum += weight;
        });
    }
    graph
}

fn chain(n: u32) -> ValidationGraph<u64> {
    let mut graph = ValidationGraph::new();
    graph.add_node_simple(Flags::bit(0), |sum, _| *sum += 1);
    for i in 1..n {
        graph.add_node_with_dependencies(Flags::bit(i), Flags::bit(i - 1), |sum, _| *sum += 1);
    }
    graph
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_validation");

    for &(n, deps) in &[(8_u32, 1_u32), (32_u32, 1_u32), (32_u32, 4_u32)] {
        group.bench_function(format!("compile(n={n},d={deps})"), |b| {
            b.iter_batched(
                || build_dag(n, deps, 0x0A11_DA7E_0000_0001),
                |mut graph| {
                    graph.compile();
                    black_box(graph);
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("invalidate_root(n={n},d={deps})"), |b| {
            let mut graph = build_dag(n, deps, 0x0A11_DA7E_0000_0002);
            let mut sum = 0_u64;
            graph.validate_all(&mut sum);
            b.iter(|| {
                let invalidated = graph.invalidate(Flags::bit(0));
                graph.validate_all(&mut sum);
                black_box(invalidated);
            });
        });

        group.bench_function(format!("validate_leaf(n={n},d={deps})"), |b| {
            let mut graph = build_dag(n, deps, 0x0A11_DA7E_0000_0003);
            let leaf = Flags::bit(n - 1);
            b.iter(|| {
                graph.invalidate_all();
                let mut sum = 0_u64;
                let ran = graph.validate(&mut sum, leaf);
                black_box((ran, sum));
            });
        });
    }

    group.bench_function("validate_noop(chain=32)", |b| {
        let mut graph = chain(32);
        let mut sum = 0_u64;
        graph.validate_all(&mut sum);
        b.iter(|| black_box(graph.validate(&mut sum, Flags::all())));
    });

    group.bench_function("invalidate_noop(chain=32)", |b| {
        let mut graph = chain(32);
        b.iter(|| black_box(graph.invalidate(Flags::all())));
    });

    group.finish();
}

criterion_group!(benches, bench_validation);
criterion_main!(benches);
