//! Benchmarks for rectangle bin packing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rbp_core::{Item, PackingHeuristic, PackingSolution, SolutionConfig};

fn random_items(count: usize) -> Vec<Item> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| Item::new(rng.gen_range(1..=40), rng.gen_range(1..=40)))
        .collect()
}

fn packing_benchmark(c: &mut Criterion) {
    let items = random_items(100);

    for heuristic in PackingHeuristic::ALL {
        c.bench_function(&format!("pack_100_random_{}", heuristic.short_name()), |b| {
            b.iter(|| {
                let mut solution =
                    PackingSolution::with_config(100, 100, SolutionConfig::new().with_seed(1));
                solution
                    .pack(black_box(items.clone()), heuristic, false)
                    .unwrap();
                black_box(solution.number_of_bins())
            })
        });
    }

    let parallel = SolutionConfig::new()
        .with_parallel_evaluation(true)
        .with_seed(1);
    c.bench_function("pack_100_random_parallel", |b| {
        b.iter(|| {
            let mut solution = PackingSolution::with_config(100, 100, parallel.clone());
            solution
                .pack(black_box(items.clone()), PackingHeuristic::BestAreaFit, false)
                .unwrap();
            black_box(solution.number_of_bins())
        })
    });
}

fn repack_benchmark(c: &mut Criterion) {
    let mut solution = PackingSolution::with_config(100, 100, SolutionConfig::new().with_seed(3));
    solution
        .pack(random_items(100), PackingHeuristic::BestAreaFit, false)
        .unwrap();

    c.bench_function("remove_and_repack_quarter", |b| {
        b.iter(|| {
            solution
                .remove_and_repack(PackingHeuristic::BestAreaFit, 0.25, true, false, false)
                .unwrap();
            black_box(solution.solution_value().unwrap())
        })
    });
}

criterion_group!(benches, packing_benchmark, repack_benchmark);
criterion_main!(benches);
