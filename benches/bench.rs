// Criterion benchmarks for Pump Select

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pump_select::core::{curve::generate_curve, filters::meets_duty_point, ranking::rank, Selector};
use pump_select::models::{CatalogItem, PerformanceSample, SelectionRequest};
use std::collections::HashMap;

fn create_item(id: usize) -> CatalogItem {
    let flow = 5.0 + (id % 40) as f64 * 2.5;
    let head = 10.0 + (id % 25) as f64 * 3.0;
    CatalogItem::new(id.to_string(), format!("Pump {}", id), flow, head, flow * head / 150.0)
        .unwrap()
        .with_efficiency(55.0 + (id % 30) as f64)
}

fn create_snapshot(
    item_count: usize,
    request: &SelectionRequest,
) -> (HashMap<String, CatalogItem>, Vec<PerformanceSample>) {
    let items: HashMap<String, CatalogItem> = (0..item_count)
        .map(create_item)
        .map(|item| (item.item_id.clone(), item))
        .collect();

    let samples = items
        .values()
        .flat_map(generate_curve)
        .filter(|s| meets_duty_point(s, request.required_flow, request.required_head))
        .collect();

    (items, samples)
}

fn bench_generate_curve(c: &mut Criterion) {
    let small = create_item(1);
    let large = CatalogItem::new("large", "Large", 400.0, 80.0, 95.0)
        .unwrap()
        .with_efficiency(84.0);

    c.bench_function("generate_curve_small", |b| {
        b.iter(|| generate_curve(black_box(&small)))
    });
    c.bench_function("generate_curve_large", |b| {
        b.iter(|| generate_curve(black_box(&large)))
    });
}

fn bench_selection(c: &mut Criterion) {
    let selector = Selector::with_defaults();
    let request = SelectionRequest::new(20.0, 25.0);

    let mut group = c.benchmark_group("selection");

    for item_count in [10, 50, 100, 500].iter() {
        let (items, samples) = create_snapshot(*item_count, &request);

        group.bench_with_input(
            BenchmarkId::new("select", item_count),
            item_count,
            |b, _| {
                b.iter(|| {
                    selector.select(
                        black_box(&request),
                        black_box(&items),
                        black_box(samples.clone()),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let selector = Selector::with_defaults();
    let request = SelectionRequest::new(20.0, 25.0);
    let (items, samples) = create_snapshot(100, &request);

    // Score once without dedup so only ranking is measured
    let scored: Vec<_> = samples
        .iter()
        .filter_map(|s| {
            let item = items.get(&s.item_id)?;
            Some(pump_select::score_candidate(
                item,
                s,
                &request,
                selector.weights(),
                &Default::default(),
            ))
        })
        .collect();

    c.bench_function("rank_100_items", |b| {
        b.iter(|| rank(black_box(scored.clone())))
    });
}

criterion_group!(benches, bench_generate_curve, bench_selection, bench_rank);

criterion_main!(benches);
