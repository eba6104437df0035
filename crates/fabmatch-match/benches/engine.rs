//! Matching benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fabmatch_core::{ModelEntity, PartRecord};
use fabmatch_match::{best_alignment, match_records, MatchOptions};
use glam::{DMat3, DVec3};

fn frame(i: usize) -> DMat3 {
    DMat3::from_rotation_z(i as f64 * 0.37) * DMat3::from_rotation_x((i % 5) as f64 * 0.9)
}

/// `groups` name keys with `size` entities and parts each.
fn dataset(groups: usize, size: usize) -> (Vec<ModelEntity>, Vec<PartRecord>) {
    let mut entities = Vec::new();
    let mut parts = Vec::new();
    for g in 0..groups {
        for i in 0..size {
            let f = frame(g * size + i);
            entities.push(ModelEntity {
                id: format!("e{g}-{i}"),
                name_key: format!("P{g}.nc"),
                axis: f.z_axis,
                ref_direction: f.x_axis,
                location: DVec3::ZERO,
            });
            parts.push(PartRecord {
                id: format!("p{g}-{i}"),
                name_key: format!("P{g}.nc"),
                rx: -f.x_axis,
                ry: f.y_axis,
                base: DVec3::ZERO,
            });
        }
    }
    parts.reverse();
    (entities, parts)
}

fn flip_search(c: &mut Criterion) {
    let f = frame(7);
    c.bench_function("flip_search", |b| {
        b.iter(|| {
            best_alignment(
                black_box(f.z_axis),
                black_box(f.x_axis),
                black_box(DVec3::X),
                black_box(DVec3::Y),
                None,
            )
        })
    });
}

fn match_small_groups(c: &mut Criterion) {
    let (entities, parts) = dataset(200, 3);
    c.bench_function("match_200x3", |b| {
        b.iter(|| match_records(black_box(&entities), black_box(&parts), &MatchOptions::default()))
    });
}

fn match_large_group(c: &mut Criterion) {
    let (entities, parts) = dataset(1, 40);
    c.bench_function("match_1x40", |b| {
        b.iter(|| match_records(black_box(&entities), black_box(&parts), &MatchOptions::default()))
    });
}

criterion_group!(benches, flip_search, match_small_groups, match_large_group);
criterion_main!(benches);
