//! Population benchmarks.
//!
//! Measures the per-tick and per-request costs of the policy engine:
//!
//! - **Despawn pass:** one `WorldSpawnState::despawn` call per live entity,
//!   at 1K entities.
//! - **Snapshot:** a full composition snapshot over 1K to 10K entities, with
//!   living groups enabled so the per-entity deduplication is exercised.
//! - **Rebuild:** a full registry rebuild over 200 entity kinds and 20 biomes
//!   against the in-memory store.
//!
//! Run with: `cargo bench --bench population_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use populace_config::backend::MemoryBackend;
use populace_core::category::NativeCategory;
use populace_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const KINDS: usize = 200;
const BIOMES: usize = 20;

/// A host with `KINDS` entity kinds spread over the four native categories,
/// each present in the baseline table of every fourth biome.
fn host() -> StaticHost {
    let mut host = StaticHost::new("Overworld");
    for b in 0..BIOMES {
        host = host.with_biome(&format!("biome{b}"));
    }
    for k in 0..KINDS {
        let native = NativeCategory::ALL[k % NativeCategory::ALL.len()];
        let kind = format!("mod{}.Creature{k}", k % 7);
        host = host.with_living(&kind, &[native]);
        for b in (k % 4..BIOMES).step_by(4) {
            host = host.with_baseline(&format!("biome{b}"), native, &kind, 10 + k as u32, 1, 4);
        }
    }
    host
}

fn settings() -> EngineSettings {
    let mut settings = EngineSettings::default();
    for g in 0..10 {
        let members = (g..KINDS).step_by(10).map(|k| format!("mod{}.Creature{k}", k % 7)).collect();
        settings.groups.insert(format!("group{g}"), members);
    }
    settings
}

fn entities(count: usize, rng: &mut Pcg64) -> Vec<EntityRecord> {
    (0..count)
        .map(|i| {
            let k = i % KINDS;
            let position = Position::new(rng.gen_range(-128.0..128.0), 64.0, rng.gen_range(-128.0..128.0));
            EntityRecord::new(&format!("mod{}.Creature{k}", k % 7), position, rng.gen_range(0..2_000))
        })
        .collect()
}

fn observers() -> Vec<Position> {
    vec![Position::new(0.0, 64.0, 0.0), Position::new(64.0, 64.0, 64.0)]
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_despawn_pass(c: &mut Criterion) {
    let mut store = MemoryBackend::new();
    let (state, _) = WorldSpawnState::load(settings(), &host(), &mut store);
    let mut rng = Pcg64::seed_from_u64(1);
    let population = entities(1_000, &mut rng);
    let observers = observers();

    c.bench_function("despawn_pass_1k", |b| {
        b.iter(|| {
            let mut live = population.clone();
            let mut despawned = 0usize;
            for entity in &mut live {
                if state.despawn(entity, &observers, &mut rng) == DespawnDecision::Despawn {
                    despawned += 1;
                }
            }
            black_box(despawned)
        });
    });
}

fn bench_snapshot_scaling(c: &mut Criterion) {
    let mut store = MemoryBackend::new();
    let (state, _) = WorldSpawnState::load(settings(), &host(), &mut store);
    let mut rng = Pcg64::seed_from_u64(2);
    let observers = observers();

    let mut group = c.benchmark_group("snapshot_scaling");
    for count in [1_000, 5_000, 10_000] {
        let population = entities(count, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(count), &population, |b, population| {
            b.iter(|| black_box(state.snapshot(population, &observers, &CategoryFilter::All)));
        });
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    let host = host();
    let mut store = MemoryBackend::new();
    let (mut state, _) = WorldSpawnState::load(settings(), &host, &mut store);

    c.bench_function("rebuild_200_kinds_20_biomes", |b| {
        b.iter(|| black_box(state.rebuild(&host, &mut store).entries_installed));
    });
}

criterion_group!(benches, bench_despawn_pass, bench_snapshot_scaling, bench_rebuild);
criterion_main!(benches);
