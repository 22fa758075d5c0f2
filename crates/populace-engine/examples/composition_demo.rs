//! Composition demo -- rebuild a small world, run a few despawn passes and
//! print the population report after each one.
//!
//! Run with: `cargo run -p populace-engine --example composition_demo`
//!
//! Set `RUST_LOG=populace_engine=debug` to see every resolution step. The
//! generated store documents are written under a temporary directory whose
//! path is printed at startup.

use populace_core::category::NativeCategory;
use populace_engine::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;

// ---------------------------------------------------------------------------
// Host setup
// ---------------------------------------------------------------------------

struct Server {
    entities: Vec<EntityRecord>,
    observers: Vec<Position>,
}

impl PopulationSource for Server {
    type Entity = EntityRecord;

    fn player_world(&self, player: &str) -> Option<PlayerWorld<'_, EntityRecord>> {
        (player == "steve").then(|| PlayerWorld {
            entities: &self.entities,
            observers: &self.observers,
        })
    }
}

fn host() -> StaticHost {
    StaticHost::new("Overworld")
        .with_biome("Plains")
        .with_biome("Swamp")
        .with_living("mod1.Zombie", &[NativeCategory::Monster])
        .with_living("Skeleton", &[NativeCategory::Monster])
        .with_living("Cow", &[NativeCategory::Creature])
        .with_living("Bat", &[NativeCategory::Ambient])
        .with_unsampleable("mod2.Golem", &[NativeCategory::Creature])
        .with_baseline("Plains", NativeCategory::Monster, "mod1.Zombie", 100, 2, 4)
        .with_baseline("Plains", NativeCategory::Monster, "Skeleton", 100, 4, 4)
        .with_baseline("Swamp", NativeCategory::Monster, "mod1.Zombie", 60, 1, 2)
        .with_baseline("Plains", NativeCategory::Creature, "Cow", 8, 4, 4)
        .with_baseline("Swamp", NativeCategory::Ambient, "Bat", 10, 8, 8)
}

fn populate(rng: &mut Pcg64) -> Vec<EntityRecord> {
    use rand::Rng;

    let kinds = ["mod1.Zombie", "Skeleton", "Cow", "Bat", "mod2.Golem"];
    (0..60)
        .map(|i| {
            let kind = kinds[i % kinds.len()];
            let position = Position::new(rng.gen_range(-96.0..96.0), 64.0, rng.gen_range(-96.0..96.0));
            EntityRecord::new(kind, position, rng.gen_range(0..1_500))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    init_logging("populace_engine=info");

    let dir = tempfile::tempdir()?;
    println!("store: {}", dir.path().display());

    let mut settings = EngineSettings::default();
    settings
        .groups
        .insert("undead".to_owned(), vec!["mod1.Zombie".to_owned(), "Skeleton".to_owned()]);

    let mut store = FileBackend::new(dir.path());
    let (state, report) = WorldSpawnState::load(settings, &host(), &mut store);
    println!(
        "rebuilt '{}': {} kinds, {} spawn entries, fingerprint {}",
        report.world,
        report.kinds_registered,
        report.entries_installed,
        state.fingerprint()?
    );

    let mut rng = Pcg64::seed_from_u64(7);
    let mut server = Server {
        entities: populate(&mut rng),
        observers: vec![Position::new(0.0, 64.0, 0.0)],
    };

    for pass in 1..=3 {
        let report = composition(&state, &server, &CompositionRequest::all("steve"))?;
        println!("\n-- pass {pass} --\n{report}");

        let observers = server.observers.clone();
        server.entities.retain_mut(|entity| {
            entity.age += 200;
            state.despawn(entity, &observers, &mut rng) != DespawnDecision::Despawn
        });
    }

    match composition(&state, &server, &CompositionRequest::category("steve", "DRAGON")) {
        Ok(_) => println!("unexpected report"),
        Err(e) => println!("\nrejected: {e}"),
    }
    Ok(())
}
