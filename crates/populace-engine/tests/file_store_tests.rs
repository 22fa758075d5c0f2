//! Rebuilds against the on-disk JSON store.

use std::fs;

use populace_core::category::NativeCategory;
use populace_engine::prelude::*;

fn host(world: &str) -> StaticHost {
    StaticHost::new(world)
        .with_biome("Plains")
        .with_living("mod1.Zombie", &[NativeCategory::Monster])
        .with_living("Cow", &[NativeCategory::Creature])
        .with_baseline("Plains", NativeCategory::Monster, "mod1.Zombie", 100, 2, 4)
        .with_baseline("Plains", NativeCategory::Creature, "Cow", 8, 4, 4)
}

#[test]
fn rebuild_writes_one_file_per_world_and_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileBackend::new(dir.path());
    let (_, report) = WorldSpawnState::load(EngineSettings::default(), &host("Overworld"), &mut store);

    assert_eq!(report.documents_saved, 4);
    assert!(report.store_errors.is_empty());
    for (world, namespace) in [("Master", "mod1"), ("Master", "Vanilla"), ("Overworld", "mod1"), ("Overworld", "Vanilla")] {
        assert!(store.document_path(world, namespace).is_file(), "{world}/{namespace}");
    }
}

#[test]
fn user_edits_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileBackend::new(dir.path());
    let (state, _) = WorldSpawnState::load(EngineSettings::default(), &host("Overworld"), &mut store);
    let first = state.fingerprint().unwrap();

    // Edit the generated world document the way a user would.
    let path = store.document_path("Overworld", "mod1");
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace("100|4|2|4", "25|4|1|1")).unwrap();

    let (state, _) = WorldSpawnState::load(EngineSettings::default(), &host("Overworld"), &mut store);
    assert_ne!(state.fingerprint().unwrap(), first);
    let zombie = &state.spawn_list("MONSTER", "Plains")[0];
    assert_eq!((zombie.weight(), zombie.min_group(), zombie.max_group()), (25, 1, 1));
}

#[test]
fn worlds_have_separate_layers() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileBackend::new(dir.path());
    WorldSpawnState::load(EngineSettings::default(), &host("Overworld"), &mut store);

    let path = store.document_path("Overworld", "Vanilla");
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace("CREATURE|true|false|false", "CREATURE|false|false|false")).unwrap();

    let (overworld, _) = WorldSpawnState::load(EngineSettings::default(), &host("Overworld"), &mut store);
    let (nether, _) = WorldSpawnState::load(EngineSettings::default(), &host("Nether"), &mut store);
    assert!(!overworld.policy("Cow").unwrap().should_spawn());
    assert!(nether.policy("Cow").unwrap().should_spawn());
}

#[test]
fn corrupt_document_is_moved_aside_and_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileBackend::new(dir.path());
    let path = store.document_path("Master", "mod1");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{ not json").unwrap();

    let (state, report) = WorldSpawnState::load(EngineSettings::default(), &host("Overworld"), &mut store);
    assert!(report.store_errors.is_empty());
    assert_eq!(state.spawn_list("MONSTER", "Plains").len(), 1);

    let mut aside = path.as_os_str().to_owned();
    aside.push(".corrupt");
    assert_eq!(fs::read_to_string(aside).unwrap(), "{ not json");
    assert!(fs::read_to_string(&path).unwrap().contains("mod1.Zombie"));
}

#[test]
fn settings_file_drives_the_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("populace.json");
    fs::write(&settings_path, r#"{ "global_layer": "Defaults" }"#).unwrap();
    let settings = EngineSettings::load(&settings_path).unwrap();

    let mut store = FileBackend::new(dir.path().join("store"));
    WorldSpawnState::load(settings, &host("Overworld"), &mut store);
    assert!(store.document_path("Defaults", "Vanilla").is_file());
    assert!(!store.document_path("Master", "Vanilla").exists());
}
