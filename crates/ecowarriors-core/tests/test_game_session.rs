//! Integration tests driving the engine the way a host would.
//!
//! Exercises: menu -> loading -> playing -> paused -> menu, the simulator
//! tick cadence across pauses, and restart persistence through a shared
//! storage backend.

use ecowarriors_core::config::{GameConfig, SessionConfig, SimulationScope};
use ecowarriors_core::engine::GameEngine;
use ecowarriors_core::input::KeyCode;
use ecowarriors_core::persistence::{decode_record, MemoryStorage, DEFAULT_RECORD_NAME};
use ecowarriors_core::store::{PersistentStore, PlayerPose};
use ecowarriors_core::ui::Intent;
use ecowarriors_logic::ecosystem::EcosystemId;
use ecowarriors_logic::session::SessionMode;
use serde_json::json;

const DT: f32 = 1.0 / 60.0;

// ── Helpers ────────────────────────────────────────────────────────────

fn config() -> GameConfig {
    GameConfig {
        session: SessionConfig {
            min_loading_secs: 0.5,
            ..SessionConfig::default()
        },
        ..GameConfig::default()
    }
}

fn engine_on(storage: &MemoryStorage) -> GameEngine {
    let store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
    GameEngine::with_store(config(), store)
}

fn run(engine: &mut GameEngine, seconds: f32) -> u32 {
    let frames = (seconds / DT).round() as usize;
    (0..frames).map(|_| engine.update(DT).ticks).sum()
}

fn start_playing(engine: &mut GameEngine) {
    assert!(engine.dispatch(Intent::StartGame));
    run(engine, 0.6);
    assert_eq!(engine.mode(), SessionMode::Playing, "loading finished");
}

// ── Session flow ───────────────────────────────────────────────────────

#[test]
fn full_session_flow() {
    let storage = MemoryStorage::new();
    let mut engine = engine_on(&storage);
    assert_eq!(engine.mode(), SessionMode::Menu);

    assert!(!engine.dispatch(Intent::Pause), "cannot pause from the menu");
    start_playing(&mut engine);

    // Walk forward for a second.
    engine.key_down(KeyCode::KeyW);
    run(&mut engine, 1.0);
    engine.key_up(KeyCode::KeyW);
    let pose = engine.store().state().pose;
    assert!(pose.position.z < -1.0, "walked forward along -Z: {:?}", pose.position);

    engine.key_down(KeyCode::Escape);
    assert_eq!(engine.mode(), SessionMode::Paused);
    let ticks_before = engine.simulator().tick_count();
    run(&mut engine, 3.0);
    assert_eq!(engine.simulator().tick_count(), ticks_before, "paused world is frozen");
    assert!(engine.visuals().is_some(), "paused world stays on screen");

    assert!(engine.dispatch(Intent::ToMenu { reset_progress: false }));
    assert_eq!(engine.mode(), SessionMode::Menu);
    assert!(engine.visuals().is_none());
    engine.shutdown();
}

#[test]
fn ticks_only_advance_current_ecosystem_by_default() {
    let mut engine = GameEngine::new(config());
    start_playing(&mut engine);
    let ocean_before = engine.store().state().ecosystem(EcosystemId::Ocean);
    let ticks = run(&mut engine, 5.0);
    assert!(ticks >= 4, "ticks {ticks}");
    let state = engine.store().state();
    assert_eq!(state.ecosystem(EcosystemId::Ocean), ocean_before, "off-screen biome untouched");
    assert_ne!(
        state.ecosystem(EcosystemId::Forest),
        EcosystemId::Forest.initial_state(),
        "current biome evolved"
    );
}

#[test]
fn all_scope_advances_every_ecosystem() {
    let mut cfg = config();
    cfg.simulation.scope = SimulationScope::All;
    let mut engine = GameEngine::new(cfg);
    start_playing(&mut engine);
    run(&mut engine, 3.0);
    let state = engine.store().state();
    for id in EcosystemId::ALL {
        assert_ne!(state.ecosystem(id), id.initial_state(), "{id} evolved");
    }
}

#[test]
fn pause_keeps_partial_interval() {
    let mut engine = GameEngine::new(config());
    start_playing(&mut engine);

    // Align to a tick boundary, then accumulate 0.7 s.
    let acc = engine.simulator().accumulated();
    engine.update((1.0 - acc) as f32 + 1e-4);
    engine.update(0.7);
    let acc = engine.simulator().accumulated();
    assert!((acc - 0.7).abs() < 1e-3, "acc {acc}");
    let ticks = engine.simulator().tick_count();

    engine.dispatch(Intent::Pause);
    run(&mut engine, 10.0);
    engine.dispatch(Intent::Resume);

    assert_eq!(engine.update(0.25).ticks, 0);
    assert_eq!(engine.update(0.06).ticks, 1, "tick fires 0.3 s after resume, not 1.0 s");
    assert_eq!(engine.simulator().tick_count(), ticks + 1);
}

#[test]
fn scene_switch_changes_simulated_biome() {
    let mut engine = GameEngine::new(config());
    start_playing(&mut engine);
    assert!(engine.dispatch(Intent::SwitchScene(EcosystemId::Urban)));
    let forest = engine.store().state().ecosystem(EcosystemId::Forest);
    run(&mut engine, 2.5);
    let state = engine.store().state();
    assert_eq!(state.current_ecosystem, EcosystemId::Urban);
    assert_eq!(state.ecosystem(EcosystemId::Forest), forest);
    assert!(state.ecosystem(EcosystemId::Urban).health() < 45.0, "urban decays");
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn restart_round_trip_restores_persisted_subset_only() {
    let storage = MemoryStorage::new();
    let mut engine = engine_on(&storage);
    start_playing(&mut engine);

    engine.dispatch(Intent::StartQuest("cleanup-forest-1".into()));
    engine.dispatch(Intent::CompleteQuest("cleanup-forest-1".into()));
    engine.store_mut().add_to_inventory("materials", "wood", 4);
    engine.dispatch(Intent::UpdateSetting {
        category: "controls".into(),
        key: "invertY".into(),
        value: json!(true),
    });
    engine.key_down(KeyCode::KeyD);
    run(&mut engine, 1.5);
    engine.key_up(KeyCode::KeyD);

    let before = engine.store().state().clone();
    assert_ne!(before.pose, PlayerPose::default(), "player moved");
    engine.shutdown();
    drop(engine);

    let reloaded = engine_on(&storage);
    let after = reloaded.store().state();
    assert_eq!(after.progress, before.progress);
    assert_eq!(after.settings, before.settings);
    assert_eq!(after.ecosystems, before.ecosystems, "levels survive bit for bit");
    assert_eq!(after.pose, PlayerPose::default(), "pose back to the entry point");
    assert_eq!(after.mode, SessionMode::Menu);
    assert_eq!(reloaded.mode(), SessionMode::Menu);

    let record = decode_record(&storage.get(DEFAULT_RECORD_NAME).unwrap()).unwrap();
    assert_eq!(record.experience, 100);
    assert_eq!(record.inventory["materials"]["wood"], 4);
}

#[test]
fn corrupt_record_falls_back_to_defaults() {
    let storage = MemoryStorage::new();
    storage.insert(DEFAULT_RECORD_NAME, "{not json");
    let engine = engine_on(&storage);
    assert_eq!(engine.store().state().progress.level(), 1);
    assert_eq!(
        engine.store().state().ecosystem(EcosystemId::Urban),
        EcosystemId::Urban.initial_state()
    );
}

#[test]
fn wrong_typed_inventory_keeps_saved_progress() {
    let storage = MemoryStorage::new();
    storage.insert(
        DEFAULT_RECORD_NAME,
        r#"{"experience":740,"inventory":{"materials":{"wood":3},"tools":[],"items":[]},"ecosystemHealth":{"forest":12.0}}"#,
    );
    let mut engine = engine_on(&storage);
    assert_eq!(engine.store().state().progress.experience(), 740);
    assert_eq!(engine.store().state().ecosystem(EcosystemId::Forest).health(), 12.0);

    start_playing(&mut engine);
    run(&mut engine, 1.5);
    let record = decode_record(&storage.get(DEFAULT_RECORD_NAME).unwrap()).unwrap();
    assert_eq!(record.experience, 740);
    assert_eq!(record.inventory["materials"]["wood"], 3);
    assert!(record.player_stats["playTime"] >= 1.0);
}

#[test]
fn failed_write_is_retried_on_next_mutation() {
    let storage = MemoryStorage::new();
    let mut engine = engine_on(&storage);
    storage.set_read_only(true);
    engine.store_mut().add_experience(30);
    engine.update(DT);
    assert!(engine.store().has_pending_write());
    assert!(storage.get(DEFAULT_RECORD_NAME).is_none());

    storage.set_read_only(false);
    engine.store_mut().add_experience(5);
    engine.update(DT);
    assert!(!engine.store().has_pending_write());
    let record = decode_record(&storage.get(DEFAULT_RECORD_NAME).unwrap()).unwrap();
    assert_eq!(record.experience, 35);
}

#[test]
fn reset_to_menu_wipes_progress_but_keeps_settings() {
    let storage = MemoryStorage::new();
    let mut engine = engine_on(&storage);
    start_playing(&mut engine);
    engine.dispatch(Intent::UpdateSetting {
        category: "audio".into(),
        key: "musicVolume".into(),
        value: json!(0.25),
    });
    engine.dispatch(Intent::CleanPollution { amount: 10.0 });
    assert!(engine.dispatch(Intent::ToMenu { reset_progress: true }));

    let state = engine.store().state();
    assert_eq!(state.progress.experience(), 0);
    assert_eq!(state.ecosystem(EcosystemId::Forest), EcosystemId::Forest.initial_state());
    assert_eq!(state.settings.audio.music_volume, 0.25);
}

#[test]
fn binary_snapshot_round_trip() {
    let mut engine = GameEngine::new(config());
    start_playing(&mut engine);
    engine.dispatch(Intent::CleanPollution { amount: 3.0 });

    let mut slot = Vec::new();
    engine.export_snapshot(&mut slot).unwrap();

    let mut other = GameEngine::new(config());
    other.import_snapshot(slot.as_slice()).unwrap();
    assert_eq!(other.store().state().progress, engine.store().state().progress);
    assert_eq!(other.store().state().ecosystems, engine.store().state().ecosystems);
    assert!(other.import_snapshot(&b"garbage"[..]).is_err());
}
