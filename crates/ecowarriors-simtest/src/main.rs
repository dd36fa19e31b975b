//! Eco Warriors Headless Simulation Harness
//!
//! Drives the game engine without a renderer, audio device or browser and
//! checks long-run behaviour: ecosystem trajectories, session gating,
//! restart persistence and player movement.
//!
//! Usage:
//!   cargo run -p ecowarriors-simtest
//!   cargo run -p ecowarriors-simtest -- --verbose
//!   cargo run -p ecowarriors-simtest -- --config game.json
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use ecowarriors_core::config::{GameConfig, SessionConfig, SimulationScope};
use ecowarriors_core::engine::GameEngine;
use ecowarriors_core::input::KeyCode;
use ecowarriors_core::performance::{PerformanceMonitor, QualityDirective};
use ecowarriors_core::persistence::{MemoryStorage, DEFAULT_RECORD_NAME};
use ecowarriors_core::physics::{Aabb, KinematicWorld};
use ecowarriors_core::store::{PersistentStore, PlayerPose};
use ecowarriors_core::ui::Intent;
use ecowarriors_logic::ecosystem::{tick_ecosystem, EcosystemId, EcosystemRates, EcosystemState};
use ecowarriors_logic::session::SessionMode;
use ecowarriors_logic::visuals::{active_alerts, EcoAlert};
use glam::Vec3;
use serde_json::json;
use tracing_subscriber::EnvFilter;

const DT: f32 = 1.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let base = match args.iter().position(|a| a == "--config") {
        Some(i) => match args.get(i + 1).map(GameConfig::from_file) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(2);
            }
            None => {
                eprintln!("--config needs a path");
                std::process::exit(2);
            }
        },
        None => GameConfig::default(),
    };
    // Headless runs cap the loading screen floor.
    let base = GameConfig {
        session: SessionConfig {
            min_loading_secs: base.session.min_loading_secs.min(0.5),
            ..base.session.clone()
        },
        ..base
    };

    println!("=== Eco Warriors Simulation Harness ===\n");
    tracing::info!(tick_interval = base.simulation.tick_interval, "harness starting");

    let mut results = Vec::new();

    // 1. Ecosystem trajectories
    results.extend(validate_trajectories(&base, verbose));

    // 2. Session gating of the simulator
    results.extend(validate_session_gating(&base, verbose));

    // 3. Restart persistence
    results.extend(validate_persistence(&base, verbose));

    // 4. Player movement
    results.extend(validate_movement(&base, verbose));

    // 5. Adaptive quality
    results.extend(validate_adaptive_quality(&base, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn headless_engine(config: &GameConfig) -> GameEngine {
    let mut config = config.clone();
    config.storage.save_dir = None;
    GameEngine::new(config)
}

fn run(engine: &mut GameEngine, seconds: f32) -> u32 {
    let frames = (seconds / DT).round() as usize;
    (0..frames).map(|_| engine.update(DT).ticks).sum()
}

fn start_playing(engine: &mut GameEngine) -> bool {
    engine.dispatch(Intent::StartGame);
    for _ in 0..600 {
        engine.update(DT);
        if engine.mode() == SessionMode::Playing {
            return true;
        }
    }
    false
}

// ── 1. Ecosystem Trajectories ───────────────────────────────────────────

fn validate_trajectories(config: &GameConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Ecosystem Trajectories ---");
    let mut results = Vec::new();
    let rates = config.simulation.rates();

    // An hour of ticks per biome
    let mut out_of_range = Vec::new();
    for id in EcosystemId::ALL {
        let mut state = id.initial_state();
        for tick in 0..3600 {
            state = tick_ecosystem(state, &rates);
            let ok = (0.0..=100.0).contains(&state.health())
                && (0.0..=100.0).contains(&state.pollution());
            if !ok {
                out_of_range.push(format!("{} at tick {}", id, tick));
                break;
            }
        }
        if verbose {
            println!(
                "  {:<8} after 1h: health {:6.2}, pollution {:6.2}, alerts {:?}",
                id.as_str(),
                state.health(),
                state.pollution(),
                active_alerts(&state)
            );
        }
    }
    results.push(check(
        "trajectory_bounds",
        out_of_range.is_empty(),
        if out_of_range.is_empty() {
            "all biomes stay within [0, 100] for 3600 ticks".to_string()
        } else {
            format!("out of range: {}", out_of_range.join(", "))
        },
    ));

    // Zero pollution is a fixed point of growth
    let clean = tick_ecosystem(EcosystemState::new(60.0, 0.0), &rates);
    results.push(check(
        "trajectory_zero_pollution_fixed",
        clean.pollution() == 0.0,
        format!("pollution after tick: {}", clean.pollution()),
    ));

    // Reference ticks at the shipped rates: heavy pollution
    let reference = EcosystemRates::default();
    let heavy = tick_ecosystem(EcosystemState::new(50.0, 60.0), &reference);
    let heavy_ok = (heavy.pollution() - 60.06).abs() < 1e-9 && (heavy.health() - 49.5).abs() < 1e-9;
    results.push(check(
        "trajectory_heavy_reference",
        heavy_ok,
        format!("health {:.4}, pollution {:.4}", heavy.health(), heavy.pollution()),
    ));

    // Reference tick: restoration band
    let light = tick_ecosystem(EcosystemState::new(90.0, 10.0), &reference);
    let light_ok = (light.pollution() - (10.0 + 0.1 * 0.1 - 0.05)).abs() < 1e-9
        && (light.health() - 90.05).abs() < 1e-9;
    results.push(check(
        "trajectory_restoration_reference",
        light_ok,
        format!("health {:.4}, pollution {:.4}", light.health(), light.pollution()),
    ));

    // Urban left alone eventually raises the critical alert
    let mut urban = EcosystemId::Urban.initial_state();
    let mut critical_at = None;
    for tick in 0..3600 {
        urban = tick_ecosystem(urban, &rates);
        if active_alerts(&urban).contains(&EcoAlert::Critical) {
            critical_at = Some(tick + 1);
            break;
        }
    }
    results.push(check(
        "trajectory_urban_goes_critical",
        critical_at.is_some(),
        match critical_at {
            Some(t) => format!("critical after {} ticks", t),
            None => "never critical".into(),
        },
    ));

    results
}

// ── 2. Session Gating ───────────────────────────────────────────────────

fn validate_session_gating(config: &GameConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Session Gating ---");
    let mut results = Vec::new();
    let mut engine = headless_engine(config);

    let menu_ticks = run(&mut engine, 5.0);
    results.push(check(
        "session_menu_idle",
        menu_ticks == 0 && engine.simulator().accumulated() == 0.0,
        format!("{} ticks in the menu", menu_ticks),
    ));

    let playing = start_playing(&mut engine);
    results.push(check(
        "session_loading_completes",
        playing,
        format!("mode after loading: {:?}", engine.mode()),
    ));
    if !playing {
        return results;
    }

    let ticks = run(&mut engine, 10.0);
    let interval = engine.simulator().interval() as f32;
    let expected = (10.0 / interval) as u32;
    results.push(check(
        "session_tick_cadence",
        ticks + 1 >= expected && ticks <= expected + 1,
        format!("{} ticks in 10 s at {} s interval", ticks, interval),
    ));

    // Align, accumulate 0.7 of an interval, pause for a long time.
    let acc = engine.simulator().accumulated();
    engine.update((engine.simulator().interval() - acc) as f32 + 1e-4);
    engine.update(0.7 * interval);
    let before = engine.simulator().tick_count();
    engine.dispatch(Intent::Pause);
    run(&mut engine, 30.0);
    let frozen = engine.simulator().tick_count() == before;
    engine.dispatch(Intent::Resume);
    let early = engine.update(0.25 * interval).ticks;
    let on_time = engine.update(0.06 * interval).ticks;
    results.push(check(
        "session_pause_keeps_remainder",
        frozen && early == 0 && on_time == 1,
        format!("frozen={}, ticks at 0.25={}, at 0.31={}", frozen, early, on_time),
    ));

    let scope = engine.simulator().scope();
    let ocean_before = engine.store().state().ecosystem(EcosystemId::Ocean);
    run(&mut engine, 5.0);
    let ocean_after = engine.store().state().ecosystem(EcosystemId::Ocean);
    let scope_ok = match scope {
        SimulationScope::Current => ocean_after == ocean_before,
        SimulationScope::All => ocean_after != ocean_before,
    };
    results.push(check(
        "session_scope_respected",
        scope_ok,
        format!("scope {:?}, ocean {:?} -> {:?}", scope, ocean_before, ocean_after),
    ));

    engine.shutdown();
    results
}

// ── 3. Restart Persistence ──────────────────────────────────────────────

fn validate_persistence(config: &GameConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Restart Persistence ---");
    let mut results = Vec::new();
    let storage = MemoryStorage::new();
    let mut config = config.clone();
    config.storage.save_dir = None;

    let before = {
        let store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
        let mut engine = GameEngine::with_store(config.clone(), store);
        if !start_playing(&mut engine) {
            results.push(check("persist_session", false, "never reached playing"));
            return results;
        }
        engine.dispatch(Intent::StartQuest("ocean-restoration-1".into()));
        engine.dispatch(Intent::CompleteQuest("ocean-restoration-1".into()));
        engine.dispatch(Intent::CleanPollution { amount: 12.5 });
        engine.dispatch(Intent::UpdateSetting {
            category: "audio".into(),
            key: "sfxVolume".into(),
            value: json!(0.4),
        });
        engine.key_down(KeyCode::KeyW);
        run(&mut engine, 2.0);
        engine.key_up(KeyCode::KeyW);
        run(&mut engine, 3.0);
        let snapshot = engine.store().state().clone();
        engine.shutdown();
        snapshot
    };

    let reloaded = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
    let after = reloaded.state();

    results.push(check(
        "persist_progress",
        after.progress == before.progress,
        format!(
            "level {} xp {} recipes {:?}",
            after.progress.level(),
            after.progress.experience(),
            after.progress.unlocked_recipes
        ),
    ));
    results.push(check(
        "persist_settings",
        after.settings == before.settings,
        format!("sfx volume {}", after.settings.audio.sfx_volume),
    ));

    let drifted: Vec<_> = EcosystemId::ALL
        .iter()
        .filter(|&&id| after.ecosystem(id) != before.ecosystem(id))
        .collect();
    results.push(check(
        "persist_ecosystems",
        drifted.is_empty(),
        format!("changed across restart: {:?}", drifted),
    ));

    results.push(check(
        "persist_transient_reset",
        after.pose == PlayerPose::default()
            && after.mode == SessionMode::Menu
            && before.pose != PlayerPose::default(),
        format!("pose {:?} (was {:?}), mode {:?}", after.pose.position, before.pose.position, after.mode),
    ));

    if verbose {
        if let Some(raw) = storage.get(DEFAULT_RECORD_NAME) {
            println!("  record: {} bytes", raw.len());
        }
    }

    results
}

// ── 4. Player Movement ──────────────────────────────────────────────────

fn validate_movement(config: &GameConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Player Movement ---");
    let mut results = Vec::new();

    // A crate one metre tall, two metres ahead of the forest entry point.
    let mut world = KinematicWorld::new(&config.physics);
    world.add_box(Aabb::from_center(Vec3::new(0.0, 0.5, -4.0), Vec3::new(1.0, 0.5, 1.0)));
    let mut engine = headless_engine(config).with_physics(Some(Box::new(world)));
    if !start_playing(&mut engine) {
        results.push(check("move_session", false, "never reached playing"));
        return results;
    }

    run(&mut engine, 3.0);
    let landed = engine.store().state().pose.position;
    let foot = config.physics.capsule_half_height + config.physics.capsule_radius;
    results.push(check(
        "move_falls_to_ground",
        engine.controller().is_grounded() && (landed.y - foot).abs() < 0.05,
        format!("rest height {:.3}, grounded {}", landed.y, engine.controller().is_grounded()),
    ));

    engine.key_down(KeyCode::Space);
    let mut peak = landed.y;
    for _ in 0..150 {
        engine.update(DT);
        peak = peak.max(engine.store().state().pose.position.y);
    }
    engine.key_up(KeyCode::Space);
    results.push(check(
        "move_jump_rises_and_lands",
        peak > landed.y + 0.5 && engine.controller().is_grounded(),
        format!("peak {:.2} from {:.2}", peak, landed.y),
    ));

    engine.key_down(KeyCode::KeyW);
    run(&mut engine, 2.0);
    engine.key_up(KeyCode::KeyW);
    let blocked = engine.store().state().pose.position;
    results.push(check(
        "move_blocked_by_crate",
        blocked.z > -3.0 - config.physics.capsule_radius - 0.05,
        format!("stopped at z {:.2}", blocked.z),
    ));

    // Step back clear of the crate, then run sideways.
    engine.key_down(KeyCode::KeyS);
    run(&mut engine, 0.5);
    engine.key_up(KeyCode::KeyS);
    engine.key_down(KeyCode::ShiftLeft);
    engine.key_down(KeyCode::KeyD);
    let start_x = engine.store().state().pose.position.x;
    run(&mut engine, 1.0);
    engine.key_up(KeyCode::KeyD);
    engine.key_up(KeyCode::ShiftLeft);
    let ran = engine.store().state().pose.position.x - start_x;
    results.push(check(
        "move_run_strafe",
        ran > config.player.walk_speed * 0.9,
        format!("ran {:.2} m right in 1 s", ran),
    ));

    if verbose {
        println!("  final pose: {:?}", engine.store().state().pose);
    }
    engine.shutdown();
    results
}

// ── 5. Adaptive Quality ─────────────────────────────────────────────────

fn validate_adaptive_quality(config: &GameConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Adaptive Quality ---");
    let mut results = Vec::new();
    let mut perf = config.performance.clone();
    perf.low_end = false;
    perf.adaptive_quality = true;
    let mut monitor = PerformanceMonitor::create(&perf);

    let mut directives = Vec::new();
    for _ in 0..(15 * 4) {
        if let Some(d) = monitor.record_frame(1.0 / 15.0) {
            directives.push(d);
        }
    }
    let expected = [
        QualityDirective::DisableParticles,
        QualityDirective::DisableShadows,
        QualityDirective::DisableAntialiasing,
    ];
    results.push(check(
        "quality_degrades_in_order",
        directives.len() >= 3 && directives[..3] == expected,
        format!("{:?}", directives),
    ));

    let mut engine = headless_engine(config);
    if start_playing(&mut engine) {
        engine.dispatch(Intent::UpdateSetting {
            category: "graphics".into(),
            key: "particles".into(),
            value: json!(false),
        });
        engine.update(DT);
        results.push(check(
            "quality_particles_setting",
            engine.particles().is_empty(),
            format!("{} particles with the setting off", engine.particles().len()),
        ));
    }

    results
}
