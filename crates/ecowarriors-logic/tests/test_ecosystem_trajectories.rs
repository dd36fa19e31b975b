//! Long-run behaviour of the ecosystem tick and the progression rules.
//!
//! Exercises: tick bounds over random inputs, steady states, the
//! pre-growth decay ordering and level/skill point bookkeeping.
//!
//! All tests are pure logic, no store and no frame loop.

use ecowarriors_logic::ecosystem::{
    initial_ecosystems, tick_ecosystem, EcosystemId, EcosystemRates, EcosystemState,
};
use ecowarriors_logic::progression::{level_for_experience, PlayerProgress};
use ecowarriors_logic::visuals::{active_alerts, derive_visuals, EcoAlert};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Helpers ────────────────────────────────────────────────────────────

fn run_ticks(mut state: EcosystemState, ticks: usize) -> EcosystemState {
    let rates = EcosystemRates::default();
    for _ in 0..ticks {
        state = tick_ecosystem(state, &rates);
    }
    state
}

// ── Tick bounds ────────────────────────────────────────────────────────

#[test]
fn tick_stays_in_range_for_random_inputs() {
    let mut rng = StdRng::seed_from_u64(42);
    let rates = EcosystemRates::default();
    for _ in 0..10_000 {
        let state = EcosystemState::new(rng.gen_range(0.0..=100.0), rng.gen_range(0.0..=100.0));
        let next = tick_ecosystem(state, &rates);
        assert!((0.0..=100.0).contains(&next.health()), "health {next:?}");
        assert!((0.0..=100.0).contains(&next.pollution()), "pollution {next:?}");
    }
}

#[test]
fn extreme_rates_still_clamp() {
    let rates = EcosystemRates {
        spread_rate: 1e6,
        restoration_rate: 1e6,
    };
    for (h, p) in [(0.0, 0.0), (100.0, 100.0), (0.0, 19.0), (100.0, 51.0)] {
        let next = tick_ecosystem(EcosystemState::new(h, p), &rates);
        assert!((0.0..=100.0).contains(&next.health()));
        assert!((0.0..=100.0).contains(&next.pollution()));
    }
}

// ── Trajectories ───────────────────────────────────────────────────────

#[test]
fn clean_ecosystem_stays_clean() {
    let end = run_ticks(EcosystemState::new(50.0, 0.0), 1200);
    assert_eq!(end.pollution(), 0.0, "zero pollution never grows back");
    assert_eq!(end.health(), 100.0, "restoration saturates health");
}

#[test]
fn heavy_pollution_runs_away() {
    let end = run_ticks(EcosystemId::Urban.initial_state(), 2000);
    assert!(end.pollution() > 55.0, "growth compounds: {end:?}");
    assert_eq!(end.health(), 0.0, "health bottoms out under heavy decay");
}

#[test]
fn decay_uses_pre_growth_pollution() {
    // 50.0 grows past the heavy threshold but decay still reads 50.0.
    let next = tick_ecosystem(EcosystemState::new(80.0, 50.0), &EcosystemRates::default());
    assert!(next.pollution() > 50.0);
    assert!((next.health() - 79.8).abs() < 1e-9, "light decay, got {}", next.health());
}

#[test]
fn initial_table_has_every_biome() {
    let table = initial_ecosystems();
    assert_eq!(table.len(), EcosystemId::ALL.len());
    assert_eq!(table[&EcosystemId::Mountain], EcosystemState::new(80.0, 20.0));
}

#[test]
fn alerts_track_trajectory() {
    let start = EcosystemState::new(40.0, 69.0);
    assert!(active_alerts(&start).is_empty());
    let later = run_ticks(start, 20);
    assert!(active_alerts(&later).contains(&EcoAlert::Critical), "{later:?}");
    let visuals = derive_visuals(EcosystemId::Ocean, &later, true);
    assert!(visuals.particle_count > 138);
}

// ── Progression ────────────────────────────────────────────────────────

#[test]
fn skill_points_match_levels_gained() {
    let mut progress = PlayerProgress::default();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        progress.add_experience(rng.gen_range(0..180));
    }
    assert_eq!(progress.level(), level_for_experience(progress.experience()));
    assert_eq!(progress.skill_points(), progress.level() - 1);
}
