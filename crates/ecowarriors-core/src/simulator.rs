//! Fixed-cadence ecosystem simulation.
//!
//! Frame time accumulates in a virtual timer; each whole interval fires one
//! tick and the remainder carries over. Pausing simply stops feeding the
//! timer, so the carry-over survives pause/resume untouched.

use ecowarriors_logic::ecosystem::{tick_ecosystem, EcosystemId, EcosystemRates};
use log::debug;

use crate::config::{SimulationConfig, SimulationScope};
use crate::store::PersistentStore;

/// Absorbs float drift so that e.g. 0.7 s + 0.3 s fires a 1.0 s tick.
pub const TICK_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct EcosystemSimulator {
    interval: f64,
    accumulator: f64,
    rates: EcosystemRates,
    scope: SimulationScope,
    ticks: u64,
}

impl Default for EcosystemSimulator {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl EcosystemSimulator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            interval: config.effective_interval(),
            accumulator: 0.0,
            rates: config.rates(),
            scope: config.scope,
            ticks: 0,
        }
    }

    /// Feed one frame of elapsed time and run any ticks that became due.
    /// Returns the number of ticks fired. Invalid `dt` is ignored.
    ///
    /// There is no cap: after a long stall (a backgrounded window, a
    /// debugger break) every due tick runs inside this call. Ticks only
    /// dirty the store, so the catch-up costs one record write when the
    /// caller flushes.
    pub fn advance(&mut self, dt: f64, current: EcosystemId, store: &mut PersistentStore) -> u32 {
        if !(dt.is_finite() && dt > 0.0) {
            return 0;
        }
        self.accumulator += dt;

        let due = ((self.accumulator + TICK_EPSILON) / self.interval).floor();
        if due > 1.0 {
            debug!("Catching up {} ticks after a {:.2}s frame", due, dt);
        }

        let mut fired = 0;
        while self.accumulator + TICK_EPSILON >= self.interval {
            self.accumulator -= self.interval;
            self.tick(current, store);
            fired += 1;
        }
        self.accumulator = self.accumulator.max(0.0);
        fired
    }

    /// Run one tick immediately, independent of the timer.
    pub fn tick(&mut self, current: EcosystemId, store: &mut PersistentStore) {
        self.ticks += 1;
        match self.scope {
            SimulationScope::Current => self.tick_one(current, store),
            SimulationScope::All => {
                for id in EcosystemId::ALL {
                    self.tick_one(id, store);
                }
            }
        }
    }

    fn tick_one(&self, id: EcosystemId, store: &mut PersistentStore) {
        let before = store.state().ecosystem(id);
        let after = tick_ecosystem(before, &self.rates);
        debug!(
            "Tick {} {}: health {:.3} -> {:.3}, pollution {:.3} -> {:.3}",
            self.ticks,
            id,
            before.health(),
            after.health(),
            before.pollution(),
            after.pollution()
        );
        store.set_ecosystem(id, after.health(), after.pollution());
    }

    /// Carry-over time not yet consumed by a tick.
    pub fn accumulated(&self) -> f64 {
        self.accumulator
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn scope(&self) -> SimulationScope {
        self.scope
    }

    /// Drop the carry-over (new session).
    pub fn reset_timer(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(store: &PersistentStore) -> (f64, f64) {
        let s = store.state().ecosystem(EcosystemId::Forest);
        (s.health(), s.pollution())
    }

    #[test]
    fn test_no_tick_before_interval() {
        let mut sim = EcosystemSimulator::default();
        let mut store = PersistentStore::new();
        assert_eq!(sim.advance(0.5, EcosystemId::Forest, &mut store), 0);
        assert_eq!(sim.advance(0.49, EcosystemId::Forest, &mut store), 0);
        assert_eq!(forest(&store), (75.0, 25.0));
    }

    #[test]
    fn test_split_frames_fire_on_time() {
        let mut sim = EcosystemSimulator::default();
        let mut store = PersistentStore::new();
        assert_eq!(sim.advance(0.7, EcosystemId::Forest, &mut store), 0);
        assert_eq!(sim.advance(0.3, EcosystemId::Forest, &mut store), 1, "0.7 + 0.3 fires");
        assert!(sim.accumulated() < 1e-6);
    }

    #[test]
    fn test_large_frame_fires_multiple_ticks() {
        let mut sim = EcosystemSimulator::default();
        let mut store = PersistentStore::new();
        assert_eq!(sim.advance(3.25, EcosystemId::Forest, &mut store), 3);
        assert!((sim.accumulated() - 0.25).abs() < 1e-9);
        assert_eq!(sim.tick_count(), 3);
    }

    #[test]
    fn test_long_stall_catches_up_with_one_write() {
        use crate::persistence::{MemoryStorage, DEFAULT_RECORD_NAME};

        let storage = MemoryStorage::new();
        let mut store = PersistentStore::open(Box::new(storage.clone()), DEFAULT_RECORD_NAME);
        let mut sim = EcosystemSimulator::default();
        assert_eq!(sim.advance(120.0, EcosystemId::Urban, &mut store), 120);
        assert_eq!(storage.writes(), 0, "ticks only dirty the store");
        assert!(store.flush());
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn test_frame_rate_independent() {
        let mut coarse = EcosystemSimulator::default();
        let mut fine = EcosystemSimulator::default();
        let mut a = PersistentStore::new();
        let mut b = PersistentStore::new();
        for _ in 0..10 {
            coarse.advance(1.0, EcosystemId::Forest, &mut a);
        }
        for _ in 0..600 {
            fine.advance(1.0 / 60.0, EcosystemId::Forest, &mut b);
        }
        assert_eq!(coarse.tick_count(), 10);
        assert_eq!(fine.tick_count(), 10);
        let (ha, pa) = forest(&a);
        let (hb, pb) = forest(&b);
        assert!((ha - hb).abs() < 1e-9 && (pa - pb).abs() < 1e-9);
    }

    #[test]
    fn test_current_scope_leaves_others_alone() {
        let mut sim = EcosystemSimulator::default();
        let mut store = PersistentStore::new();
        sim.advance(1.0, EcosystemId::Urban, &mut store);
        assert_eq!(forest(&store), (75.0, 25.0));
        let urban = store.state().ecosystem(EcosystemId::Urban);
        assert!((urban.pollution() - 55.055).abs() < 1e-9);
        assert!((urban.health() - 44.5).abs() < 1e-9);
    }

    #[test]
    fn test_all_scope_ticks_everything() {
        let config = SimulationConfig {
            scope: SimulationScope::All,
            ..SimulationConfig::default()
        };
        let mut sim = EcosystemSimulator::new(&config);
        let mut store = PersistentStore::new();
        sim.advance(1.0, EcosystemId::Forest, &mut store);
        for id in EcosystemId::ALL {
            assert_ne!(store.state().ecosystem(id), id.initial_state(), "{id} did not tick");
        }
    }

    #[test]
    fn test_invalid_dt_ignored() {
        let mut sim = EcosystemSimulator::default();
        let mut store = PersistentStore::new();
        assert_eq!(sim.advance(f64::NAN, EcosystemId::Forest, &mut store), 0);
        assert_eq!(sim.advance(-5.0, EcosystemId::Forest, &mut store), 0);
        assert_eq!(sim.advance(f64::INFINITY, EcosystemId::Forest, &mut store), 0);
        assert_eq!(sim.accumulated(), 0.0);
    }
}
