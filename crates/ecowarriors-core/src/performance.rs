//! Frame-rate monitoring and adaptive quality.
//!
//! Frames are counted over a sample window. At the end of each window a
//! capable device running below `low_fps` drops one feature (particles,
//! then shadows, then antialiasing); a low-end device running above
//! `high_fps` restores one in the reverse order. The resulting toggles are
//! runtime overrides and never written to the player's settings.

use ecowarriors_logic::settings::GraphicsSettings;
use log::{info, warn};

use crate::config::PerformanceConfig;

/// Frame rate below which a warning is logged.
const LOW_FPS_WARNING: f32 = 30.0;

/// One quality adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityDirective {
    DisableParticles,
    DisableShadows,
    DisableAntialiasing,
    EnableAntialiasing,
    EnableShadows,
    EnableParticles,
}

/// Features the monitor currently allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityToggles {
    pub particles: bool,
    pub shadows: bool,
    pub antialiasing: bool,
}

impl QualityToggles {
    fn all(enabled: bool) -> Self {
        Self {
            particles: enabled,
            shadows: enabled,
            antialiasing: enabled,
        }
    }

    fn reduce(&mut self) -> Option<QualityDirective> {
        if self.particles {
            self.particles = false;
            Some(QualityDirective::DisableParticles)
        } else if self.shadows {
            self.shadows = false;
            Some(QualityDirective::DisableShadows)
        } else if self.antialiasing {
            self.antialiasing = false;
            Some(QualityDirective::DisableAntialiasing)
        } else {
            None
        }
    }

    fn increase(&mut self) -> Option<QualityDirective> {
        if !self.antialiasing {
            self.antialiasing = true;
            Some(QualityDirective::EnableAntialiasing)
        } else if !self.shadows {
            self.shadows = true;
            Some(QualityDirective::EnableShadows)
        } else if !self.particles {
            self.particles = true;
            Some(QualityDirective::EnableParticles)
        } else {
            None
        }
    }

    /// Combine with the player's own toggles; both must allow a feature.
    pub fn effective(&self, graphics: &GraphicsSettings) -> QualityToggles {
        QualityToggles {
            particles: self.particles && graphics.particles,
            shadows: self.shadows && graphics.shadows,
            antialiasing: self.antialiasing && graphics.antialiasing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    config: PerformanceConfig,
    quality: QualityToggles,
    frames: u32,
    window: f32,
    fps: f32,
    running: bool,
}

impl PerformanceMonitor {
    /// Start monitoring. Low-end devices start with every feature off.
    pub fn create(config: &PerformanceConfig) -> Self {
        info!(
            "Device performance level: {}",
            if config.low_end { "low" } else { "high" }
        );
        Self {
            config: config.clone(),
            quality: QualityToggles::all(!config.low_end),
            frames: 0,
            window: 0.0,
            fps: 0.0,
            running: true,
        }
    }

    pub fn quality(&self) -> QualityToggles {
        self.quality
    }

    /// Frame rate measured over the last completed window.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn set_adaptive(&mut self, enabled: bool) {
        self.config.adaptive_quality = enabled;
    }

    /// Count one frame. Returns a directive when a window closes and the
    /// quality was adjusted.
    pub fn record_frame(&mut self, dt: f32) -> Option<QualityDirective> {
        if !self.running || !(dt.is_finite() && dt > 0.0) {
            return None;
        }
        self.frames += 1;
        self.window += dt;
        if self.window < self.config.sample_secs.max(f32::EPSILON) {
            return None;
        }

        self.fps = self.frames as f32 / self.window;
        self.frames = 0;
        self.window = 0.0;

        if self.fps < LOW_FPS_WARNING {
            warn!("Low FPS detected: {:.1}", self.fps);
        }
        if !self.config.adaptive_quality {
            return None;
        }

        let directive = if self.fps < self.config.low_fps && !self.config.low_end {
            self.quality.reduce()
        } else if self.fps > self.config.high_fps && self.config.low_end {
            self.quality.increase()
        } else {
            None
        };
        if let Some(d) = directive {
            info!("Quality adjusted at {:.1} fps: {:?}", self.fps, d);
        }
        directive
    }

    /// Stop counting frames.
    pub fn shutdown(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_window(monitor: &mut PerformanceMonitor, fps: u32) -> Option<QualityDirective> {
        let dt = 1.0 / fps as f32;
        let mut last = None;
        for _ in 0..fps {
            if let Some(d) = monitor.record_frame(dt) {
                last = Some(d);
            }
        }
        // Float sums may land just short of the window.
        last.or_else(|| monitor.record_frame(dt))
    }

    #[test]
    fn test_slow_capable_device_reduces_in_order() {
        let mut monitor = PerformanceMonitor::create(&PerformanceConfig::default());
        assert_eq!(run_window(&mut monitor, 20), Some(QualityDirective::DisableParticles));
        assert_eq!(run_window(&mut monitor, 20), Some(QualityDirective::DisableShadows));
        assert_eq!(run_window(&mut monitor, 20), Some(QualityDirective::DisableAntialiasing));
        assert_eq!(run_window(&mut monitor, 20), None, "nothing left to drop");
        assert!((monitor.fps() - 20.0).abs() < 2.0);
    }

    #[test]
    fn test_fast_low_end_device_increases_in_reverse() {
        let config = PerformanceConfig {
            low_end: true,
            ..PerformanceConfig::default()
        };
        let mut monitor = PerformanceMonitor::create(&config);
        assert!(!monitor.quality().particles);
        assert_eq!(run_window(&mut monitor, 60), Some(QualityDirective::EnableAntialiasing));
        assert_eq!(run_window(&mut monitor, 60), Some(QualityDirective::EnableShadows));
        assert_eq!(run_window(&mut monitor, 60), Some(QualityDirective::EnableParticles));
    }

    #[test]
    fn test_steady_frame_rate_no_change() {
        let mut monitor = PerformanceMonitor::create(&PerformanceConfig::default());
        assert_eq!(run_window(&mut monitor, 60), None);
        assert_eq!(monitor.quality(), QualityToggles::all(true));
    }

    #[test]
    fn test_adaptive_off_and_shutdown() {
        let mut monitor = PerformanceMonitor::create(&PerformanceConfig::default());
        monitor.set_adaptive(false);
        assert_eq!(run_window(&mut monitor, 10), None);
        monitor.set_adaptive(true);
        monitor.shutdown();
        assert_eq!(run_window(&mut monitor, 10), None);
    }

    #[test]
    fn test_effective_respects_player_choice() {
        let mut graphics = GraphicsSettings::default();
        graphics.shadows = false;
        let effective = QualityToggles::all(true).effective(&graphics);
        assert!(effective.particles);
        assert!(!effective.shadows);
    }
}
