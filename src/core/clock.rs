//! Animation clock - fixed-cadence frame advance for animated layers.
//!
//! # Timing Model
//!
//! Self-rearming tick at `tick_rate` ticks/second (default 60). `update()` is
//! polled by the host loop with the current instant; when at least one tick
//! interval has elapsed the tick fires and the clock re-arms from `now`.
//! No drift correction: a late poll just produces a late tick, and missed
//! ticks are never replayed.
//!
//! While paused, ticks still fire and re-arm but do no work.
//! `step()` performs exactly one advance regardless of playback.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::entities::error::Result;
use crate::entities::scene::Scene;

pub const DEFAULT_TICK_RATE: f32 = 60.0;

#[derive(Debug, Clone)]
pub struct AnimationClock {
    tick_rate: f32,
    playing: bool,
    last_tick: Option<Instant>,
    /// Ticks that did work (advance steps), manual steps included
    ticks: u64,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl AnimationClock {
    /// Rates without a usable tick interval fall back to the default.
    pub fn new(tick_rate: f32) -> Self {
        let tick_rate = if rate_interval(tick_rate).is_some() {
            tick_rate
        } else {
            warn!("Tick rate {} unusable, using {}", tick_rate, DEFAULT_TICK_RATE);
            DEFAULT_TICK_RATE
        };
        Self {
            tick_rate,
            playing: false,
            last_tick: None,
            ticks: 0,
        }
    }

    pub fn tick_rate(&self) -> f32 {
        self.tick_rate
    }

    pub fn interval(&self) -> Duration {
        rate_interval(self.tick_rate).unwrap_or(Duration::from_millis(16))
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            debug!("Animation playback {}", if playing { "on" } else { "off" });
        }
        self.playing = playing;
    }

    pub fn toggle(&mut self) -> bool {
        self.set_playing(!self.playing);
        self.playing
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Poll the clock.
    ///
    /// Returns `Some(advanced)` when a tick fired while playing (the caller
    /// must recomposite), None otherwise.
    pub fn update(&mut self, now: Instant, scene: &mut Scene) -> Result<Option<usize>> {
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return Ok(None);
        };
        if now.saturating_duration_since(last) < self.interval() {
            return Ok(None);
        }
        self.last_tick = Some(now);
        if !self.playing {
            return Ok(None);
        }
        self.step(scene).map(Some)
    }

    /// One manual advance, playback state ignored.
    pub fn step(&mut self, scene: &mut Scene) -> Result<usize> {
        let advanced = scene.advance_frames()?;
        self.ticks += 1;
        trace!("tick {}: {} layers advanced", self.ticks, advanced);
        Ok(advanced)
    }

    /// Forget the last tick; the next `update()` only arms.
    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}

fn rate_interval(tick_rate: f32) -> Option<Duration> {
    if !tick_rate.is_finite() || tick_rate <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f32(1.0 / tick_rate).ok().filter(|d| !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::attrs::AttrValue;
    use crate::entities::keys::A_FRAME_NO;
    use crate::entities::layer::Layer;

    fn scene() -> Scene {
        let mut s = Scene::new(vec![Layer::surface(4, 4), Layer::image("a", "a.png", 4, 4)], None);
        s.edit_field(1, A_FRAME_NO, AttrValue::Int(1)).unwrap();
        s
    }

    #[test]
    fn test_paused_ticks_do_nothing() {
        let mut clock = AnimationClock::new(4.0);
        let mut s = scene();
        let t0 = Instant::now();
        assert_eq!(clock.update(t0, &mut s).unwrap(), None);
        assert_eq!(clock.update(t0 + Duration::from_millis(600), &mut s).unwrap(), None);
        assert_eq!(s.layers()[1].frame_no(), 1);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_playing_cadence() {
        // 4 Hz: 250ms interval, exact in f32
        let mut clock = AnimationClock::new(4.0);
        clock.set_playing(true);
        let mut s = scene();
        let t0 = Instant::now();
        let at = |ms: u64| t0 + Duration::from_millis(ms);
        clock.update(t0, &mut s).unwrap();
        assert_eq!(clock.update(at(125), &mut s).unwrap(), None);
        assert_eq!(clock.update(at(300), &mut s).unwrap(), Some(1));
        // Re-armed from the late poll at 300, not from 250
        assert_eq!(clock.update(at(500), &mut s).unwrap(), None);
        assert_eq!(clock.update(at(550), &mut s).unwrap(), Some(1));
        assert_eq!(s.layers()[1].frame_no(), 3);
    }

    #[test]
    fn test_step_ignores_playback() {
        let mut clock = AnimationClock::default();
        let mut s = scene();
        assert!(!clock.is_playing());
        assert_eq!(clock.step(&mut s).unwrap(), 1);
        assert_eq!(s.layers()[1].frame_no(), 2);
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn test_bad_rate_falls_back() {
        assert_eq!(AnimationClock::new(0.0).tick_rate(), DEFAULT_TICK_RATE);
        assert!(AnimationClock::new(-5.0).toggle());
    }

    #[test]
    fn test_tiny_or_nan_rate_falls_back() {
        for rate in [1e-25, f32::NAN, f32::INFINITY, f32::MIN_POSITIVE] {
            let clock = AnimationClock::new(rate);
            assert_eq!(clock.tick_rate(), DEFAULT_TICK_RATE, "rate {}", rate);
            assert!(clock.interval() > Duration::ZERO);
        }
        // Slow but representable rates are kept
        assert_eq!(AnimationClock::new(0.5).interval(), Duration::from_secs(2));
    }
}
