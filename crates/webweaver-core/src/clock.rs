//! Frame timing and the render-only wind oscillator.

use serde::{Deserialize, Serialize};

use crate::Position;

/// Nominal frame interval in milliseconds (60 Hz).
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;
/// Largest delta, in nominal frames, applied by a single tick.
pub const MAX_FRAME_DELTA: f32 = 3.0;
/// Wind phase advanced per nominal frame.
pub const WIND_PHASE_RATE: f32 = 0.02;

/// High level simulation clock (frames processed since the state was created).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Converts host timestamps into clamped frame deltas.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationClock {
    last_timestamp: Option<f64>,
    elapsed: f64,
    tick: Tick,
}

impl SimulationClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta in nominal frames since the previous timestamp, clamped to
    /// `[0, MAX_FRAME_DELTA]`. The first timestamp after creation or
    /// [`suspend`](Self::suspend) counts as exactly one frame.
    pub fn delta_for(&mut self, timestamp_ms: f64) -> f32 {
        if !timestamp_ms.is_finite() {
            return 0.0;
        }
        let delta = match self.last_timestamp {
            None => 1.0,
            Some(last) => ((timestamp_ms - last) / FRAME_INTERVAL_MS) as f32,
        };
        if self.last_timestamp.is_none_or(|last| timestamp_ms > last) {
            self.last_timestamp = Some(timestamp_ms);
        }
        if delta.is_nan() {
            0.0
        } else {
            delta.clamp(0.0, MAX_FRAME_DELTA)
        }
    }

    /// Adds `delta` frames of simulated time and bumps the tick counter.
    pub fn advance(&mut self, delta: f32) -> Tick {
        self.elapsed += f64::from(delta.max(0.0));
        self.tick = self.tick.next();
        self.tick
    }

    /// Forget the last timestamp so the next tick does not see the pause.
    pub fn suspend(&mut self) {
        self.last_timestamp = None;
    }

    /// Simulated time in nominal frames.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Restart the clock from zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Ambient wind built from two out-of-phase sinusoids.
///
/// Wind only displaces threads when drawing; topology and spiders never see it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Wind {
    phase: f32,
}

impl Wind {
    /// Advance the oscillator by `delta` nominal frames.
    pub fn advance(&mut self, delta: f32) {
        if delta.is_finite() && delta > 0.0 {
            self.phase = (self.phase + WIND_PHASE_RATE * delta) % (std::f32::consts::TAU * 50.0);
        }
    }

    #[must_use]
    pub const fn phase(&self) -> f32 {
        self.phase
    }

    /// Peak displacement at the middle of a thread.
    #[must_use]
    pub fn gust(&self) -> Position {
        let phase = self.phase;
        Position::new(
            phase.sin() * 2.0 + (phase * 0.6 + 1.3).sin() * 1.2,
            (phase * 0.8).cos() * 0.6,
        )
    }

    /// Render-time offset for a point at parameter `t` along a thread; zero at both ends.
    #[must_use]
    pub fn sway(&self, t: f32) -> Position {
        let t = t.clamp(0.0, 1.0);
        let weight = 4.0 * t * (1.0 - t);
        let gust = self.gust();
        Position::new(gust.x * weight, gust.y * weight)
    }

    /// `point` displaced by the sway at `t`.
    #[must_use]
    pub fn apply(&self, point: Position, t: f32) -> Position {
        let offset = self.sway(t);
        Position::new(point.x + offset.x, point.y + offset.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_counts_as_one_frame() {
        let mut clock = SimulationClock::new();
        assert_eq!(clock.delta_for(12_345.0), 1.0);
        let delta = clock.delta_for(12_345.0 + FRAME_INTERVAL_MS);
        assert!((delta - 1.0).abs() < 1e-4);
    }

    #[test]
    fn long_pauses_are_clamped() {
        let mut clock = SimulationClock::new();
        clock.delta_for(0.0);
        assert_eq!(clock.delta_for(60_000.0), MAX_FRAME_DELTA);
        clock.suspend();
        assert_eq!(clock.delta_for(120_000.0), 1.0);
    }

    #[test]
    fn backwards_timestamps_do_not_advance() {
        let mut clock = SimulationClock::new();
        clock.delta_for(1_000.0);
        assert_eq!(clock.delta_for(900.0), 0.0);
        assert_eq!(clock.delta_for(f64::NAN), 0.0);
        let delta = clock.delta_for(1_000.0 + 2.0 * FRAME_INTERVAL_MS);
        assert!((delta - 2.0).abs() < 1e-4);
    }

    #[test]
    fn advance_accumulates_time() {
        let mut clock = SimulationClock::new();
        clock.advance(1.5);
        let tick = clock.advance(0.5);
        assert_eq!(tick, Tick(2));
        assert!((clock.elapsed() - 2.0).abs() < 1e-9);
        clock.reset();
        assert_eq!(clock.tick(), Tick::zero());
    }

    #[test]
    fn sway_vanishes_at_thread_ends() {
        let mut wind = Wind::default();
        wind.advance(37.0);
        assert_eq!(wind.sway(0.0), Position::new(0.0, 0.0));
        assert_eq!(wind.sway(1.0), Position::new(0.0, 0.0));
        assert_eq!(wind.sway(0.5), wind.gust());
        let p = Position::new(10.0, 10.0);
        assert_eq!(wind.apply(p, 0.0), p);
    }
}
