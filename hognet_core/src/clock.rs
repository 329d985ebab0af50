//! Fixed-rate logical clock.
//!
//! The clock accumulates real elapsed time and converts it into whole simulation ticks.
//! Leftover time stays in the accumulator for the next frame, so a participant running at a
//! variable frame rate still advances at exactly one tick per `tick_duration` on average.
use crate::tick::{Tick, TickDuration};
use core::time::Duration;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct TickClock {
    tick_duration: TickDuration,
    accumulator: Duration,
    tick: Tick,
}

impl TickClock {
    pub fn new(tick_duration: TickDuration) -> Self {
        Self {
            tick_duration,
            accumulator: Duration::ZERO,
            tick: Tick::ZERO,
        }
    }

    /// Current logical tick: the last tick that was fired
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn tick_duration(&self) -> TickDuration {
        self.tick_duration
    }

    /// Fraction of the next tick that has already elapsed, in `[0, 1)`
    pub fn overstep_fraction(&self) -> f32 {
        if self.tick_duration.is_zero() {
            return 0.0;
        }
        self.accumulator.as_secs_f32() / self.tick_duration.as_secs_f32()
    }

    /// Add real elapsed time to the accumulator without firing any tick
    pub fn accumulate(&mut self, elapsed: Duration) {
        self.accumulator += elapsed;
    }

    /// Consume one tick worth of accumulated time, if available, and return the new tick
    pub fn next_tick(&mut self) -> Option<Tick> {
        if self.tick_duration.is_zero() || self.accumulator < *self.tick_duration {
            return None;
        }
        self.accumulator -= *self.tick_duration;
        self.tick = self.tick.next();
        trace!(tick = ?self.tick, "tick");
        Some(self.tick)
    }

    /// Accumulate `elapsed` and call `on_tick` once for every whole tick that elapsed
    pub fn advance(&mut self, elapsed: Duration, mut on_tick: impl FnMut(Tick)) -> u32 {
        self.accumulate(elapsed);
        let mut fired = 0;
        while let Some(tick) = self.next_tick() {
            on_tick(tick);
            fired += 1;
        }
        fired
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(TickDuration::default())
    }
}
