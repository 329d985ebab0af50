//! Tick-driven timers.
//!
//! Periodic and delayed behaviours (broadcast cadence, collision cooldowns, jump cooldown) are
//! expressed as counters that the owner advances once per tick.
use serde::{Deserialize, Serialize};

/// Repeating timer that fires every `period` ticks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTimer {
    period: u32,
    elapsed: u32,
}

impl TickTimer {
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            elapsed: 0,
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Advance by one tick. Returns true if the timer fired on this tick
    pub fn tick(&mut self) -> bool {
        self.elapsed += 1;
        if self.elapsed >= self.period {
            self.elapsed = 0;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.elapsed = 0;
    }
}

/// One-shot cooldown measured in ticks
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cooldown {
    remaining: u32,
}

impl Cooldown {
    pub fn start(&mut self, ticks: u32) {
        self.remaining = ticks;
    }

    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
    }
}
