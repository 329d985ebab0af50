use core::fmt;
use core::ops::{Add, AddAssign, Deref, Sub};
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Identifies one fixed-step simulation advance.
///
/// Ticks only move forward during a session, so they are compared with plain integer ordering.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Tick(pub u32);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick right after this one
    pub fn next(self) -> Tick {
        Tick(self.0.saturating_add(1))
    }

    /// Number of ticks elapsed since `earlier`, or 0 if `earlier` is more recent
    pub fn since(self, earlier: Tick) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tick({})", self.0)
    }
}

impl From<u32> for Tick {
    fn from(value: u32) -> Self {
        Tick(value)
    }
}

impl Add<u32> for Tick {
    type Output = Tick;

    fn add(self, rhs: u32) -> Self::Output {
        Tick(self.0.saturating_add(rhs))
    }
}

impl AddAssign<u32> for Tick {
    fn add_assign(&mut self, rhs: u32) {
        *self = *self + rhs;
    }
}

impl Sub<u32> for Tick {
    type Output = Tick;

    fn sub(self, rhs: u32) -> Self::Output {
        Tick(self.0.saturating_sub(rhs))
    }
}

/// Signed difference between two ticks
impl Sub<Tick> for Tick {
    type Output = i64;

    fn sub(self, rhs: Tick) -> Self::Output {
        i64::from(self.0) - i64::from(rhs.0)
    }
}

/// Duration of one simulation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickDuration(pub Duration);

impl TickDuration {
    pub fn from_hz(hz: u32) -> Self {
        TickDuration(Duration::from_secs(1) / hz.max(1))
    }

    /// Number of whole ticks that fit in `duration`, at least 1
    pub fn ticks_in(&self, duration: Duration) -> u32 {
        if self.0.is_zero() {
            return 1;
        }
        let ticks = duration.as_nanos() / self.0.as_nanos();
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for TickDuration {
    fn default() -> Self {
        TickDuration(Duration::from_millis(20))
    }
}

impl Deref for TickDuration {
    type Target = Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
