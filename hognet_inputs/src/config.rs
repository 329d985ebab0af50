use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum number of ticks kept in an input history buffer.
    ///
    /// The default covers 2 seconds at 50Hz.
    pub capacity: usize,
    /// Inputs further than this many ticks ahead of the receiver's tick are rejected
    pub max_future_ticks: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            max_future_ticks: 120,
        }
    }
}
