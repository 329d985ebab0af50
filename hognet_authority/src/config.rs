use hognet_inputs::prelude::InputConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Number of simulation ticks between two snapshot broadcasts
    pub broadcast_interval_ticks: u32,
    /// Configuration of the per-entity buffer of received inputs
    pub input: InputConfig,
    pub collision: CollisionConfig,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            // ~16Hz at a 50Hz simulation rate
            broadcast_interval_ticks: 3,
            input: InputConfig::default(),
            collision: CollisionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Repeat contacts between the same pair within this many ticks are ignored
    pub cooldown_ticks: u32,
    /// Used to synthesize an impulse from the closing speed
    pub restitution: f32,
    /// Multiplier applied to every collision impulse
    pub impulse_scale: f32,
    /// Closing speed (m/s) at or below which the impulse follows the contact normal
    pub ram_speed_low: f32,
    /// Closing speed (m/s) at or above which the heading blend is at its maximum
    pub ram_speed_high: f32,
    /// Weight of the rammer's heading in the impulse direction, in `[0, 1]`
    pub max_heading_blend: f32,
    /// How long a hit is attributed to the rammer
    pub attribution_ticks: u32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            cooldown_ticks: 25,
            restitution: 0.3,
            impulse_scale: 1.0,
            ram_speed_low: 5.0,
            ram_speed_high: 20.0,
            max_heading_blend: 0.7,
            attribution_ticks: 250,
        }
    }
}
