use core::time::Duration;
use hognet_authority::prelude::AuthorityConfig;
use hognet_core::prelude::QuantizeConfig;
use hognet_inputs::prelude::InputConfig;
use hognet_interpolation::prelude::InterpolationConfig;
use hognet_prediction::prelude::ReconcileConfig;
use serde::{Deserialize, Serialize};

/// Every tunable of a participant.
///
/// All participants of a session must agree on `tick_duration` and `quantize`, otherwise
/// predictions never match the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Duration of one simulation step
    pub tick_duration: Duration,
    pub quantize: QuantizeConfig,
    pub input: InputConfig,
    pub reconcile: ReconcileConfig,
    pub interpolation: InterpolationConfig,
    /// Only used by the participant hosting the authority
    pub authority: AuthorityConfig,
    /// Ticks without any snapshot after which the authority is reported unreachable
    pub authority_timeout_ticks: u32,
    /// Lateral speed (m/s) above which a vehicle counts as drifting
    pub drift_threshold: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_duration: Duration::from_millis(20),
            quantize: QuantizeConfig::default(),
            input: InputConfig::default(),
            reconcile: ReconcileConfig::default(),
            interpolation: InterpolationConfig::default(),
            authority: AuthorityConfig::default(),
            // 3 seconds at 50Hz
            authority_timeout_ticks: 150,
            drift_threshold: 0.4,
        }
    }
}
