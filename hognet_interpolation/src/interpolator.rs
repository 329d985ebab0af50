use core::time::Duration;
use hognet_core::prelude::{BodyState, StateSnapshot, Tick};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Where the next interpolation window starts when a new snapshot arrives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartPolicy {
    /// Start from the previous target, even if the blend had not reached it yet
    #[default]
    PreviousTarget,
    /// Start from whatever is rendered at the moment the snapshot arrives
    CurrentRender,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Duration of one blend from start to target. Should roughly match the broadcast interval
    pub window: Duration,
    pub restart: RestartPolicy,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(100),
            restart: RestartPolicy::PreviousTarget,
        }
    }
}

/// The rendered state of an observed entity, along with the blend parameters that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedState {
    pub body: BodyState,
    /// Tick of the snapshot we are blending towards
    pub target_tick: Tick,
    /// Blend fraction in `[0, 1]`
    pub fraction: f32,
}

/// Observer-side view of one remote entity.
///
/// Invariant: `end` is always the most recently *received* snapshot, regardless of its tick.
#[derive(Debug, Clone, Default)]
pub struct RemoteInterpolator {
    config: InterpolationConfig,
    start: Option<BodyState>,
    end: Option<StateSnapshot>,
    elapsed: Duration,
}

impl RemoteInterpolator {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn target(&self) -> Option<&StateSnapshot> {
        self.end.as_ref()
    }

    /// Receive a new snapshot, which becomes the new interpolation target
    pub fn push(&mut self, snapshot: StateSnapshot) {
        let start = match (self.config.restart, self.end.as_ref()) {
            (_, None) => snapshot.body,
            (RestartPolicy::PreviousTarget, Some(previous)) => previous.body,
            (RestartPolicy::CurrentRender, Some(previous)) => {
                self.current().unwrap_or(previous.body)
            }
        };
        trace!(entity = ?snapshot.entity, tick = ?snapshot.tick, "new interpolation target");
        self.start = Some(start);
        self.end = Some(snapshot);
        self.elapsed = Duration::ZERO;
    }

    /// Advance the blend by one frame
    pub fn advance(&mut self, delta: Duration) {
        // saturate at the window so that the accumulator does not grow while holding
        self.elapsed = (self.elapsed + delta).min(self.config.window);
    }

    fn fraction(&self) -> f32 {
        if self.config.window.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.config.window.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn status(&self) -> Option<InterpolatedState> {
        let (start, end) = (self.start.as_ref()?, self.end.as_ref()?);
        let t = self.fraction();
        Some(InterpolatedState {
            body: blend(start, &end.body, t),
            target_tick: end.tick,
            fraction: t,
        })
    }

    /// State to render right now, or `None` before the first snapshot
    pub fn current(&self) -> Option<BodyState> {
        self.status().map(|status| status.body)
    }

    /// Jump straight to `snapshot`, with no blend (used on respawn)
    pub fn reset(&mut self, snapshot: StateSnapshot) {
        self.start = Some(snapshot.body);
        self.end = Some(snapshot);
        self.elapsed = self.config.window;
    }
}

/// Linear blend for positions and velocities, spherical for orientation.
///
/// Returns `end` exactly once `t` reaches 1.
fn blend(start: &BodyState, end: &BodyState, t: f32) -> BodyState {
    if t >= 1.0 {
        return *end;
    }
    BodyState {
        position: start.position.lerp(end.position, t),
        orientation: start.orientation.slerp(end.orientation, t),
        linear_velocity: start.linear_velocity.lerp(end.linear_velocity, t),
        angular_velocity: start.angular_velocity.lerp(end.angular_velocity, t),
        steering_angle: start.steering_angle + (end.steering_angle - start.steering_angle) * t,
        motor_torque: start.motor_torque + (end.motor_torque - start.motor_torque) * t,
        jump_cooldown: end.jump_cooldown,
    }
}
