use crate::id::EntityId;
use crate::tick::Tick;
use crate::timer::Cooldown;
use bevy_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Physical state of one vehicle body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Current front wheel angle, in degrees
    pub steering_angle: f32,
    pub motor_torque: f32,
    /// Ticks left before the body can jump again.
    ///
    /// Part of the state so that a correction rewinds it along with the pose.
    pub jump_cooldown: Cooldown,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            steering_angle: 0.0,
            motor_torque: 0.0,
            jump_cooldown: Cooldown::default(),
        }
    }
}

impl BodyState {
    /// Body at rest at the given pose
    pub fn at_pose(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            ..Default::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    /// Velocity along the body's right axis
    pub fn lateral_speed(&self) -> f32 {
        self.linear_velocity.dot(self.right())
    }

    pub fn position_error(&self, other: &BodyState) -> f32 {
        self.position.distance(other.position)
    }

    /// Angle between the two orientations, in degrees
    pub fn rotation_error_degrees(&self, other: &BodyState) -> f32 {
        self.orientation.angle_between(other.orientation).to_degrees()
    }
}

/// Complete physical state of one entity at one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub entity: EntityId,
    pub tick: Tick,
    pub body: BodyState,
}

impl StateSnapshot {
    pub fn new(entity: EntityId, tick: Tick, body: BodyState) -> Self {
        Self { entity, tick, body }
    }

    pub fn lateral_speed(&self) -> f32 {
        self.body.lateral_speed()
    }

    /// True when the body slides sideways faster than `threshold` m/s
    pub fn is_drifting(&self, threshold: f32) -> bool {
        self.lateral_speed().abs() > threshold
    }
}
