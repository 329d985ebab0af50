//! Boundary validation.
//!
//! Every inbound message is checked before it is allowed anywhere near an input buffer or the
//! simulation. A message that fails validation is discarded as a whole.
use crate::error::ValidationError;
use crate::message::{Message, SnapshotMessage, SpawnMessage};
use bevy_math::{Quat, Vec3};
use hognet_core::prelude::*;

/// What the receiver knows when validating a message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationContext {
    /// Receiver's current tick
    pub current_tick: Tick,
    /// How far ahead of `current_tick` a message tick may be
    pub max_future_ticks: u32,
}

impl ValidationContext {
    fn check_tick(&self, tick: Tick) -> Result<(), ValidationError> {
        if tick > self.current_tick + self.max_future_ticks {
            return Err(ValidationError::FutureTick {
                tick,
                current: self.current_tick,
            });
        }
        Ok(())
    }
}

pub trait Validate {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError>;
}

fn finite(field: &'static str, value: f32) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ValidationError> {
    finite(field, value)?;
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange { field, value });
    }
    Ok(())
}

fn finite_vec3(field: &'static str, value: Vec3) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

fn rotation(value: Quat) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: "orientation",
        });
    }
    if value.length_squared() < 0.5 {
        return Err(ValidationError::DegenerateOrientation);
    }
    Ok(())
}

impl Validate for InputSample {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError> {
        in_range("throttle", self.throttle, -1.0, 1.0)?;
        in_range("brake", self.brake, 0.0, 1.0)?;
        in_range("steer", self.steer, -1.0, 1.0)?;
        ctx.check_tick(self.tick)
    }
}

impl Validate for StateSnapshot {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError> {
        let body = &self.body;
        finite_vec3("position", body.position)?;
        rotation(body.orientation)?;
        finite_vec3("linear_velocity", body.linear_velocity)?;
        finite_vec3("angular_velocity", body.angular_velocity)?;
        finite("steering_angle", body.steering_angle)?;
        finite("motor_torque", body.motor_torque)?;
        ctx.check_tick(self.tick)
    }
}

impl Validate for SnapshotMessage {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError> {
        self.snapshot.validate(ctx)?;
        if let Some(ack) = self.ack {
            ctx.check_tick(ack)?;
        }
        Ok(())
    }
}

impl Validate for SpawnMessage {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError> {
        self.snapshot.validate(ctx)
    }
}

impl Validate for Message {
    fn validate(&self, ctx: &ValidationContext) -> Result<(), ValidationError> {
        match self {
            Message::Input(sample) => sample.validate(ctx),
            Message::Snapshot(message) | Message::CollisionPriority(message) => {
                message.validate(ctx)
            }
            Message::Spawn(spawn) => spawn.validate(ctx),
            Message::Despawn(_) => Ok(()),
            Message::Respawn(snapshot) => snapshot.validate(ctx),
        }
    }
}
