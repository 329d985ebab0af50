use crate::id::EntityId;
use crate::tick::Tick;
use serde::{Deserialize, Serialize};

/// Raw control state read from the local input devices
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleControls {
    pub throttle: f32,
    pub brake: f32,
    pub steer: f32,
    pub jump: bool,
}

impl VehicleControls {
    /// Clamp every axis into its valid range. NaN axes become 0
    pub fn clamped(self) -> Self {
        let clamp = |value: f32, min: f32, max: f32| {
            if value.is_nan() { 0.0 } else { value.clamp(min, max) }
        };
        Self {
            throttle: clamp(self.throttle, -1.0, 1.0),
            brake: clamp(self.brake, 0.0, 1.0),
            steer: clamp(self.steer, -1.0, 1.0),
            jump: self.jump,
        }
    }
}

/// Control input for one entity at one tick.
///
/// Produced once per tick by the controller. Never mutated after creation: the authority and the
/// reconciliation replay work on copies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    pub entity: EntityId,
    pub tick: Tick,
    pub throttle: f32,
    pub brake: f32,
    pub steer: f32,
    pub jump_requested: bool,
}

impl InputSample {
    pub fn new(entity: EntityId, tick: Tick, controls: VehicleControls) -> Self {
        Self {
            entity,
            tick,
            throttle: controls.throttle,
            brake: controls.brake,
            steer: controls.steer,
            jump_requested: controls.jump,
        }
    }

    /// Neutral input, used before any input was received for an entity
    pub fn idle(entity: EntityId, tick: Tick) -> Self {
        Self::new(entity, tick, VehicleControls::default())
    }

    pub fn controls(&self) -> VehicleControls {
        VehicleControls {
            throttle: self.throttle,
            brake: self.brake,
            steer: self.steer,
            jump: self.jump_requested,
        }
    }

    /// Copy of this sample without the one-shot jump request
    pub fn without_jump(&self) -> Self {
        Self {
            jump_requested: false,
            ..*self
        }
    }
}
