use serde::{Deserialize, Serialize};

/// Tuning of the arcade vehicle model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// kg
    pub mass: f32,
    /// Speed (m/s) at which the engine stops producing force
    pub top_speed: f32,
    /// Engine force at full torque and zero speed, in newtons
    pub engine_power: f32,
    pub brake_force: f32,
    pub rolling_resistance: f32,
    pub max_torque: f32,
    /// Rate at which the motor torque ramps towards a larger target, in units of `max_torque` per second
    pub acceleration_factor: f32,
    /// Rate at which the motor torque ramps towards a smaller target
    pub deceleration_factor: f32,
    /// Front wheel angle at full steer, in degrees
    pub max_steering_angle: f32,
    pub wheelbase: f32,
    pub front_grip: f32,
    pub rear_grip: f32,
    /// Fraction of lateral velocity removed per second at unit grip
    pub lateral_stiffness: f32,
    pub jump_impulse: f32,
    pub jump_cooldown_ticks: u32,
    /// Multiplier applied to the angular velocity of airborne bodies every step
    pub angular_drag: f32,
    pub angular_drag_threshold: f32,
    pub gravity: f32,
    /// Height of the body centre when resting on the ground
    pub ride_height: f32,
    /// Radius of the collision sphere
    pub radius: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: 1500.0,
            top_speed: 25.0,
            engine_power: 15000.0,
            brake_force: 10000.0,
            rolling_resistance: 50.0,
            max_torque: 500.0,
            acceleration_factor: 2.0,
            deceleration_factor: 1.0,
            max_steering_angle: 30.0,
            wheelbase: 2.5,
            front_grip: 1.0,
            rear_grip: 0.8,
            lateral_stiffness: 10.0,
            jump_impulse: 7500.0,
            // 1.5s at 50Hz
            jump_cooldown_ticks: 75,
            angular_drag: 0.95,
            angular_drag_threshold: 0.1,
            gravity: 9.81,
            ride_height: 0.5,
            radius: 1.5,
        }
    }
}
