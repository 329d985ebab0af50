use crate::config::VehicleConfig;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use bevy_math::{Quat, Vec3};
use core::time::Duration;
use hognet_core::prelude::*;
use tracing::{debug, trace};

/// Below this forward speed (m/s) brakes and rolling resistance stop acting
const STOP_SPEED: f32 = 0.1;
const GROUND_EPSILON: f32 = 0.01;

#[derive(Debug, Clone)]
struct Body {
    state: BodyState,
    controls: VehicleControls,
    jump_pending: bool,
}

/// Arena of vehicle bodies stepped with a quantized force model.
///
/// Bodies are iterated in entity-id order so that two worlds fed the same inputs step
/// identically.
#[derive(Debug, Clone)]
pub struct VehicleWorld {
    config: VehicleConfig,
    quantizer: Quantizer,
    bodies: BTreeMap<EntityId, Body>,
    contacts: Vec<ContactEvent>,
}

impl VehicleWorld {
    pub fn new(config: VehicleConfig, quantizer: Quantizer) -> Self {
        Self {
            config,
            quantizer,
            bodies: BTreeMap::new(),
            contacts: Vec::new(),
        }
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Current controls of a body
    pub fn controls(&self, entity: EntityId) -> Option<VehicleControls> {
        self.bodies.get(&entity).map(|body| body.controls)
    }

    fn integrate(config: &VehicleConfig, q: &Quantizer, body: &mut Body, dt: Duration) {
        let dt = dt.as_secs_f32();
        if dt <= 0.0 {
            return;
        }
        let controls = body.controls;
        let jump = core::mem::take(&mut body.jump_pending);
        let state = &mut body.state;
        state.jump_cooldown.tick();
        let mass = config.mass;

        // wheel angle and motor torque ramp
        state.steering_angle = q.float(controls.steer * config.max_steering_angle);
        let target_torque = controls.throttle * config.max_torque;
        let rate = if target_torque.abs() > state.motor_torque.abs() {
            config.acceleration_factor
        } else {
            config.deceleration_factor
        };
        state.motor_torque = q.float(move_towards(
            state.motor_torque,
            target_torque,
            dt * config.max_torque * rate,
        ));

        let grounded = state.position.y <= config.ride_height + GROUND_EPSILON;
        let forward = q.direction(state.forward());
        let right = q.direction(state.right());
        let mut velocity = q.vec3(state.linear_velocity);
        let speed = q.float(velocity.length());
        let forward_speed = q.dot(velocity, forward);
        let lateral_speed = q.dot(velocity, right);

        let mut force = Vec3::ZERO;
        if grounded {
            if velocity.y < 0.0 {
                velocity.y = 0.0;
            }
            let speed_ratio = q.float((speed / config.top_speed).clamp(0.0, 1.0));
            let power_factor = q.float(1.0 - speed_ratio * speed_ratio);
            let mut drive = q.float(
                state.motor_torque / config.max_torque * config.engine_power * power_factor,
            );
            if forward_speed.abs() > STOP_SPEED {
                let mut resistance = config.rolling_resistance;
                if controls.brake > 0.0 {
                    resistance += controls.brake * config.brake_force;
                }
                // brakes and rolling resistance can stop the body but never reverse it
                let stopping = forward_speed.abs() * mass / dt;
                drive -= q.float(forward_speed.signum() * resistance.min(stopping));
            }
            force += q.vec3(forward * drive);

            let grip = q.float((config.front_grip + config.rear_grip) * 0.5);
            let lateral_fraction = q.float((grip * config.lateral_stiffness * dt).min(1.0));
            velocity -= q.vec3(right * (lateral_speed * lateral_fraction));

            if jump && state.jump_cooldown.is_ready() {
                trace!("jump");
                velocity += q.vec3(Vec3::Y * (config.jump_impulse / mass));
                state.jump_cooldown.start(config.jump_cooldown_ticks);
            }
        } else {
            force += q.vec3(Vec3::NEG_Y * (config.gravity * mass));
        }
        velocity = q.vec3(velocity + force / mass * dt);

        state.angular_velocity = if grounded {
            // bicycle model: yaw rate from forward speed and front wheel angle
            let yaw_rate = q.float(
                forward_speed * state.steering_angle.to_radians().tan() / config.wheelbase,
            );
            Vec3::new(0.0, yaw_rate, 0.0)
        } else if state.angular_velocity.length() > config.angular_drag_threshold {
            q.vec3(state.angular_velocity * config.angular_drag)
        } else {
            q.vec3(state.angular_velocity)
        };

        let mut position = q.position(state.position + velocity * dt);
        if position.y < config.ride_height {
            position.y = config.ride_height;
            velocity.y = velocity.y.max(0.0);
        }
        state.position = position;
        state.linear_velocity = velocity;
        state.orientation =
            q.quat(Quat::from_scaled_axis(state.angular_velocity * dt) * state.orientation);
    }

    /// Sphere-sphere contacts between every pair of bodies, in entity-id order.
    ///
    /// Overlapping bodies are pushed apart; velocities are left untouched and the impulse a fully
    /// inelastic response would need is reported on the contact.
    fn detect_contacts(&mut self) {
        let q = &self.quantizer;
        let ids: Vec<EntityId> = self.bodies.keys().copied().collect();
        let min_distance = self.config.radius * 2.0;
        let mass = self.config.mass;
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let (Some(body_a), Some(body_b)) = (self.bodies.get(&a), self.bodies.get(&b))
                else {
                    continue;
                };
                let (state_a, state_b) = (body_a.state, body_b.state);
                let delta = state_b.position - state_a.position;
                let distance = delta.length();
                if distance >= min_distance {
                    continue;
                }
                let normal = if distance > f32::EPSILON {
                    q.direction(delta)
                } else {
                    Vec3::X
                };
                let closing = q.dot(state_a.linear_velocity - state_b.linear_velocity, normal);
                let reduced_mass = mass * mass / (mass + mass);
                let impulse = q.float(reduced_mass * closing.max(0.0));
                let point = q.position(state_a.position + normal * self.config.radius);

                let push = normal * ((min_distance - distance) * 0.5);
                if let Some(body) = self.bodies.get_mut(&a) {
                    body.state.position = q.position(state_a.position - push);
                }
                if let Some(body) = self.bodies.get_mut(&b) {
                    body.state.position = q.position(state_b.position + push);
                }
                debug!(?a, ?b, ?normal, impulse, "contact");
                self.contacts.push(ContactEvent {
                    a,
                    b,
                    point,
                    normal,
                    impulse,
                });
            }
        }
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

impl Default for VehicleWorld {
    fn default() -> Self {
        Self::new(VehicleConfig::default(), Quantizer::default())
    }
}

impl Simulation for VehicleWorld {
    fn spawn_body(&mut self, entity: EntityId, state: &BodyState) {
        self.bodies.insert(
            entity,
            Body {
                state: *state,
                controls: VehicleControls::default(),
                jump_pending: false,
            },
        );
    }

    fn despawn_body(&mut self, entity: EntityId) {
        self.bodies.remove(&entity);
        self.contacts
            .retain(|contact| contact.a != entity && contact.b != entity);
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.bodies.contains_key(&entity)
    }

    fn read_state(&self, entity: EntityId) -> Option<BodyState> {
        self.bodies.get(&entity).map(|body| body.state)
    }

    fn write_state(&mut self, entity: EntityId, state: &BodyState) -> bool {
        match self.bodies.get_mut(&entity) {
            Some(body) => {
                body.state = *state;
                true
            }
            None => false,
        }
    }

    fn apply_input(&mut self, entity: EntityId, input: &InputSample) {
        let Some(body) = self.bodies.get_mut(&entity) else {
            return;
        };
        let controls = input.controls().clamped();
        body.controls = VehicleControls {
            jump: false,
            ..controls
        };
        body.jump_pending |= controls.jump;
    }

    fn apply_impulse(&mut self, entity: EntityId, impulse: Vec3) {
        let mass = self.config.mass;
        let Some(body) = self.bodies.get_mut(&entity) else {
            return;
        };
        body.state.linear_velocity = self
            .quantizer
            .vec3(body.state.linear_velocity + impulse / mass);
    }

    fn mass(&self, entity: EntityId) -> Option<f32> {
        self.bodies.get(&entity).map(|_| self.config.mass)
    }

    fn step(&mut self, dt: Duration) {
        for body in self.bodies.values_mut() {
            Self::integrate(&self.config, &self.quantizer, body, dt);
        }
        self.detect_contacts();
    }

    fn step_body(&mut self, entity: EntityId, dt: Duration) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            Self::integrate(&self.config, &self.quantizer, body, dt);
        }
    }

    fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        core::mem::take(&mut self.contacts)
    }
}
