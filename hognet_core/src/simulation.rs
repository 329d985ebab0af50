//! Physics-stepping capability driven by the replication core.
//!
//! The contact/constraint solver is external: the core only needs to read and overwrite body
//! state, feed controls and impulses, advance time, and learn about contacts.
use crate::id::EntityId;
use crate::input::InputSample;
use crate::snapshot::BodyState;
use alloc::vec::Vec;
use bevy_math::Vec3;
use core::time::Duration;

/// Contact reported by the physics world between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub a: EntityId,
    pub b: EntityId,
    pub point: Vec3,
    /// Unit normal pointing from `a` towards `b`
    pub normal: Vec3,
    /// Magnitude of the impulse the solver applied (or would apply) for this contact
    pub impulse: f32,
}

pub trait Simulation {
    fn spawn_body(&mut self, entity: EntityId, state: &BodyState);

    fn despawn_body(&mut self, entity: EntityId);

    fn contains(&self, entity: EntityId) -> bool;

    fn read_state(&self, entity: EntityId) -> Option<BodyState>;

    /// Hard-set the body state. Returns false if the body does not exist
    fn write_state(&mut self, entity: EntityId, state: &BodyState) -> bool;

    /// Set the controls held by the body until the next call.
    ///
    /// A jump request is consumed by the next step.
    fn apply_input(&mut self, entity: EntityId, input: &InputSample);

    /// Instant change of momentum
    fn apply_impulse(&mut self, entity: EntityId, impulse: Vec3);

    fn mass(&self, entity: EntityId) -> Option<f32>;

    /// Advance every body by one step and detect contacts
    fn step(&mut self, dt: Duration);

    /// Advance a single body by one step, ignoring contacts.
    ///
    /// Stepping a body alone must produce the same state as the same body inside [`Simulation::step`]
    /// when no contact occurs.
    fn step_body(&mut self, entity: EntityId, dt: Duration);

    /// Contacts detected since the last call
    fn drain_contacts(&mut self) -> Vec<ContactEvent>;
}
