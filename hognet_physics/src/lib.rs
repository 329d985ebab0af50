/*! # Hognet Physics

A small arcade vehicle world implementing [`Simulation`](hognet_core::simulation::Simulation).

It stands in for a full physics engine in tests and headless servers: every body is a sphere
resting on a flat ground plane, driven by a quantized engine/brake/grip force model.
*/

extern crate alloc;

pub mod config;
pub mod world;

pub mod prelude {
    pub use crate::config::VehicleConfig;
    pub use crate::world::VehicleWorld;
}
