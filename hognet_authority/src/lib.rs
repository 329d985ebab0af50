//! # Hognet Authority
//!
//! Runs on the participant whose physics is ground truth for an entity.
//!
//! The [`AuthoritySimulator`] applies the inputs received from each entity's controller,
//! coasting on the last known input when none arrived, and broadcasts snapshots on a fixed
//! cadence. The [`CollisionArbiter`] resolves contacts between vehicles and makes sure both
//! controllers are corrected before the next regular broadcast.

extern crate alloc;

pub mod arbiter;
pub mod config;
pub mod simulator;

pub mod prelude {
    pub use crate::arbiter::{CollisionArbiter, CollisionRecord};
    pub use crate::config::{AuthorityConfig, CollisionConfig};
    pub use crate::simulator::{AuthoritySimulator, InputDisposition};
}
