/*! # Hognet Inputs

Bounded, tick-indexed storage of [`InputSample`](hognet_core::input::InputSample)s.

The controller keeps every input it has not yet seen acknowledged so it can replay them after a
correction; the authority keeps the inputs it received but has not yet applied.
*/

extern crate alloc;

pub mod config;
pub mod input_buffer;

pub mod prelude {
    pub use crate::config::InputConfig;
    pub use crate::input_buffer::{Eviction, Evictions, InputHistoryBuffer};
}
