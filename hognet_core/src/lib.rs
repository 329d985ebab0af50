//! Contains a set of shared types

extern crate alloc;

pub mod clock;
pub mod history_buffer;
pub mod id;
pub mod input;
pub mod observable;
pub mod quantize;
pub mod simulation;
pub mod snapshot;
pub mod tick;
pub mod timer;

pub mod prelude {
    pub use crate::clock::TickClock;
    pub use crate::history_buffer::HistoryBuffer;
    pub use crate::id::{EntityId, PeerId, Role};
    pub use crate::input::{InputSample, VehicleControls};
    pub use crate::observable::Observable;
    pub use crate::quantize::{Precision, QuantizeConfig, Quantizer, quantize};
    pub use crate::simulation::{ContactEvent, Simulation};
    pub use crate::snapshot::{BodyState, StateSnapshot};
    pub use crate::tick::{Tick, TickDuration};
    pub use crate::timer::{Cooldown, TickTimer};
}
