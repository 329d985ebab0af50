/*! # Hognet Protocol

Messages exchanged between participants, their binary encoding, and the validation applied to
every inbound message before it reaches a buffer or the simulation.
*/

extern crate alloc;

pub mod codec;
pub mod error;
pub mod message;
pub mod validate;

pub mod prelude {
    pub use crate::codec::{decode, encode};
    pub use crate::error::{ProtocolError, ValidationError};
    pub use crate::message::{Channel, Message, SnapshotMessage, SpawnMessage};
    pub use crate::validate::{Validate, ValidationContext};
}
