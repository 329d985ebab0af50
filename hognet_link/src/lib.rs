/*! # Hognet Link

Transport capability used by the replication core.

[`Transport`] sends typed [`Message`](hognet_protocol::message::Message)s to one peer or
broadcasts them, on an unreliable or a priority lane. [`CrossbeamLink`] implements it over
in-memory channels so a host and several clients can run in one process, optionally behind a
[`LinkConditioner`] that adds latency, jitter and loss.
*/

extern crate alloc;

pub mod conditioner;
pub mod crossbeam;
pub mod error;
pub mod ready_buffer;
pub mod transport;

pub use crossbeam::{CrossbeamLink, LocalNetwork};
pub use transport::{Envelope, SendTarget, Transport};

pub mod prelude {
    pub use crate::conditioner::{LinkConditioner, LinkConditionerConfig};
    pub use crate::crossbeam::{CrossbeamLink, LocalNetwork};
    pub use crate::error::LinkError;
    pub use crate::transport::{Envelope, SendTarget, Transport};
}
