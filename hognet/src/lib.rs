/*! # Hognet

Tick-synchronized vehicle state replication.

Each machine runs one [`Participant`](participant::Participant) driving a fixed-rate loop. For
every entity, the participant plays one of three roles:
- the **owner** controls the entity: it applies its own input immediately and reconciles with
  the authority's snapshots, replaying the inputs the authority has not acknowledged yet;
- the **authority** simulates the entity as ground truth, broadcasts snapshots on a fixed cadence
  and arbitrates collisions;
- an **observer** renders the entity by interpolating between received snapshots.

The participant hosting the authority may also own entities, in which case their inputs are
applied directly to the authoritative simulation.
*/

extern crate alloc;

pub mod config;
pub mod error;
pub mod event;
pub mod participant;

pub mod prelude {
    pub use hognet_authority::prelude::*;
    pub use hognet_core::prelude::*;
    pub use hognet_inputs::prelude::*;
    pub use hognet_interpolation::prelude::*;
    pub use hognet_link::prelude::*;
    pub use hognet_prediction::prelude::*;
    pub use hognet_protocol::prelude::*;

    pub use crate::config::SessionConfig;
    pub use crate::error::SessionError;
    pub use crate::event::{RejectReason, SessionEvent};
    pub use crate::participant::{Participant, ParticipantKind};
}
