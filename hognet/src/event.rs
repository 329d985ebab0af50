use hognet_authority::prelude::CollisionRecord;
use hognet_core::prelude::{EntityId, PeerId, Role, Tick};
use hognet_prediction::prelude::Divergence;
use hognet_protocol::prelude::ValidationError;

/// Why an inbound message was discarded
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// The payload could not be decoded
    Malformed,
    Invalid(ValidationError),
}

/// Notifications surfaced to the enclosing session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Spawned {
        entity: EntityId,
        role: Role,
    },
    Despawned {
        entity: EntityId,
    },
    Respawned {
        entity: EntityId,
    },
    /// The local prediction was reset to an authoritative snapshot
    Reconciled {
        entity: EntityId,
        /// `None` if no prediction was recorded for the acknowledged tick
        divergence: Option<Divergence>,
        replayed: usize,
    },
    /// An input was evicted from the local buffer before the authority acknowledged it
    InputEvicted {
        entity: EntityId,
        tick: Tick,
    },
    MessageRejected {
        from: PeerId,
        reason: RejectReason,
    },
    /// No snapshot was received since `last_heard`
    AuthorityUnreachable {
        last_heard: Tick,
    },
    /// Resolved by the local authority
    Collision(CollisionRecord),
}
