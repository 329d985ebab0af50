use hognet_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Delivery lane for a message.
///
/// Neither lane is ordered or reliable; receivers drain the priority lane before the unreliable
/// lane so that collision corrections reach owners ahead of the regular broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Unreliable,
    Priority,
}

/// Authoritative state of one entity, with the last input tick the authority applied for it.
///
/// `ack` is only filled in on the copy sent to the entity's controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub snapshot: StateSnapshot,
    pub ack: Option<Tick>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnMessage {
    pub entity: EntityId,
    pub controller: PeerId,
    pub authority: PeerId,
    pub snapshot: StateSnapshot,
}

/// Every message exchanged between participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// controller -> authority
    Input(InputSample),
    /// authority -> everyone
    Snapshot(SnapshotMessage),
    /// authority -> the controllers involved in a collision
    CollisionPriority(SnapshotMessage),
    Spawn(SpawnMessage),
    Despawn(EntityId),
    /// The entity keeps its identity and is moved back to a spawn pose
    Respawn(StateSnapshot),
}

impl Message {
    /// Entity the message refers to
    pub fn entity(&self) -> EntityId {
        match self {
            Message::Input(sample) => sample.entity,
            Message::Snapshot(message) | Message::CollisionPriority(message) => {
                message.snapshot.entity
            }
            Message::Spawn(spawn) => spawn.entity,
            Message::Despawn(entity) => *entity,
            Message::Respawn(snapshot) => snapshot.entity,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::Input(_) => "input",
            Message::Snapshot(_) => "snapshot",
            Message::CollisionPriority(_) => "collision_priority",
            Message::Spawn(_) => "spawn",
            Message::Despawn(_) => "despawn",
            Message::Respawn(_) => "respawn",
        }
    }
}
