use core::fmt;
use serde::{Deserialize, Serialize};

/// Session-wide identifier of a replicated vehicle
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Identifier of a participant machine in the session
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PeerId(pub u64);

impl PeerId {
    /// Conventional id of the hosting participant
    pub const HOST: PeerId = PeerId(0);
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer({})", self.0)
    }
}

/// The part a participant plays for a given entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// We control the entity. `authoritative` is true when we also simulate it authoritatively
    Owner { authoritative: bool },
    /// We simulate the entity authoritatively but its input comes from another peer
    Authority,
    /// We only render snapshots received from the authority
    Observer,
}

impl Role {
    pub fn resolve(local: PeerId, controller: PeerId, authority: PeerId) -> Role {
        match (local == controller, local == authority) {
            (true, authoritative) => Role::Owner { authoritative },
            (false, true) => Role::Authority,
            (false, false) => Role::Observer,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(
            self,
            Role::Owner {
                authoritative: true
            } | Role::Authority
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_role_resolution() {
        let host = PeerId::HOST;
        let client = PeerId(1);
        let other = PeerId(2);
        assert_eq!(
            Role::resolve(host, host, host),
            Role::Owner {
                authoritative: true
            }
        );
        assert_eq!(
            Role::resolve(client, client, host),
            Role::Owner {
                authoritative: false
            }
        );
        assert_eq!(Role::resolve(host, client, host), Role::Authority);
        assert_eq!(Role::resolve(other, client, host), Role::Observer);
        assert!(!Role::resolve(other, client, host).is_authoritative());
    }
}
