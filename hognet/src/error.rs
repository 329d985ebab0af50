use hognet_core::prelude::EntityId;
use hognet_protocol::prelude::ValidationError;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("only the participant hosting the authority can do this")]
    NotAuthority,
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationError),
}
