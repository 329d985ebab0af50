use hognet_core::id::PeerId;
use hognet_protocol::error::ProtocolError;

pub type Result<T> = core::result::Result<T, LinkError>;

#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("malformed message from {from}: {source}")]
    Malformed {
        from: PeerId,
        #[source]
        source: ProtocolError,
    },
    #[error("the channel to {0} is disconnected")]
    Disconnected(PeerId),
    #[error("no link to {0}")]
    UnknownPeer(PeerId),
}
