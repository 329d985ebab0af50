use crate::error::{LinkError, Result};
use hognet_core::prelude::{PeerId, Tick};
use hognet_protocol::message::{Channel, Message};

/// Recipients of a message. The sender never receives its own broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendTarget {
    Peer(PeerId),
    All,
    AllExcept(PeerId),
}

impl SendTarget {
    pub fn includes(&self, peer: PeerId) -> bool {
        match self {
            SendTarget::Peer(target) => *target == peer,
            SendTarget::All => true,
            SendTarget::AllExcept(excluded) => *excluded != peer,
        }
    }
}

/// A message received from a peer
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from: PeerId,
    pub channel: Channel,
    pub message: Message,
}

/// Send and receive typed messages between participants
pub trait Transport {
    /// Id of the participant owning this end of the transport
    fn local_peer(&self) -> PeerId;

    fn send(&mut self, target: SendTarget, channel: Channel, message: &Message) -> Result<()>;

    /// Next received message, if any. Priority messages are returned before unreliable ones.
    ///
    /// A payload that cannot be decoded is returned as [`LinkError::Malformed`] and does not stop
    /// the stream.
    fn recv(&mut self) -> Option<Result<Envelope>>;

    /// Called once at the start of every tick, before receiving
    fn update(&mut self, tick: Tick) {}
}
