//! In-memory transport over crossbeam channels.
//!
//! Every participant owns one [`CrossbeamLink`] holding a sender to every other participant and a
//! single receiver. Useful for tests and for running a host and its clients in one process.
use crate::conditioner::{LinkConditioner, LinkConditionerConfig};
use crate::error::{LinkError, Result};
use crate::transport::{Envelope, SendTarget, Transport};
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;
use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use hognet_core::prelude::{PeerId, Tick};
use hognet_protocol::codec;
use hognet_protocol::message::{Channel, Message};
use tracing::{error, trace};

#[derive(Debug, Clone)]
struct Datagram {
    from: PeerId,
    channel: Channel,
    payload: Bytes,
}

#[derive(Debug)]
pub struct CrossbeamLink {
    local: PeerId,
    senders: BTreeMap<PeerId, Sender<Datagram>>,
    receiver: Receiver<Datagram>,
    conditioner: Option<LinkConditioner<Datagram>>,
    tick: Tick,
    priority: VecDeque<Datagram>,
    unreliable: VecDeque<Datagram>,
    disconnected: bool,
}

impl CrossbeamLink {
    fn new(local: PeerId, receiver: Receiver<Datagram>) -> Self {
        Self {
            local,
            senders: BTreeMap::new(),
            receiver,
            conditioner: None,
            tick: Tick::ZERO,
            priority: VecDeque::new(),
            unreliable: VecDeque::new(),
            disconnected: false,
        }
    }

    /// Create a pair of connected links for local testing
    pub fn new_pair(a: PeerId, b: PeerId) -> (Self, Self) {
        let (sender_a, receiver_a) = crossbeam_channel::unbounded();
        let (sender_b, receiver_b) = crossbeam_channel::unbounded();
        let mut link_a = Self::new(a, receiver_a);
        link_a.senders.insert(b, sender_b);
        let mut link_b = Self::new(b, receiver_b);
        link_b.senders.insert(a, sender_a);
        (link_a, link_b)
    }

    /// Apply latency, jitter and loss to every message received on this link
    pub fn with_conditioner(mut self, config: LinkConditionerConfig) -> Self {
        self.conditioner = Some(LinkConditioner::new(config));
        self
    }

    pub fn peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.senders.keys().copied()
    }

    /// Send an already encoded payload, bypassing the codec
    pub fn send_raw(&mut self, peer: PeerId, channel: Channel, payload: Bytes) -> Result<()> {
        let sender = self
            .senders
            .get(&peer)
            .ok_or(LinkError::UnknownPeer(peer))?;
        sender
            .send(Datagram {
                from: self.local,
                channel,
                payload,
            })
            .map_err(|_| LinkError::Disconnected(peer))
    }

    fn enqueue(&mut self, datagram: Datagram) {
        match datagram.channel {
            Channel::Priority => self.priority.push_back(datagram),
            Channel::Unreliable => self.unreliable.push_back(datagram),
        }
    }

    fn receive_datagrams(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(datagram) => match self.conditioner.as_mut() {
                    Some(conditioner) => {
                        let droppable = datagram.channel == Channel::Unreliable;
                        conditioner.condition_packet(datagram, self.tick, droppable);
                    }
                    None => self.enqueue(datagram),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        error!(peer = ?self.local, "Crossbeam channel is disconnected");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        let tick = self.tick;
        while let Some(datagram) = self
            .conditioner
            .as_mut()
            .and_then(|conditioner| conditioner.pop_packet(tick))
        {
            self.enqueue(datagram);
        }
    }
}

impl Transport for CrossbeamLink {
    fn local_peer(&self) -> PeerId {
        self.local
    }

    fn send(&mut self, target: SendTarget, channel: Channel, message: &Message) -> Result<()> {
        let payload = codec::encode(message)?;
        let recipients: Vec<PeerId> = self
            .senders
            .keys()
            .copied()
            .filter(|peer| target.includes(*peer))
            .collect();
        if let SendTarget::Peer(peer) = target
            && recipients.is_empty()
        {
            return Err(LinkError::UnknownPeer(peer));
        }
        let mut result = Ok(());
        for peer in recipients {
            trace!(from = ?self.local, to = ?peer, kind = message.kind(), "send");
            if let Err(e) = self.send_raw(peer, channel, payload.clone()) {
                error!(?e, "failed to send message");
                result = Err(e);
            }
        }
        result
    }

    fn recv(&mut self) -> Option<Result<Envelope>> {
        self.receive_datagrams();
        let datagram = self
            .priority
            .pop_front()
            .or_else(|| self.unreliable.pop_front())?;
        Some(
            codec::decode(&datagram.payload)
                .map(|message| Envelope {
                    from: datagram.from,
                    channel: datagram.channel,
                    message,
                })
                .map_err(|source| LinkError::Malformed {
                    from: datagram.from,
                    source,
                }),
        )
    }

    fn update(&mut self, tick: Tick) {
        self.tick = tick;
    }
}

/// Builds a fully connected set of [`CrossbeamLink`]s
pub struct LocalNetwork;

impl LocalNetwork {
    /// One link per peer, in the same order as `peers`
    pub fn connect(peers: &[PeerId]) -> Vec<CrossbeamLink> {
        let channels: Vec<(Sender<Datagram>, Receiver<Datagram>)> = peers
            .iter()
            .map(|_| crossbeam_channel::unbounded())
            .collect();
        peers
            .iter()
            .zip(channels.iter())
            .map(|(&local, (_, receiver))| {
                let mut link = CrossbeamLink::new(local, receiver.clone());
                for (&peer, (sender, _)) in peers.iter().zip(channels.iter()) {
                    if peer != local {
                        link.senders.insert(peer, sender.clone());
                    }
                }
                link
            })
            .collect()
    }
}
