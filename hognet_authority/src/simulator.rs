use crate::arbiter::{CollisionArbiter, CollisionRecord};
use crate::config::AuthorityConfig;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::time::Duration;
use hognet_core::prelude::*;
use hognet_inputs::prelude::InputHistoryBuffer;
use hognet_link::prelude::{SendTarget, Transport};
use hognet_protocol::prelude::{Channel, Message, SnapshotMessage, SpawnMessage};
use tracing::{debug, error, trace, warn};

/// What happened to an input received by the authority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDisposition {
    /// Buffered, it will be applied at the next step
    Accepted,
    /// Its tick is not newer than the last applied tick
    Stale,
    /// The sender does not control the entity
    NotController,
    UnknownEntity,
}

#[derive(Debug, Clone)]
struct AuthorityEntity {
    controller: PeerId,
    last_applied: Option<Tick>,
    /// Re-applied on ticks where no fresh input is available
    last_input: Option<InputSample>,
    /// Received, not yet applied
    pending: InputHistoryBuffer,
}

impl AuthorityEntity {
    /// Pick the newest pending input due at `tick`, dropping the older ones.
    ///
    /// A jump requested by any skipped input is carried over. Without any due input the last
    /// known controls are re-applied, minus the jump.
    fn next_input(&mut self, tick: Tick) -> Option<InputSample> {
        let mut selected: Option<InputSample> = None;
        let mut jump = false;
        for (_, sample) in self.pending.range(Tick::ZERO, tick) {
            jump |= sample.jump_requested;
            selected = Some(*sample);
        }
        let Some(mut sample) = selected else {
            return self.last_input.map(|sample| sample.without_jump());
        };
        sample.jump_requested = jump;
        self.pending.prune_before(sample.tick.next());
        self.last_applied = Some(sample.tick);
        self.last_input = Some(sample);
        Some(sample)
    }
}

/// Authoritative simulation of every entity hosted by the local participant
#[derive(Debug)]
pub struct AuthoritySimulator {
    config: AuthorityConfig,
    local_peer: PeerId,
    entities: BTreeMap<EntityId, AuthorityEntity>,
    arbiter: CollisionArbiter,
    broadcast: TickTimer,
}

impl AuthoritySimulator {
    pub fn new(config: AuthorityConfig, local_peer: PeerId, quantizer: Quantizer) -> Self {
        Self {
            arbiter: CollisionArbiter::new(config.collision.clone(), quantizer),
            broadcast: TickTimer::new(config.broadcast_interval_ticks),
            entities: BTreeMap::new(),
            local_peer,
            config,
        }
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    pub fn local_peer(&self) -> PeerId {
        self.local_peer
    }

    pub fn arbiter(&self) -> &CollisionArbiter {
        &self.arbiter
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn controller(&self, entity: EntityId) -> Option<PeerId> {
        self.entities.get(&entity).map(|e| e.controller)
    }

    /// Last input tick applied for `entity`
    pub fn last_applied(&self, entity: EntityId) -> Option<Tick> {
        self.entities.get(&entity).and_then(|e| e.last_applied)
    }

    /// Create the entity in the simulation and announce it to every peer
    pub fn spawn<S: Simulation, T: Transport>(
        &mut self,
        sim: &mut S,
        transport: &mut T,
        entity: EntityId,
        controller: PeerId,
        body: BodyState,
        tick: Tick,
    ) -> StateSnapshot {
        sim.spawn_body(entity, &body);
        self.entities.insert(
            entity,
            AuthorityEntity {
                controller,
                last_applied: None,
                last_input: None,
                pending: InputHistoryBuffer::new(self.config.input.capacity),
            },
        );
        let snapshot = StateSnapshot::new(entity, tick, body);
        debug!(?entity, ?controller, ?tick, "spawned entity");
        Self::send(
            transport,
            SendTarget::All,
            Channel::Priority,
            &Message::Spawn(SpawnMessage {
                entity,
                controller,
                authority: self.local_peer,
                snapshot,
            }),
        );
        snapshot
    }

    /// Remove the entity, its buffered inputs and collision state, and announce it
    pub fn despawn<S: Simulation, T: Transport>(
        &mut self,
        sim: &mut S,
        transport: &mut T,
        entity: EntityId,
    ) -> bool {
        if self.entities.remove(&entity).is_none() {
            return false;
        }
        sim.despawn_body(entity);
        self.arbiter.despawn(entity);
        debug!(?entity, "despawned entity");
        Self::send(
            transport,
            SendTarget::All,
            Channel::Priority,
            &Message::Despawn(entity),
        );
        true
    }

    /// Move the entity back to `body`, keeping its identity and its last applied tick
    pub fn respawn<S: Simulation, T: Transport>(
        &mut self,
        sim: &mut S,
        transport: &mut T,
        entity: EntityId,
        body: BodyState,
        tick: Tick,
    ) -> Option<StateSnapshot> {
        let state = self.entities.get_mut(&entity)?;
        state.pending.clear();
        state.last_input = None;
        sim.write_state(entity, &body);
        let snapshot = StateSnapshot::new(entity, tick, body);
        debug!(?entity, ?tick, "respawned entity");
        Self::send(
            transport,
            SendTarget::All,
            Channel::Priority,
            &Message::Respawn(snapshot),
        );
        Some(snapshot)
    }

    /// Buffer an input received from `from`.
    ///
    /// The sample must already have passed boundary validation.
    pub fn receive_input(&mut self, from: PeerId, sample: InputSample) -> InputDisposition {
        let entity = sample.entity;
        let Some(state) = self.entities.get_mut(&entity) else {
            debug!(?entity, ?from, "input for an unknown entity");
            return InputDisposition::UnknownEntity;
        };
        if state.controller != from {
            warn!(
                ?entity,
                ?from,
                controller = ?state.controller,
                "Dropping input from a peer that does not control the entity"
            );
            return InputDisposition::NotController;
        }
        if state.last_applied.is_some_and(|last| sample.tick <= last) {
            trace!(?entity, tick = ?sample.tick, "dropping stale input");
            return InputDisposition::Stale;
        }
        for eviction in state.pending.put(sample.tick, sample) {
            trace!(?entity, tick = ?eviction.tick, "evicted pending input");
        }
        InputDisposition::Accepted
    }

    /// Run the authoritative step for `tick`: apply inputs, advance physics, resolve collisions,
    /// then send the snapshots that are due.
    pub fn step<S: Simulation, T: Transport>(
        &mut self,
        sim: &mut S,
        transport: &mut T,
        tick: Tick,
        dt: Duration,
    ) -> Vec<CollisionRecord> {
        for (entity, state) in self.entities.iter_mut() {
            if let Some(input) = state.next_input(tick) {
                sim.apply_input(*entity, &input);
            }
        }
        sim.step(dt);

        self.arbiter.tick();
        let mut collisions = Vec::new();
        for contact in sim.drain_contacts() {
            if !self.contains(contact.a) || !self.contains(contact.b) {
                continue;
            }
            if let Some(record) = self.arbiter.on_contact(sim, &contact, tick) {
                collisions.push(record);
            }
        }

        // owners involved in a collision are corrected ahead of the regular broadcast
        for entity in self.arbiter.take_due(tick) {
            self.send_priority(sim, transport, entity, tick);
        }
        if self.broadcast.tick() {
            self.broadcast(sim, transport, tick);
        }
        collisions
    }

    fn snapshot<S: Simulation>(&self, sim: &S, entity: EntityId, tick: Tick) -> Option<StateSnapshot> {
        sim.read_state(entity)
            .map(|body| StateSnapshot::new(entity, tick, body))
    }

    fn send_priority<S: Simulation, T: Transport>(
        &self,
        sim: &S,
        transport: &mut T,
        entity: EntityId,
        tick: Tick,
    ) {
        let (Some(state), Some(snapshot)) =
            (self.entities.get(&entity), self.snapshot(sim, entity, tick))
        else {
            return;
        };
        if state.controller == self.local_peer {
            return;
        }
        trace!(?entity, ?tick, controller = ?state.controller, "sending collision snapshot");
        Self::send(
            transport,
            SendTarget::Peer(state.controller),
            Channel::Priority,
            &Message::CollisionPriority(SnapshotMessage {
                snapshot,
                ack: state.last_applied,
            }),
        );
    }

    /// Send the current snapshot of every entity: with the acknowledgement to its controller,
    /// without it to everyone else.
    ///
    /// Entities waiting for a collision snapshot are skipped until their controller got it.
    pub fn broadcast<S: Simulation, T: Transport>(&self, sim: &S, transport: &mut T, tick: Tick) {
        for (&entity, state) in &self.entities {
            if state.controller != self.local_peer && self.arbiter.is_pending(entity) {
                trace!(?entity, ?tick, "holding back snapshot until the collision snapshot is sent");
                continue;
            }
            let Some(snapshot) = self.snapshot(sim, entity, tick) else {
                continue;
            };
            let observers = if state.controller == self.local_peer {
                SendTarget::All
            } else {
                Self::send(
                    transport,
                    SendTarget::Peer(state.controller),
                    Channel::Unreliable,
                    &Message::Snapshot(SnapshotMessage {
                        snapshot,
                        ack: state.last_applied,
                    }),
                );
                SendTarget::AllExcept(state.controller)
            };
            Self::send(
                transport,
                observers,
                Channel::Unreliable,
                &Message::Snapshot(SnapshotMessage {
                    snapshot,
                    ack: None,
                }),
            );
        }
    }

    fn send<T: Transport>(transport: &mut T, target: SendTarget, channel: Channel, message: &Message) {
        if let Err(e) = transport.send(target, channel, message) {
            error!(?target, kind = message.kind(), ?e, "failed to send message");
        }
    }
}
