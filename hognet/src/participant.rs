//! The per-machine driver of a session.
//!
//! A [`Participant`] owns the local simulation and one end of the transport, and runs the fixed
//! tick loop: receive and validate messages, predict owned entities, step the authority (if
//! hosted here), then refresh derived state such as the drift flag.
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::event::{RejectReason, SessionEvent};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::time::Duration;
use hognet_authority::prelude::AuthoritySimulator;
use hognet_core::prelude::*;
use hognet_interpolation::prelude::{InterpolatedState, RemoteInterpolator};
use hognet_link::prelude::{LinkError, SendTarget, Transport};
use hognet_prediction::prelude::*;
use hognet_protocol::prelude::*;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// Runs the authority for every entity of the session
    Host,
    Client,
}

/// How the local participant keeps track of one entity
#[derive(Debug)]
enum Replica {
    /// Controlled here, simulated by a remote authority
    Predicted {
        predictor: LocalPredictor,
        correction: Option<VisualCorrection>,
    },
    /// Simulated here by the local authority
    Authoritative,
    Interpolated(RemoteInterpolator),
}

#[derive(Debug)]
struct Replicated {
    controller: PeerId,
    authority: PeerId,
    role: Role,
    replica: Replica,
    /// Latest controls set by the local player, only used for owned entities
    controls: VehicleControls,
    drifting: Observable<bool>,
}

pub struct Participant<S, T> {
    config: SessionConfig,
    kind: ParticipantKind,
    quantizer: Quantizer,
    sim: S,
    transport: T,
    clock: TickClock,
    authority: Option<AuthoritySimulator>,
    reconciler: Reconciler,
    entities: BTreeMap<EntityId, Replicated>,
    events: Vec<SessionEvent>,
    /// Tick at which the last message from a remote authority was received
    last_heard: Tick,
    unreachable: bool,
}

impl<S: Simulation, T: Transport> Participant<S, T> {
    pub fn new(config: SessionConfig, sim: S, transport: T, kind: ParticipantKind) -> Self {
        let quantizer = Quantizer::new(config.quantize.clone());
        let authority = (kind == ParticipantKind::Host).then(|| {
            AuthoritySimulator::new(
                config.authority.clone(),
                transport.local_peer(),
                quantizer.clone(),
            )
        });
        info!(peer = ?transport.local_peer(), ?kind, "Starting participant");
        Self {
            clock: TickClock::new(TickDuration(config.tick_duration)),
            reconciler: Reconciler::new(config.reconcile.clone(), config.tick_duration),
            quantizer,
            sim,
            transport,
            authority,
            kind,
            entities: BTreeMap::new(),
            events: Vec::new(),
            last_heard: Tick::ZERO,
            unreachable: false,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    pub fn local_peer(&self) -> PeerId {
        self.transport.local_peer()
    }

    pub fn tick(&self) -> Tick {
        self.clock.tick()
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn authority(&self) -> Option<&AuthoritySimulator> {
        self.authority.as_ref()
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn role(&self, entity: EntityId) -> Option<Role> {
        self.entities.get(&entity).map(|replicated| replicated.role)
    }

    pub fn predictor(&self, entity: EntityId) -> Option<&LocalPredictor> {
        match &self.entities.get(&entity)?.replica {
            Replica::Predicted { predictor, .. } => Some(predictor),
            _ => None,
        }
    }

    pub fn interpolation_status(&self, entity: EntityId) -> Option<InterpolatedState> {
        match &self.entities.get(&entity)?.replica {
            Replica::Interpolated(interpolator) => interpolator.status(),
            _ => None,
        }
    }

    /// Drain the events raised since the last call
    pub fn events(&mut self) -> alloc::vec::Drain<'_, SessionEvent> {
        self.events.drain(..)
    }

    /// Controls applied to an owned entity from the next tick on
    pub fn set_controls(
        &mut self,
        entity: EntityId,
        controls: VehicleControls,
    ) -> Result<(), SessionError> {
        match self.entities.get_mut(&entity) {
            Some(replicated) if matches!(replicated.role, Role::Owner { .. }) => {
                replicated.controls = controls;
                Ok(())
            }
            _ => Err(SessionError::UnknownEntity(entity)),
        }
    }

    pub fn is_drifting(&self, entity: EntityId) -> Option<bool> {
        self.entities
            .get(&entity)
            .map(|replicated| *replicated.drifting.get())
    }

    /// Register a callback invoked with `(was_drifting, is_drifting)` whenever the drift flag of
    /// `entity` flips
    pub fn on_drift_changed(
        &mut self,
        entity: EntityId,
        observer: impl FnMut(&bool, &bool) + Send + 'static,
    ) -> Result<(), SessionError> {
        let replicated = self
            .entities
            .get_mut(&entity)
            .ok_or(SessionError::UnknownEntity(entity))?;
        replicated.drifting.subscribe(observer);
        Ok(())
    }

    /// State to display for `entity`: the simulated state for simulated entities (offset by any
    /// ongoing visual correction), the interpolated state for observed ones
    pub fn render_state(&self, entity: EntityId) -> Option<BodyState> {
        match &self.entities.get(&entity)?.replica {
            Replica::Predicted { correction, .. } => {
                let state = self.sim.read_state(entity)?;
                Some(
                    correction
                        .as_ref()
                        .and_then(|correction| correction.visual(self.clock.tick(), &state))
                        .unwrap_or(state),
                )
            }
            Replica::Authoritative => self.sim.read_state(entity),
            Replica::Interpolated(interpolator) => interpolator.current(),
        }
    }

    /// Spawn an entity controlled by `controller`. Only available on the host
    pub fn host_spawn(
        &mut self,
        entity: EntityId,
        controller: PeerId,
        body: BodyState,
    ) -> Result<StateSnapshot, SessionError> {
        let tick = self.clock.tick();
        let authority = self.authority.as_mut().ok_or(SessionError::NotAuthority)?;
        let snapshot = authority.spawn(
            &mut self.sim,
            &mut self.transport,
            entity,
            controller,
            body,
            tick,
        );
        let local = self.transport.local_peer();
        self.register(SpawnMessage {
            entity,
            controller,
            authority: local,
            snapshot,
        });
        Ok(snapshot)
    }

    /// Remove an entity everywhere. Returns false if it did not exist. Only available on the host
    pub fn host_despawn(&mut self, entity: EntityId) -> Result<bool, SessionError> {
        let authority = self.authority.as_mut().ok_or(SessionError::NotAuthority)?;
        if !authority.despawn(&mut self.sim, &mut self.transport, entity) {
            return Ok(false);
        }
        Ok(self.remove(entity))
    }

    /// Move an entity back to `body`, keeping its identity. Only available on the host
    pub fn host_respawn(
        &mut self,
        entity: EntityId,
        body: BodyState,
    ) -> Result<StateSnapshot, SessionError> {
        let tick = self.clock.tick();
        let authority = self.authority.as_mut().ok_or(SessionError::NotAuthority)?;
        let snapshot = authority
            .respawn(&mut self.sim, &mut self.transport, entity, body, tick)
            .ok_or(SessionError::UnknownEntity(entity))?;
        self.apply_respawn(snapshot);
        Ok(snapshot)
    }

    /// Advance by `elapsed` of wall-clock time, running as many fixed ticks as fit
    pub fn update(&mut self, elapsed: Duration) {
        // snapshots received during this frame start blending from zero
        for replicated in self.entities.values_mut() {
            if let Replica::Interpolated(interpolator) = &mut replicated.replica {
                interpolator.advance(elapsed);
            }
        }
        self.clock.accumulate(elapsed);
        while let Some(tick) = self.clock.next_tick() {
            self.run_tick(tick);
        }
    }

    fn run_tick(&mut self, tick: Tick) {
        let dt = self.config.tick_duration;
        self.receive(tick);
        self.predict(tick, dt);
        match self.authority.as_mut() {
            Some(authority) => {
                let collisions = authority.step(&mut self.sim, &mut self.transport, tick, dt);
                self.events
                    .extend(collisions.into_iter().map(SessionEvent::Collision));
            }
            None => self.check_authority(tick),
        }
        self.refresh(tick);
    }

    fn receive(&mut self, tick: Tick) {
        self.transport.update(tick);
        while let Some(received) = self.transport.recv() {
            match received {
                Ok(envelope) => {
                    let from = envelope.from;
                    if let Err(SessionError::Validation(e)) =
                        self.handle_message(from, envelope.message)
                    {
                        warn!(?from, %e, "Rejected invalid message");
                        self.events.push(SessionEvent::MessageRejected {
                            from,
                            reason: RejectReason::Invalid(e),
                        });
                    }
                }
                Err(LinkError::Malformed { from, source }) => {
                    warn!(?from, %source, "Rejected malformed message");
                    self.events.push(SessionEvent::MessageRejected {
                        from,
                        reason: RejectReason::Malformed,
                    });
                }
                Err(e) => error!(?e, "Error receiving message"),
            }
        }
    }

    /// Validate then dispatch one inbound message. Invalid messages are discarded whole
    pub fn handle_message(&mut self, from: PeerId, message: Message) -> Result<(), SessionError> {
        let ctx = ValidationContext {
            current_tick: self.clock.tick(),
            max_future_ticks: self.config.input.max_future_ticks,
        };
        message.validate(&ctx)?;
        trace!(?from, kind = message.kind(), entity = ?message.entity(), "recv");
        match message {
            Message::Input(sample) => match self.authority.as_mut() {
                Some(authority) => {
                    authority.receive_input(from, sample);
                }
                None => debug!(?from, "ignoring input: the authority is not hosted here"),
            },
            Message::Snapshot(message) => self.on_snapshot(from, message, false),
            Message::CollisionPriority(message) => self.on_snapshot(from, message, true),
            Message::Spawn(spawn) => {
                if spawn.authority != from {
                    warn!(?from, entity = ?spawn.entity, "spawn not sent by the entity's authority");
                    return Ok(());
                }
                self.heard_from_authority();
                self.register(spawn);
            }
            Message::Despawn(entity) => {
                if self.is_authority_of(from, entity) {
                    self.remove(entity);
                }
            }
            Message::Respawn(snapshot) => {
                if self.is_authority_of(from, snapshot.entity) {
                    self.apply_respawn(snapshot);
                }
            }
        }
        Ok(())
    }

    fn is_authority_of(&self, peer: PeerId, entity: EntityId) -> bool {
        let known = self
            .entities
            .get(&entity)
            .is_some_and(|replicated| replicated.authority == peer);
        if !known {
            debug!(?peer, ?entity, "ignoring message: unknown entity or not its authority");
        }
        known
    }

    fn heard_from_authority(&mut self) {
        self.last_heard = self.clock.tick();
        if self.unreachable {
            info!("Authority is reachable again");
            self.unreachable = false;
        }
    }

    fn on_snapshot(&mut self, from: PeerId, message: SnapshotMessage, forced: bool) {
        let entity = message.snapshot.entity;
        if !self.is_authority_of(from, entity) {
            return;
        }
        self.heard_from_authority();
        let Some(replicated) = self.entities.get_mut(&entity) else {
            return;
        };
        match &mut replicated.replica {
            Replica::Predicted {
                predictor,
                correction,
            } => {
                let outcome = self.reconciler.reconcile(
                    predictor,
                    &mut self.sim,
                    &message.snapshot,
                    message.ack,
                    forced,
                );
                if let ReconcileOutcome::Corrected {
                    divergence,
                    replayed,
                    visual,
                } = outcome
                {
                    if visual.is_some() {
                        *correction = visual;
                    }
                    self.events.push(SessionEvent::Reconciled {
                        entity,
                        divergence,
                        replayed,
                    });
                }
            }
            Replica::Interpolated(interpolator) => interpolator.push(message.snapshot),
            Replica::Authoritative => {
                trace!(?entity, "ignoring snapshot for an entity simulated locally");
            }
        }
    }

    fn register(&mut self, spawn: SpawnMessage) {
        let entity = spawn.entity;
        if self.entities.contains_key(&entity) {
            trace!(?entity, "entity already spawned");
            return;
        }
        let role = Role::resolve(
            self.transport.local_peer(),
            spawn.controller,
            spawn.authority,
        );
        let replica = match role {
            Role::Owner {
                authoritative: false,
            } => {
                self.sim.spawn_body(entity, &spawn.snapshot.body);
                Replica::Predicted {
                    predictor: LocalPredictor::new(
                        entity,
                        &self.config.input,
                        self.quantizer.clone(),
                    ),
                    correction: None,
                }
            }
            Role::Owner {
                authoritative: true,
            }
            | Role::Authority => Replica::Authoritative,
            Role::Observer => {
                let mut interpolator =
                    RemoteInterpolator::new(self.config.interpolation.clone());
                interpolator.push(spawn.snapshot);
                Replica::Interpolated(interpolator)
            }
        };
        info!(?entity, ?role, controller = ?spawn.controller, "Spawned entity");
        self.entities.insert(
            entity,
            Replicated {
                controller: spawn.controller,
                authority: spawn.authority,
                role,
                replica,
                controls: VehicleControls::default(),
                drifting: Observable::new(false),
            },
        );
        self.events.push(SessionEvent::Spawned { entity, role });
    }

    fn remove(&mut self, entity: EntityId) -> bool {
        let Some(replicated) = self.entities.remove(&entity) else {
            return false;
        };
        // the local authority already removed its body
        if let Replica::Predicted { .. } = replicated.replica {
            self.sim.despawn_body(entity);
        }
        info!(?entity, "Despawned entity");
        self.events.push(SessionEvent::Despawned { entity });
        true
    }

    fn apply_respawn(&mut self, snapshot: StateSnapshot) {
        let entity = snapshot.entity;
        let Some(replicated) = self.entities.get_mut(&entity) else {
            return;
        };
        match &mut replicated.replica {
            Replica::Predicted {
                predictor,
                correction,
            } => {
                predictor.reset(&mut self.sim, &snapshot);
                *correction = None;
            }
            Replica::Interpolated(interpolator) => interpolator.reset(snapshot),
            Replica::Authoritative => {}
        }
        debug!(?entity, tick = ?snapshot.tick, "Respawned entity");
        self.events.push(SessionEvent::Respawned { entity });
    }

    /// Apply the local controls of every owned entity for `tick`
    fn predict(&mut self, tick: Tick, dt: Duration) {
        let local = self.transport.local_peer();
        for (&entity, replicated) in self.entities.iter_mut() {
            let controls = replicated.controls;
            match &mut replicated.replica {
                Replica::Predicted { predictor, .. } => {
                    let prediction = predictor.predict(&mut self.sim, tick, controls);
                    self.events.extend(prediction.unacknowledged_evictions.iter().map(
                        |eviction| SessionEvent::InputEvicted {
                            entity,
                            tick: eviction.tick,
                        },
                    ));
                    if let Err(e) = self.transport.send(
                        SendTarget::Peer(replicated.authority),
                        Channel::Unreliable,
                        &Message::Input(prediction.sample),
                    ) {
                        error!(?entity, ?e, "Failed to send input");
                    }
                    self.sim.step_body(entity, dt);
                    predictor.record_state(tick, &self.sim);
                }
                Replica::Authoritative if replicated.controller == local => {
                    if let Some(authority) = self.authority.as_mut() {
                        let sample = input_sample(&self.quantizer, entity, tick, controls);
                        authority.receive_input(local, sample);
                    }
                }
                _ => {}
            }
        }
    }

    fn check_authority(&mut self, tick: Tick) {
        let local = self.transport.local_peer();
        if self.unreachable
            || !self
                .entities
                .values()
                .any(|replicated| replicated.authority != local)
        {
            return;
        }
        if tick - self.last_heard > i64::from(self.config.authority_timeout_ticks) {
            warn!(?tick, last_heard = ?self.last_heard, "Authority is unreachable");
            self.unreachable = true;
            self.events.push(SessionEvent::AuthorityUnreachable {
                last_heard: self.last_heard,
            });
        }
    }

    /// Drop finished visual corrections and refresh the drift flags
    fn refresh(&mut self, tick: Tick) {
        let threshold = self.config.drift_threshold;
        for (&entity, replicated) in self.entities.iter_mut() {
            let state = match &mut replicated.replica {
                Replica::Predicted { correction, .. } => {
                    if correction.is_some_and(|c| c.is_finished(tick)) {
                        *correction = None;
                    }
                    self.sim.read_state(entity)
                }
                Replica::Authoritative => self.sim.read_state(entity),
                Replica::Interpolated(interpolator) => interpolator.current(),
            };
            if let Some(state) = state
                && replicated.drifting.set(state.lateral_speed().abs() > threshold)
            {
                trace!(?entity, drifting = *replicated.drifting.get(), "drift changed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use bevy_math::{Quat, Vec3};
    use hognet_link::prelude::{CrossbeamLink, LocalNetwork};
    use std::sync::Mutex;
    use hognet_physics::prelude::VehicleWorld;
    use test_log::test;

    const ALICE: PeerId = PeerId(1);
    const CAR: EntityId = EntityId(10);
    const FRAME: Duration = Duration::from_millis(20);

    type TestParticipant = Participant<VehicleWorld, CrossbeamLink>;

    fn setup() -> (TestParticipant, TestParticipant) {
        let mut links = LocalNetwork::connect(&[PeerId::HOST, ALICE]).into_iter();
        let host_link = links.next().unwrap();
        let client_link = links.next().unwrap();
        let host = Participant::new(
            SessionConfig::default(),
            VehicleWorld::default(),
            host_link,
            ParticipantKind::Host,
        );
        let client = Participant::new(
            SessionConfig::default(),
            VehicleWorld::default(),
            client_link,
            ParticipantKind::Client,
        );
        (host, client)
    }

    fn spawn_pose() -> BodyState {
        BodyState::at_pose(Vec3::new(0.0, 0.5, 0.0), Quat::IDENTITY)
    }

    #[test]
    fn test_client_cannot_spawn() {
        let (_, mut client) = setup();
        assert_eq!(
            client.host_spawn(CAR, ALICE, spawn_pose()),
            Err(SessionError::NotAuthority)
        );
        assert_eq!(
            client.host_despawn(CAR),
            Err(SessionError::NotAuthority)
        );
    }

    #[test]
    fn test_host_owned_entity_is_driven_directly() {
        let (mut host, _) = setup();
        host.host_spawn(CAR, PeerId::HOST, spawn_pose()).unwrap();
        assert_eq!(
            host.role(CAR),
            Some(Role::Owner {
                authoritative: true
            })
        );
        host.set_controls(
            CAR,
            VehicleControls {
                throttle: 1.0,
                ..Default::default()
            },
        )
        .unwrap();
        for _ in 0..20 {
            host.update(FRAME);
        }
        let state = host.render_state(CAR).unwrap();
        assert!(state.position.distance(spawn_pose().position) > 0.1);
        assert_eq!(host.authority().unwrap().last_applied(CAR), Some(Tick(20)));
    }

    #[test]
    fn test_spawn_reaches_client() {
        let (mut host, mut client) = setup();
        host.host_spawn(CAR, ALICE, spawn_pose()).unwrap();
        client.update(FRAME);
        assert_eq!(
            client.role(CAR),
            Some(Role::Owner {
                authoritative: false
            })
        );
        assert!(client.predictor(CAR).is_some());
        let events: Vec<_> = client.events().collect();
        assert!(events.contains(&SessionEvent::Spawned {
            entity: CAR,
            role: Role::Owner {
                authoritative: false
            },
        }));
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let (mut host, _) = setup();
        host.host_spawn(CAR, ALICE, spawn_pose()).unwrap();
        let sample = InputSample::new(
            CAR,
            Tick(1),
            VehicleControls {
                throttle: f32::NAN,
                ..Default::default()
            },
        );
        let result = host.handle_message(ALICE, Message::Input(sample));
        assert!(matches!(result, Err(SessionError::Validation(_))));
        assert!(host.authority().unwrap().last_applied(CAR).is_none());
    }

    #[test]
    fn test_drift_observer_notified() {
        let (mut host, _) = setup();
        host.host_spawn(CAR, PeerId::HOST, spawn_pose()).unwrap();
        let changes = Arc::new(Mutex::new(Vec::new()));
        let recorded = changes.clone();
        host.on_drift_changed(CAR, move |old, new| recorded.lock().unwrap().push((*old, *new)))
            .unwrap();

        let mut sliding = host.sim().read_state(CAR).unwrap();
        sliding.linear_velocity = Vec3::new(3.0, 0.0, 0.0);
        host.sim_mut().write_state(CAR, &sliding);
        host.update(FRAME);
        assert_eq!(host.is_drifting(CAR), Some(true));
        // grip removes the lateral velocity within a few ticks
        for _ in 0..50 {
            host.update(FRAME);
        }
        assert_eq!(host.is_drifting(CAR), Some(false));
        assert_eq!(*changes.lock().unwrap(), [(false, true), (true, false)]);
    }

    #[test]
    fn test_controls_for_unknown_entity() {
        let (mut host, _) = setup();
        assert_eq!(
            host.set_controls(CAR, VehicleControls::default()),
            Err(SessionError::UnknownEntity(CAR))
        );
    }
}
