use alloc::vec::Vec;
use bevy_math::{Quat, Vec3};
use core::time::Duration;
use hognet::prelude::*;
use hognet_physics::prelude::*;
use tracing::info;

pub type TestParticipant = Participant<VehicleWorld, CrossbeamLink>;

#[derive(Debug, Clone)]
pub struct StepperConfig {
    pub clients: usize,
    pub session: SessionConfig,
    pub frame_duration: Duration,
    /// Network conditions applied on every link, in both directions
    pub conditioner: Option<LinkConditionerConfig>,
}

impl StepperConfig {
    pub fn single() -> Self {
        Self::with_clients(1)
    }

    pub fn with_clients(clients: usize) -> Self {
        let session = SessionConfig::default();
        Self {
            clients,
            frame_duration: session.tick_duration,
            session,
            conditioner: None,
        }
    }
}

/// Stepper with:
/// - 1 host running the authority
/// - n clients, with peer ids `1..=n`
///
/// All connected via crossbeam channels. Every frame, the clients update before the host.
pub struct Stepper {
    pub host: TestParticipant,
    pub clients: Vec<TestParticipant>,
    pub frame_duration: Duration,
    pub tick_duration: Duration,
}

impl Stepper {
    pub fn single() -> Self {
        Self::from_config(StepperConfig::single())
    }

    pub fn from_config(config: StepperConfig) -> Self {
        let peers: Vec<PeerId> = core::iter::once(PeerId::HOST)
            .chain((0..config.clients).map(Self::client_peer))
            .collect();
        let mut links = LocalNetwork::connect(&peers).into_iter().map(|link| {
            match config.conditioner.clone() {
                Some(conditioner) => link.with_conditioner(conditioner),
                None => link,
            }
        });
        let participant = |link: CrossbeamLink, kind: ParticipantKind| {
            let world = VehicleWorld::new(
                VehicleConfig::default(),
                Quantizer::new(config.session.quantize.clone()),
            );
            Participant::new(config.session.clone(), world, link, kind)
        };
        let host = links
            .next()
            .map(|link| participant(link, ParticipantKind::Host))
            .expect("the host link is always created");
        let clients = links
            .map(|link| participant(link, ParticipantKind::Client))
            .collect();
        Self {
            host,
            clients,
            frame_duration: config.frame_duration,
            tick_duration: config.session.tick_duration,
        }
    }

    pub fn client_peer(id: usize) -> PeerId {
        PeerId(id as u64 + 1)
    }

    pub fn client(&self, id: usize) -> &TestParticipant {
        &self.clients[id]
    }

    pub fn client_mut(&mut self, id: usize) -> &mut TestParticipant {
        &mut self.clients[id]
    }

    /// Spawn a vehicle at rest at `position`, facing `yaw` radians around the vertical axis
    pub fn spawn(&mut self, entity: EntityId, controller: PeerId, position: Vec3, yaw: f32) {
        self.host
            .host_spawn(
                entity,
                controller,
                BodyState::at_pose(position, Quat::from_rotation_y(yaw)),
            )
            .unwrap();
    }

    /// Advance every participant by one frame duration
    pub fn frame_step(&mut self, n: usize) {
        for _ in 0..n {
            info!(
                client_tick = ?self.clients.first().map(|client| client.tick() + 1),
                host_tick = ?(self.host.tick() + 1),
                "Frame step"
            );
            self.client_step(1);
            self.host.update(self.frame_duration);
        }
    }

    /// Advance the clients only, as if the host had stopped
    pub fn client_step(&mut self, n: usize) {
        for _ in 0..n {
            self.clients
                .iter_mut()
                .for_each(|client| client.update(self.frame_duration));
        }
    }

    pub fn client_events(&mut self, id: usize) -> Vec<SessionEvent> {
        self.clients[id].events().collect()
    }

    pub fn host_events(&mut self) -> Vec<SessionEvent> {
        self.host.events().collect()
    }
}
