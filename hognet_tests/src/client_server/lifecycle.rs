use crate::stepper::*;
use bevy_math::{Quat, Vec3};
use hognet::prelude::*;
use test_log::test;

const CAR: EntityId = EntityId(1);

fn setup(clients: usize) -> Stepper {
    let mut stepper = Stepper::from_config(StepperConfig::with_clients(clients));
    stepper.spawn(CAR, Stepper::client_peer(0), Vec3::new(0.0, 0.5, 0.0), 0.0);
    stepper.frame_step(1);
    stepper
        .client_mut(0)
        .set_controls(
            CAR,
            VehicleControls {
                throttle: 1.0,
                ..Default::default()
            },
        )
        .unwrap();
    stepper.frame_step(10);
    stepper
}

#[test]
fn test_despawn_replicated() {
    let mut stepper = setup(2);
    assert_eq!(stepper.host.host_despawn(CAR), Ok(true));
    assert_eq!(stepper.host.host_despawn(CAR), Ok(false));
    assert!(!stepper.host.sim().contains(CAR));
    stepper.frame_step(1);

    for id in 0..2 {
        assert!(stepper.client(id).role(CAR).is_none());
        assert!(stepper.client(id).render_state(CAR).is_none());
        assert!(
            stepper
                .client_events(id)
                .contains(&SessionEvent::Despawned { entity: CAR })
        );
    }
    assert!(!stepper.client(0).sim().contains(CAR));
    assert_eq!(
        stepper.client_mut(0).set_controls(CAR, VehicleControls::default()),
        Err(SessionError::UnknownEntity(CAR))
    );
}

#[test]
fn test_respawn_resets_owner_and_observer() {
    let mut stepper = setup(2);
    let pose = BodyState::at_pose(Vec3::new(20.0, 0.5, 20.0), Quat::from_rotation_y(1.0));
    stepper.client_mut(0).set_controls(CAR, VehicleControls::default()).unwrap();
    let snapshot = stepper.host.host_respawn(CAR, pose).unwrap();
    assert!(snapshot.body.position_error(&pose) < 1e-3);
    stepper.frame_step(1);

    // the owner starts over from the respawn pose, with no inputs left to replay
    let owner = stepper.client(0).sim().read_state(CAR).unwrap();
    assert!(owner.position_error(&pose) < 0.1);
    assert_eq!(stepper.client(0).predictor(CAR).unwrap().inputs().len(), 1);
    // the observer jumps straight to it, without blending across the map
    let observer = stepper.client(1).render_state(CAR).unwrap();
    assert_eq!(observer, snapshot.body);
    assert!(
        stepper
            .client_events(1)
            .contains(&SessionEvent::Respawned { entity: CAR })
    );

    assert_eq!(
        stepper.host.host_respawn(EntityId(99), pose),
        Err(SessionError::UnknownEntity(EntityId(99)))
    );
}

fn unreachable_events(stepper: &mut Stepper) -> usize {
    stepper
        .client_events(0)
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::AuthorityUnreachable { .. }))
        .count()
}

#[test]
fn test_authority_unreachable_reported_once() {
    let mut stepper = setup(1);
    stepper.client_events(0);
    let timeout = stepper.host.config().authority_timeout_ticks as usize;

    stepper.client_step(timeout - 20);
    assert_eq!(unreachable_events(&mut stepper), 0);
    stepper.client_step(40);
    assert_eq!(unreachable_events(&mut stepper), 1);
    stepper.client_step(100);
    assert_eq!(unreachable_events(&mut stepper), 0);
}

/// Without acknowledgements the owner's buffer fills up, and the oldest unacknowledged inputs are
/// evicted and reported
#[test]
fn test_unacknowledged_inputs_evicted() {
    let mut stepper = setup(1);
    stepper.client_events(0);
    let capacity = stepper.host.config().input.capacity;

    stepper.client_step(capacity + 10);
    let evicted: Vec<Tick> = stepper
        .client_events(0)
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::InputEvicted { tick, .. } => Some(tick),
            _ => None,
        })
        .collect();
    assert!(!evicted.is_empty());
    assert!(evicted.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(
        stepper.client(0).predictor(CAR).unwrap().inputs().len(),
        capacity
    );
}
