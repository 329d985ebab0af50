use crate::stepper::*;
use bevy_math::Vec3;
use hognet::prelude::*;
use test_log::test;

const CAR: EntityId = EntityId(1);

const THROTTLE: VehicleControls = VehicleControls {
    throttle: 1.0,
    brake: 0.0,
    steer: 0.0,
    jump: false,
};

fn setup() -> Stepper {
    let mut stepper = Stepper::single();
    stepper.spawn(CAR, Stepper::client_peer(0), Vec3::new(0.0, 0.5, 0.0), 0.0);
    stepper.frame_step(1);
    stepper
}

/// With a perfect link, the owner's prediction is exactly the authoritative state and no
/// correction ever happens
#[test]
fn test_prediction_matches_authority() {
    let mut stepper = setup();
    assert_eq!(
        stepper.client(0).role(CAR),
        Some(Role::Owner {
            authoritative: false
        })
    );
    assert_eq!(stepper.host.role(CAR), Some(Role::Authority));

    let steer = VehicleControls {
        steer: 0.4,
        ..THROTTLE
    };
    stepper.client_mut(0).set_controls(CAR, THROTTLE).unwrap();
    stepper.frame_step(20);
    stepper.client_mut(0).set_controls(CAR, steer).unwrap();
    stepper.frame_step(20);

    let client = stepper.client(0).sim().read_state(CAR).unwrap();
    let host = stepper.host.sim().read_state(CAR).unwrap();
    assert!(client.position_error(&host) < 1e-4);
    assert!(client.position.distance(Vec3::new(0.0, 0.5, 0.0)) > 1.0);

    let events = stepper.client_events(0);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, SessionEvent::Reconciled { .. })),
        "unexpected correction: {events:?}"
    );
    // the snapshots acknowledge our inputs, which keeps the buffer short
    let predictor = stepper.client(0).predictor(CAR).unwrap();
    assert!(predictor.acknowledged().is_some());
    assert!(predictor.inputs().len() <= 4);
}

/// The authority disagrees with the prediction: the owner snaps to the authoritative state and
/// replays the inputs that were not acknowledged yet
#[test]
fn test_divergence_is_reconciled() {
    let mut stepper = setup();
    stepper.client_mut(0).set_controls(CAR, THROTTLE).unwrap();
    stepper.frame_step(10);
    stepper.client_events(0);

    // push the authoritative body sideways, the owner cannot predict this
    let mut moved = stepper.host.sim().read_state(CAR).unwrap();
    moved.position.x += 2.0;
    stepper.host.sim_mut().write_state(CAR, &moved);
    stepper.frame_step(4);

    let events = stepper.client_events(0);
    let divergence = events
        .iter()
        .find_map(|event| match event {
            SessionEvent::Reconciled { divergence, .. } => *divergence,
            _ => None,
        })
        .expect("the prediction should have been corrected");
    assert!(divergence.position > 1.5);

    stepper.frame_step(3);
    let client = stepper.client(0).sim().read_state(CAR).unwrap();
    let host = stepper.host.sim().read_state(CAR).unwrap();
    assert!(client.position_error(&host) < 1e-3);
}

/// Under latency the owner keeps the unacknowledged inputs and still converges to the authority
#[test]
fn test_prediction_under_latency() {
    let mut stepper = Stepper::from_config(StepperConfig {
        conditioner: Some(LinkConditionerConfig::new(3, 0, 0.0)),
        ..StepperConfig::single()
    });
    stepper.spawn(CAR, Stepper::client_peer(0), Vec3::new(0.0, 0.5, 0.0), 0.0);
    stepper.frame_step(5);
    assert!(stepper.client(0).predictor(CAR).is_some());

    stepper.client_mut(0).set_controls(CAR, THROTTLE).unwrap();
    stepper.frame_step(30);
    // the inputs of the last round trip have not been acknowledged yet
    let predictor = stepper.client(0).predictor(CAR).unwrap();
    assert!(predictor.inputs().len() >= 6);
    assert!(predictor.acknowledged().is_some());

    // brake to a stop and let the last inputs reach the authority
    let brake = VehicleControls {
        brake: 1.0,
        ..Default::default()
    };
    stepper.client_mut(0).set_controls(CAR, brake).unwrap();
    stepper.frame_step(150);
    let client = stepper.client(0).sim().read_state(CAR).unwrap();
    let host = stepper.host.sim().read_state(CAR).unwrap();
    assert!(client.linear_velocity.length() < 0.2);
    assert!(client.position_error(&host) < 0.05);
}

/// A correction whose replay goes through a jump still jumps, so the owner does not need to be
/// corrected a second time
#[test]
fn test_correction_replays_jump() {
    let mut stepper = Stepper::from_config(StepperConfig {
        conditioner: Some(LinkConditionerConfig::new(3, 0, 0.0)),
        ..StepperConfig::single()
    });
    stepper.spawn(CAR, Stepper::client_peer(0), Vec3::new(0.0, 0.5, 0.0), 0.0);
    stepper.frame_step(5);
    stepper.client_mut(0).set_controls(CAR, THROTTLE).unwrap();
    stepper.frame_step(30);
    // jump on a tick just before a broadcast, so that the next acknowledgement precedes it
    while stepper.host.tick().0 % 3 != 1 {
        stepper.frame_step(1);
    }
    stepper.client_events(0);

    let jump = VehicleControls {
        jump: true,
        ..THROTTLE
    };
    stepper.client_mut(0).set_controls(CAR, jump).unwrap();
    stepper.frame_step(1);
    stepper.client_mut(0).set_controls(CAR, THROTTLE).unwrap();
    assert!(stepper.client(0).sim().read_state(CAR).unwrap().position.y > 0.5);

    // the authority has not received the jump yet, the correction comes back before it
    let mut moved = stepper.host.sim().read_state(CAR).unwrap();
    assert!(moved.jump_cooldown.is_ready());
    moved.position.x += 2.0;
    stepper.host.sim_mut().write_state(CAR, &moved);

    stepper.frame_step(40);
    let corrections = stepper
        .client_events(0)
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::Reconciled { .. }))
        .count();
    assert_eq!(corrections, 1);

    let brake = VehicleControls {
        brake: 1.0,
        ..Default::default()
    };
    stepper.client_mut(0).set_controls(CAR, brake).unwrap();
    stepper.frame_step(150);
    let client = stepper.client(0).sim().read_state(CAR).unwrap();
    let host = stepper.host.sim().read_state(CAR).unwrap();
    assert!(client.position_error(&host) < 0.05);
}
