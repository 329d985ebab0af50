use crate::stepper::*;
use bevy_math::Vec3;
use bytes::Bytes;
use hognet::prelude::*;
use test_log::test;

const CAR: EntityId = EntityId(1);

fn setup() -> Stepper {
    let mut stepper = Stepper::single();
    stepper.spawn(CAR, Stepper::client_peer(0), Vec3::new(0.0, 0.5, 0.0), 0.0);
    stepper.frame_step(1);
    stepper.host_events();
    stepper
}

fn send_input(stepper: &mut Stepper, tick: u32, controls: VehicleControls) {
    stepper
        .client_mut(0)
        .transport_mut()
        .send(
            SendTarget::Peer(PeerId::HOST),
            Channel::Unreliable,
            &Message::Input(InputSample::new(CAR, Tick(tick), controls)),
        )
        .unwrap();
}

fn rejections(stepper: &mut Stepper) -> Vec<RejectReason> {
    stepper
        .host_events()
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::MessageRejected { reason, .. } => Some(reason),
            _ => None,
        })
        .collect()
}

#[test]
fn test_non_finite_input_rejected() {
    let mut stepper = setup();
    let before = stepper.host.sim().read_state(CAR).unwrap();
    send_input(
        &mut stepper,
        2,
        VehicleControls {
            throttle: f32::NAN,
            ..Default::default()
        },
    );
    stepper.host.update(stepper.frame_duration);

    assert_eq!(
        rejections(&mut stepper),
        [RejectReason::Invalid(ValidationError::NonFinite {
            field: "throttle"
        })]
    );
    // the authority never saw it
    assert_eq!(stepper.host.authority().unwrap().last_applied(CAR), Some(Tick(1)));
    assert_eq!(stepper.host.sim().read_state(CAR).unwrap(), before);
}

#[test]
fn test_input_too_far_in_the_future_rejected() {
    let mut stepper = setup();
    send_input(&mut stepper, 1_000, VehicleControls::default());
    stepper.host.update(stepper.frame_duration);
    assert!(matches!(
        rejections(&mut stepper).as_slice(),
        [RejectReason::Invalid(ValidationError::FutureTick { .. })]
    ));
}

#[test]
fn test_malformed_payload_rejected() {
    let mut stepper = setup();
    stepper
        .client_mut(0)
        .transport_mut()
        .send_raw(
            PeerId::HOST,
            Channel::Unreliable,
            Bytes::from_static(&[0xff, 0x01]),
        )
        .unwrap();
    // the next valid message still goes through
    send_input(&mut stepper, 2, VehicleControls::default());
    stepper.host.update(stepper.frame_duration);
    assert_eq!(rejections(&mut stepper), [RejectReason::Malformed]);
    assert_eq!(stepper.host.authority().unwrap().last_applied(CAR), Some(Tick(2)));
}

/// Only the controller of an entity may drive it
#[test]
fn test_input_from_observer_ignored() {
    let mut stepper = Stepper::from_config(StepperConfig::with_clients(2));
    stepper.spawn(CAR, Stepper::client_peer(0), Vec3::new(0.0, 0.5, 0.0), 0.0);
    stepper.frame_step(1);
    stepper
        .client_mut(1)
        .transport_mut()
        .send(
            SendTarget::Peer(PeerId::HOST),
            Channel::Unreliable,
            &Message::Input(InputSample::new(
                CAR,
                Tick(2),
                VehicleControls {
                    throttle: 1.0,
                    ..Default::default()
                },
            )),
        )
        .unwrap();
    stepper.host.update(stepper.frame_duration);
    assert_eq!(stepper.host.authority().unwrap().last_applied(CAR), Some(Tick(1)));
    let state = stepper.host.sim().read_state(CAR).unwrap();
    assert_eq!(state.motor_torque, 0.0);
}
