use crate::stepper::*;
use bevy_math::Vec3;
use hognet::prelude::*;
use test_log::test;

const CAR: EntityId = EntityId(1);
const SPAWN: Vec3 = Vec3::new(0.0, 0.5, 0.0);

/// Observers render a remote vehicle by blending between snapshots: the render trails the
/// authority, never moves backwards, and reaches the last snapshot once it stops arriving
#[test]
fn test_observer_interpolates_remote_vehicle() {
    let mut stepper = Stepper::from_config(StepperConfig::with_clients(2));
    stepper.spawn(CAR, Stepper::client_peer(0), SPAWN, 0.0);
    stepper.frame_step(1);
    assert_eq!(stepper.client(1).role(CAR), Some(Role::Observer));
    assert_eq!(stepper.client(1).render_state(CAR).unwrap().position, SPAWN);

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

    let mut previous = 0.0;
    let mut target = stepper.client(1).interpolation_status(CAR).unwrap().target_tick;
    let mut targets = 0;
    for _ in 0..40 {
        stepper.frame_step(1);
        // a snapshot received during this frame has not been blended towards yet
        let status = stepper.client(1).interpolation_status(CAR).unwrap();
        if status.target_tick != target {
            assert_eq!(status.fraction, 0.0);
            target = status.target_tick;
            targets += 1;
        }
        let rendered = stepper.client(1).render_state(CAR).unwrap();
        let host = stepper.host.sim().read_state(CAR).unwrap();
        let travelled = rendered.position.distance(SPAWN);
        assert!(travelled >= previous - 1e-4, "the render moved backwards");
        assert!(travelled <= host.position.distance(SPAWN) + 1e-4);
        previous = travelled;
    }
    assert!(previous > 0.5);
    assert!(targets > 5);

    let status = stepper.client(1).interpolation_status(CAR).unwrap();
    assert_eq!(status.target_tick.0 % 3, 0);
    assert!((0.0..=1.0).contains(&status.fraction));
}

/// Without new snapshots the observer holds the last received state instead of extrapolating
#[test]
fn test_observer_holds_last_snapshot() {
    let mut stepper = Stepper::from_config(StepperConfig::with_clients(2));
    stepper.spawn(CAR, Stepper::client_peer(0), SPAWN, 0.0);
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
    stepper.frame_step(20);

    // the host stops, so no snapshot is sent anymore
    stepper.client_step(10);
    let status = stepper.client(1).interpolation_status(CAR).unwrap();
    assert_eq!(status.fraction, 1.0);
    let held = stepper.client(1).render_state(CAR).unwrap();
    stepper.client_step(10);
    assert_eq!(stepper.client(1).render_state(CAR).unwrap(), held);
}

#[test]
fn test_drift_flag_is_replicated() {
    let mut stepper = Stepper::from_config(StepperConfig::with_clients(2));
    stepper.spawn(CAR, Stepper::client_peer(0), SPAWN, 0.0);
    stepper.frame_step(1);
    assert_eq!(stepper.client(1).is_drifting(CAR), Some(false));

    // give the authoritative body a sideways velocity
    let mut sliding = stepper.host.sim().read_state(CAR).unwrap();
    sliding.linear_velocity = Vec3::new(5.0, 0.0, 0.0);
    stepper.host.sim_mut().write_state(CAR, &sliding);
    assert!(sliding.lateral_speed().abs() > 0.4);

    // the next broadcast carries the lateral velocity, and the observer blends towards it
    stepper.frame_step(8);
    assert_eq!(stepper.host.is_drifting(CAR), Some(true));
    let mut flips = 0;
    for _ in 0..5 {
        if stepper.client(1).is_drifting(CAR) == Some(true) {
            flips += 1;
        }
        stepper.frame_step(1);
    }
    assert!(flips > 0);
}
