use crate::stepper::*;
use bevy_math::{Quat, Vec3};
use core::f32::consts::{FRAC_PI_2, PI};
use hognet::prelude::*;
use test_log::test;

const RED: EntityId = EntityId(1);
const BLUE: EntityId = EntityId(2);

const THROTTLE: VehicleControls = VehicleControls {
    throttle: 1.0,
    brake: 0.0,
    steer: 0.0,
    jump: false,
};

/// Two owners drive head-on into each other. The authority resolves the collision and sends
/// both owners a priority snapshot, which they apply even though they already agree with it
#[test]
fn test_head_on_collision_is_prioritised() {
    let mut stepper = Stepper::from_config(StepperConfig::with_clients(2));
    stepper.spawn(RED, Stepper::client_peer(0), Vec3::new(0.0, 0.5, -5.0), 0.0);
    stepper.spawn(BLUE, Stepper::client_peer(1), Vec3::new(0.0, 0.5, 5.0), PI);
    stepper.frame_step(1);
    assert_eq!(stepper.client(0).role(BLUE), Some(Role::Observer));
    assert_eq!(stepper.client(1).role(RED), Some(Role::Observer));

    stepper.client_mut(0).set_controls(RED, THROTTLE).unwrap();
    stepper.client_mut(1).set_controls(BLUE, THROTTLE).unwrap();

    let mut record = None;
    for _ in 0..100 {
        stepper.frame_step(1);
        record = stepper.host_events().into_iter().find_map(|event| match event {
            SessionEvent::Collision(record) => Some(record),
            _ => None,
        });
        if record.is_some() {
            break;
        }
    }
    let record = record.expect("the vehicles should have collided");
    assert_eq!((record.a, record.b), (RED, BLUE));
    assert!(record.closing_speed > 0.0);
    // RED is pushed back towards -z
    assert!(record.impulse.z < 0.0);

    // the priority snapshots are sent on the next tick and received on the one after
    stepper.client_events(0);
    stepper.client_events(1);
    stepper.frame_step(2);
    for (client, entity) in [(0, RED), (1, BLUE)] {
        let reconciled = stepper.client_events(client).into_iter().any(|event| {
            matches!(event, SessionEvent::Reconciled { entity: e, .. } if e == entity)
        });
        assert!(reconciled, "client {client} was not corrected");
    }

    // after the correction each owner agrees with the authority again
    let host = stepper.host.sim().read_state(RED).unwrap();
    let owner = stepper.client(0).sim().read_state(RED).unwrap();
    assert!(owner.position_error(&host) < 0.5);
}

/// Bodies pushing against each other only trigger one collision until the cooldown expires
#[test]
fn test_collision_cooldown() {
    let mut stepper = Stepper::from_config(StepperConfig::with_clients(2));
    stepper.spawn(RED, Stepper::client_peer(0), Vec3::new(0.0, 0.5, -2.0), 0.0);
    stepper.spawn(BLUE, Stepper::client_peer(1), Vec3::new(0.0, 0.5, 2.0), PI);
    stepper.frame_step(1);
    stepper.client_mut(0).set_controls(RED, THROTTLE).unwrap();
    stepper.client_mut(1).set_controls(BLUE, THROTTLE).unwrap();

    let count = |events: Vec<SessionEvent>| {
        events
            .into_iter()
            .filter(|event| matches!(event, SessionEvent::Collision(_)))
            .count()
    };
    let mut first = 0;
    for _ in 0..60 {
        stepper.frame_step(1);
        first += count(stepper.host_events());
        if first > 0 {
            break;
        }
    }
    assert_eq!(first, 1);

    // both owners keep driving into each other
    stepper.frame_step(20);
    assert_eq!(count(stepper.host_events()), 0);
}

/// A collision resolved on a broadcast tick still reaches the two owners before any observer
#[test]
fn test_collision_on_broadcast_tick() {
    let mut stepper = Stepper::from_config(StepperConfig::with_clients(3));
    stepper.spawn(RED, Stepper::client_peer(0), Vec3::new(-30.0, 0.5, 0.0), 0.0);
    stepper.spawn(BLUE, Stepper::client_peer(1), Vec3::new(30.0, 0.5, 0.0), 0.0);
    stepper.frame_step(1);
    // snapshots are broadcast on ticks that are a multiple of 3
    while stepper.host.tick().0 % 3 != 2 {
        stepper.frame_step(1);
    }

    // the vehicles are placed so that they touch on the next tick
    stepper
        .host
        .host_respawn(
            RED,
            BodyState {
                linear_velocity: Vec3::new(10.0, 0.0, 0.0),
                ..BodyState::at_pose(Vec3::new(-1.6, 0.5, 0.0), Quat::from_rotation_y(FRAC_PI_2))
            },
        )
        .unwrap();
    stepper
        .host
        .host_respawn(
            BLUE,
            BodyState {
                linear_velocity: Vec3::new(-10.0, 0.0, 0.0),
                ..BodyState::at_pose(Vec3::new(1.6, 0.5, 0.0), Quat::from_rotation_y(-FRAC_PI_2))
            },
        )
        .unwrap();
    stepper.frame_step(1);
    let collisions: Vec<CollisionRecord> = stepper
        .host_events()
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::Collision(record) => Some(record),
            _ => None,
        })
        .collect();
    assert_eq!(collisions.len(), 1);
    let tick = collisions[0].tick;
    assert_eq!(tick.0 % 3, 0);

    // the owners are corrected first, the observer only sees the regular broadcasts
    for _ in 0..2 {
        stepper.frame_step(1);
        for entity in [RED, BLUE] {
            let status = stepper.client(2).interpolation_status(entity).unwrap();
            assert!(status.target_tick < tick);
        }
    }
    for (client, entity) in [(0, RED), (1, BLUE)] {
        let reconciled = stepper.client_events(client).into_iter().any(|event| {
            matches!(event, SessionEvent::Reconciled { entity: e, .. } if e == entity)
        });
        assert!(reconciled, "client {client} was not corrected");
    }

    stepper.frame_step(2);
    let status = stepper.client(2).interpolation_status(RED).unwrap();
    assert_eq!(status.target_tick, tick + 3);
}
