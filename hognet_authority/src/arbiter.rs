//! Resolve contacts between vehicles on the authority.
//!
//! A contact produces two opposite impulses. At low closing speed the impulse follows the contact
//! normal (a deflection); at high closing speed it bends towards the heading of the faster
//! vehicle (a ram). Both bodies are then scheduled for a priority snapshot one tick later, once
//! the solver has settled, so that their controllers are corrected before the next broadcast.
use crate::config::CollisionConfig;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use bevy_math::Vec3;
use hognet_core::prelude::*;
use hognet_link::ready_buffer::ReadyBuffer;
use tracing::{debug, trace};

/// Result of resolving one contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRecord {
    pub tick: Tick,
    pub a: EntityId,
    pub b: EntityId,
    /// Relative speed of the two bodies along the contact normal, positive when approaching
    pub closing_speed: f32,
    /// Impulse applied to `a`. `b` receives the exact opposite
    pub impulse: Vec3,
    /// The faster of the two bodies, if one was faster
    pub rammer: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hit {
    by: EntityId,
    tick: Tick,
}

#[derive(Debug, Clone)]
pub struct CollisionArbiter {
    config: CollisionConfig,
    quantizer: Quantizer,
    /// Keyed by unordered pair, smallest id first
    cooldowns: BTreeMap<(EntityId, EntityId), Cooldown>,
    /// Entities that need a priority snapshot, keyed by the tick at which it is due
    due: ReadyBuffer<Tick, EntityId>,
    last_hit: BTreeMap<EntityId, Hit>,
}

fn pair(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl CollisionArbiter {
    pub fn new(config: CollisionConfig, quantizer: Quantizer) -> Self {
        Self {
            config,
            quantizer,
            cooldowns: BTreeMap::new(),
            due: ReadyBuffer::new(),
            last_hit: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Resolve a contact detected during the step of `tick`.
    ///
    /// Returns `None` if the contact was debounced, or if the bodies are separating and the
    /// solver reported no impulse.
    pub fn on_contact<S: Simulation>(
        &mut self,
        sim: &mut S,
        contact: &ContactEvent,
        tick: Tick,
    ) -> Option<CollisionRecord> {
        let (a, b) = (contact.a, contact.b);
        if a == b {
            return None;
        }
        if self
            .cooldowns
            .get(&pair(a, b))
            .is_some_and(|cooldown| !cooldown.is_ready())
        {
            trace!(?a, ?b, "contact ignored, pair is cooling down");
            return None;
        }
        let (state_a, state_b) = (sim.read_state(a)?, sim.read_state(b)?);
        let (mass_a, mass_b) = (sim.mass(a)?, sim.mass(b)?);
        let q = &self.quantizer;

        let mut normal = q.direction(contact.normal);
        if normal == Vec3::ZERO {
            normal = q.direction(state_b.position - state_a.position);
        }
        if normal == Vec3::ZERO {
            return None;
        }

        let closing_speed = q.dot(state_a.linear_velocity - state_b.linear_velocity, normal);
        let reduced_mass = q.float(mass_a * mass_b / (mass_a + mass_b));
        let synthesized =
            q.float((1.0 + self.config.restitution) * closing_speed.max(0.0) * reduced_mass);
        let magnitude = q.float(contact.impulse.max(synthesized) * self.config.impulse_scale);
        if magnitude <= 0.0 {
            return None;
        }

        // heading of the faster body, expressed as a push from `a` towards `b`
        let speed_a = q.float(state_a.linear_velocity.length());
        let speed_b = q.float(state_b.linear_velocity.length());
        let (rammer, heading) = if speed_a > speed_b {
            (Some(a), q.direction(state_a.forward()))
        } else if speed_b > speed_a {
            (Some(b), -q.direction(state_b.forward()))
        } else {
            (None, normal)
        };
        let blend = self.heading_blend(closing_speed);
        let mut direction = q.direction(normal.lerp(heading, blend));
        if direction == Vec3::ZERO {
            direction = normal;
        }

        let impulse_b = q.vec3(direction * magnitude);
        let impulse_a = -impulse_b;
        sim.apply_impulse(a, impulse_a);
        sim.apply_impulse(b, impulse_b);

        let mut cooldown = Cooldown::default();
        cooldown.start(self.config.cooldown_ticks);
        self.cooldowns.insert(pair(a, b), cooldown);
        // wait one step for the solver to settle before correcting the controllers
        self.due.push(tick + 1, a);
        self.due.push(tick + 1, b);

        match rammer {
            Some(rammer) => {
                let victim = if rammer == a { b } else { a };
                self.last_hit.insert(victim, Hit { by: rammer, tick });
            }
            None => {
                self.last_hit.insert(a, Hit { by: b, tick });
                self.last_hit.insert(b, Hit { by: a, tick });
            }
        }

        debug!(
            ?a,
            ?b,
            ?tick,
            closing_speed,
            magnitude,
            blend,
            ?rammer,
            "resolved collision"
        );
        Some(CollisionRecord {
            tick,
            a,
            b,
            closing_speed,
            impulse: impulse_a,
            rammer,
        })
    }

    /// Weight of the rammer's heading in the impulse direction
    fn heading_blend(&self, closing_speed: f32) -> f32 {
        let CollisionConfig {
            ram_speed_low: low,
            ram_speed_high: high,
            max_heading_blend,
            ..
        } = self.config;
        let ratio = if high > low {
            ((closing_speed - low) / (high - low)).clamp(0.0, 1.0)
        } else if closing_speed >= high {
            1.0
        } else {
            0.0
        };
        self.quantizer
            .float(ratio * max_heading_blend.clamp(0.0, 1.0))
    }

    /// Advance the pair cooldowns by one tick
    pub fn tick(&mut self) {
        self.cooldowns.retain(|_, cooldown| {
            cooldown.tick();
            !cooldown.is_ready()
        });
    }

    /// Entities whose priority snapshot is due at `tick`, each listed once, in id order
    pub fn take_due(&mut self, tick: Tick) -> Vec<EntityId> {
        self.due
            .drain_until(&tick)
            .into_iter()
            .map(|(_, entity)| entity)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// True while `entity` waits for its priority snapshot
    pub fn is_pending(&self, entity: EntityId) -> bool {
        self.due.iter().any(|due| *due == entity)
    }

    /// Forget every cooldown and attribution involving `entity`
    pub fn despawn(&mut self, entity: EntityId) {
        self.cooldowns.retain(|(a, b), _| *a != entity && *b != entity);
        self.last_hit
            .retain(|victim, hit| *victim != entity && hit.by != entity);
    }

    /// Who last hit `entity`, if that happened within the attribution window
    pub fn last_hit_by(&self, entity: EntityId, now: Tick) -> Option<EntityId> {
        self.last_hit
            .get(&entity)
            .filter(|hit| now - hit.tick <= i64::from(self.config.attribution_ticks))
            .map(|hit| hit.by)
    }
}
