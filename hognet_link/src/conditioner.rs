//! Contains the `LinkConditioner` struct which can be used to simulate network conditions
use crate::ready_buffer::ReadyBuffer;
use hognet_core::tick::Tick;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Contains configuration required to initialize a LinkConditioner
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkConditionerConfig {
    /// Delay to receive incoming messages, in ticks
    pub incoming_latency: u32,
    /// The maximum additional random latency to delay received incoming
    /// messages, in ticks. This may be added OR subtracted from the
    /// latency determined in the `incoming_latency` property above
    pub incoming_jitter: u32,
    /// The % chance that an incoming packet will be dropped.
    /// Represented as a value between 0 and 1
    pub incoming_loss: f32,
    /// Seed of the random generator, so that a conditioned run can be reproduced
    pub seed: u64,
}

impl LinkConditionerConfig {
    pub fn new(incoming_latency: u32, incoming_jitter: u32, incoming_loss: f32) -> Self {
        LinkConditionerConfig {
            incoming_latency,
            incoming_jitter,
            incoming_loss,
            seed: 0,
        }
    }

    /// Creates a new LinkConditioner that simulates a connection which is in a
    /// good condition (40ms at 50Hz)
    pub fn good_condition() -> Self {
        Self::new(2, 0, 0.002)
    }

    /// Creates a new `LinkConditioner` that simulates a connection which is in an
    /// average condition
    pub fn average_condition() -> Self {
        Self::new(5, 1, 0.02)
    }

    /// Creates a new `LinkConditioner` that simulates a connection which is in an
    /// poor condition
    pub fn poor_condition() -> Self {
        Self::new(10, 2, 0.04)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone)]
pub struct LinkConditioner<P> {
    config: LinkConditionerConfig,
    rng: StdRng,
    time_queue: ReadyBuffer<Tick, P>,
}

impl<P> LinkConditioner<P> {
    pub fn new(config: LinkConditionerConfig) -> Self {
        LinkConditioner {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            time_queue: ReadyBuffer::new(),
        }
    }

    /// Add latency/jitter/loss to a packet received at `now`.
    ///
    /// Reliable packets are delayed but never dropped.
    pub(crate) fn condition_packet(&mut self, packet: P, now: Tick, droppable: bool) {
        if droppable && self.rng.random_range(0.0..1.0) < self.config.incoming_loss {
            return;
        }
        let mut latency = i64::from(self.config.incoming_latency);
        if self.config.incoming_jitter > 0 {
            let jitter = i64::from(self.config.incoming_jitter);
            latency += self.rng.random_range(-jitter..=jitter);
        }
        let ready = now + u32::try_from(latency.max(0)).unwrap_or(u32::MAX);
        self.time_queue.push(ready, packet);
    }

    /// Check if a packet is ready to be returned
    pub(crate) fn pop_packet(&mut self, now: Tick) -> Option<P> {
        self.time_queue.pop_item(&now).map(|(_, packet)| packet)
    }

    pub fn pending(&self) -> usize {
        self.time_queue.len()
    }
}
