use alloc::collections::VecDeque;
use core::fmt::{Display, Formatter};
use hognet_core::prelude::{InputSample, Tick};
use smallvec::SmallVec;
use tracing::trace;

/// An input removed from the buffer to make room for a newer one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eviction {
    pub tick: Tick,
    pub sample: InputSample,
}

/// Evictions caused by a single insertion; almost always zero or one
pub type Evictions = SmallVec<[Eviction; 1]>;

/// Bounded store of input samples, kept sorted by tick.
///
/// Each tick appears at most once: a later insertion at the same tick replaces the earlier sample.
/// When full, the lowest ticks are evicted first, regardless of insertion order.
#[derive(Debug, Clone)]
pub struct InputHistoryBuffer {
    // ordered from oldest (front) to newest (back), ticks are unique
    buffer: VecDeque<(Tick, InputSample)>,
    capacity: usize,
}

impl InputHistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Insert or overwrite the sample for `tick`, then evict the lowest ticks until the buffer is
    /// back within capacity.
    ///
    /// Returns one [`Eviction`] per removed entry.
    pub fn put(&mut self, tick: Tick, sample: InputSample) -> Evictions {
        let partition = self.buffer.partition_point(|(t, _)| *t < tick);
        match self.buffer.get_mut(partition) {
            Some((t, existing)) if *t == tick => *existing = sample,
            _ => self.buffer.insert(partition, (tick, sample)),
        }
        let mut evictions = Evictions::new();
        while self.buffer.len() > self.capacity {
            if let Some((tick, sample)) = self.buffer.pop_front() {
                trace!(?tick, "evicting input");
                evictions.push(Eviction { tick, sample });
            }
        }
        evictions
    }

    pub fn get(&self, tick: Tick) -> Option<&InputSample> {
        let partition = self.buffer.partition_point(|(t, _)| *t < tick);
        match self.buffer.get(partition) {
            Some((t, sample)) if *t == tick => Some(sample),
            _ => None,
        }
    }

    /// Highest tick in the buffer, or tick 0 if the buffer is empty
    pub fn newest_tick(&self) -> Tick {
        self.buffer.back().map_or(Tick::ZERO, |(tick, _)| *tick)
    }

    pub fn oldest_tick(&self) -> Option<Tick> {
        self.buffer.front().map(|(tick, _)| *tick)
    }

    pub fn newest(&self) -> Option<&InputSample> {
        self.buffer.back().map(|(_, sample)| sample)
    }

    /// Remove every entry strictly older than `tick`. Returns the number of entries removed
    pub fn prune_before(&mut self, tick: Tick) -> usize {
        let partition = self.buffer.partition_point(|(t, _)| *t < tick);
        self.buffer.drain(..partition);
        partition
    }

    /// Entries with `start <= tick <= end`, in ascending tick order
    pub fn range(&self, start: Tick, end: Tick) -> impl Iterator<Item = (Tick, &InputSample)> {
        let from = self.buffer.partition_point(|(t, _)| *t < start);
        let to = self.buffer.partition_point(|(t, _)| *t <= end).max(from);
        self.buffer
            .range(from..to)
            .map(|(tick, sample)| (*tick, sample))
    }

    /// All entries in ascending tick order
    pub fn iter(&self) -> impl Iterator<Item = (Tick, &InputSample)> {
        self.buffer.iter().map(|(tick, sample)| (*tick, sample))
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Display for InputHistoryBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let ticks = self
            .buffer
            .iter()
            .map(|(tick, sample)| {
                alloc::format!(
                    "{}: throttle={} brake={} steer={} jump={}",
                    tick.0,
                    sample.throttle,
                    sample.brake,
                    sample.steer,
                    sample.jump_requested
                )
            })
            .collect::<alloc::vec::Vec<_>>()
            .join("\n");
        write!(f, "InputHistoryBuffer (capacity {}):\n{ticks}", self.capacity)
    }
}
