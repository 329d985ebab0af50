use crate::tick::Tick;
use alloc::collections::VecDeque;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// HistoryBuffer stores past values (usually predicted states) indexed by tick, to allow comparing
/// them against a late authoritative value.
///
/// The values always remain ordered from oldest (front) to most recent (back).
#[derive(Debug, Clone)]
pub struct HistoryBuffer<R> {
    // The front contains old elements, the back contains the more recent elements.
    buffer: VecDeque<(Tick, R)>,
    max_len: usize,
}

impl<R> Default for HistoryBuffer<R> {
    fn default() -> Self {
        Self::with_max_len(usize::MAX)
    }
}

// This is mostly present for testing, we only compare the buffer ticks, not the values
impl<R> PartialEq for HistoryBuffer<R> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer
            .iter()
            .map(|(tick, _)| tick)
            .eq(other.buffer.iter().map(|(tick, _)| tick))
    }
}

impl<R> HistoryBuffer<R> {
    /// Buffer that keeps at most `max_len` values, dropping the oldest ones first
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buffer: VecDeque::new(),
            max_len,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Oldest value in the buffer
    pub fn oldest(&self) -> Option<&(Tick, R)> {
        self.buffer.front()
    }

    /// Most recent value in the buffer
    pub fn most_recent(&self) -> Option<&(Tick, R)> {
        self.buffer.back()
    }

    /// Get the value recorded at exactly the specified tick
    pub fn get(&self, tick: Tick) -> Option<&R> {
        // find first idx `partition` such that self.buffer[partition].0 >= tick
        let partition = self
            .buffer
            .partition_point(|(buffer_tick, _)| *buffer_tick < tick);
        match self.buffer.get(partition) {
            Some((buffer_tick, value)) if *buffer_tick == tick => Some(value),
            _ => None,
        }
    }

    /// Record a value for the given tick.
    ///
    /// If a value already exists for that tick it is replaced: this happens when ticks get
    /// re-simulated after a correction.
    pub fn add(&mut self, tick: Tick, value: R) {
        let partition = self
            .buffer
            .partition_point(|(buffer_tick, _)| *buffer_tick < tick);
        match self.buffer.get_mut(partition) {
            Some((buffer_tick, existing)) if *buffer_tick == tick => {
                trace!(?tick, "overwriting history value");
                *existing = value;
            }
            _ => self.buffer.insert(partition, (tick, value)),
        }
        while self.buffer.len() > self.max_len {
            self.buffer.pop_front();
        }
    }

    /// Clear all the values in the history buffer that are strictly older than the specified tick
    pub fn clear_before(&mut self, tick: Tick) {
        let partition = self
            .buffer
            .partition_point(|(buffer_tick, _)| *buffer_tick < tick);
        self.buffer.drain(0..partition);
    }

    /// Reset the history
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Iterate from the oldest to the most recent value
    pub fn iter(&self) -> impl Iterator<Item = (Tick, &R)> {
        self.buffer.iter().map(|(tick, value)| (*tick, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use test_log::test;

    #[test]
    fn test_add_and_get() {
        let mut history = HistoryBuffer::<f32>::default();
        history.add(Tick(1), 1.0);
        history.add(Tick(3), 3.0);
        history.add(Tick(2), 2.0);

        assert_eq!(history.get(Tick(2)), Some(&2.0));
        assert_eq!(history.get(Tick(4)), None);
        assert_eq!(history.oldest(), Some(&(Tick(1), 1.0)));
        assert_eq!(history.most_recent(), Some(&(Tick(3), 3.0)));
    }

    #[test]
    fn test_add_overwrites_same_tick() {
        let mut history = HistoryBuffer::<f32>::default();
        history.add(Tick(1), 1.0);
        history.add(Tick(2), 2.0);
        history.add(Tick(1), 10.0);
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(Tick(1)), Some(&10.0));
    }

    #[test]
    fn test_max_len_drops_oldest() {
        let mut history = HistoryBuffer::<u32>::with_max_len(3);
        for i in 0..5 {
            history.add(Tick(i), i);
        }
        let ticks: Vec<_> = history.iter().map(|(tick, _)| tick).collect();
        assert_eq!(ticks, [Tick(2), Tick(3), Tick(4)]);
    }

    #[test]
    fn test_clear_before() {
        let mut history = HistoryBuffer::<u32>::default();
        for i in 0..5 {
            history.add(Tick(i), i);
        }
        history.clear_before(Tick(3));
        assert_eq!(history.oldest(), Some(&(Tick(3), 3)));
        history.clear_before(Tick(3));
        assert_eq!(history.len(), 2);
    }
}
