//! Wrapper around a min-heap
use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// A buffer that contains items associated with a key (a Tick, Instant, etc.)
///
/// Elements in the buffer are popped only when they are 'ready', i.e.
/// when the key associated with the item is less than or equal to the current key.
///
/// Items with equal keys come out in insertion order.
#[derive(Clone, Debug)]
pub struct ReadyBuffer<K, T> {
    /// min heap: we pop the items with smallest key first
    heap: BinaryHeap<ItemWithReadyKey<K, T>>,
    sequence: u64,
}

impl<K: Ord, T> Default for ReadyBuffer<K, T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::default(),
            sequence: 0,
        }
    }
}

impl<K: Ord, T> ReadyBuffer<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Adds an item to the heap marked by key
    pub fn push(&mut self, key: K, item: T) {
        self.heap.push(ItemWithReadyKey {
            key,
            sequence: self.sequence,
            item,
        });
        self.sequence += 1;
    }

    /// Every buffered item, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|item| &item.item)
    }

    /// Returns whether or not there is an item with a key older or equal to `current_key`
    pub fn has_item(&self, current_key: &K) -> bool {
        self.heap
            .peek()
            .is_some_and(|item| item.key.cmp(current_key) != Ordering::Greater)
    }

    /// Pops the item with the smallest key if it is ready
    pub fn pop_item(&mut self, current_key: &K) -> Option<(K, T)> {
        if !self.has_item(current_key) {
            return None;
        }
        self.heap.pop().map(|item| (item.key, item.item))
    }

    /// Pop all items that are older or equal than the provided key, in key order
    pub fn drain_until(&mut self, key: &K) -> Vec<(K, T)> {
        let mut ready = Vec::new();
        while let Some(item) = self.pop_item(key) {
            ready.push(item);
        }
        ready
    }
}

#[derive(Clone, Debug)]
struct ItemWithReadyKey<K, T> {
    key: K,
    sequence: u64,
    item: T,
}

impl<K: Ord, T> Eq for ItemWithReadyKey<K, T> {}

impl<K: Ord, T> PartialEq<Self> for ItemWithReadyKey<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.sequence == other.sequence
    }
}

impl<K: Ord, T> PartialOrd<Self> for ItemWithReadyKey<K, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// BinaryHeap is a max-heap, so we reverse the ordering to pop the smallest key first
impl<K: Ord, T> Ord for ItemWithReadyKey<K, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use hognet_core::tick::Tick;
    use test_log::test;

    #[test]
    fn test_pop_ready_items_in_key_order() {
        let mut buffer = ReadyBuffer::new();
        buffer.push(Tick(5), 'c');
        buffer.push(Tick(1), 'a');
        buffer.push(Tick(3), 'b');

        assert!(!buffer.has_item(&Tick(0)));
        assert_eq!(buffer.pop_item(&Tick(0)), None);
        assert_eq!(buffer.drain_until(&Tick(3)), vec![(Tick(1), 'a'), (Tick(3), 'b')]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.pop_item(&Tick(10)), Some((Tick(5), 'c')));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_equal_keys_keep_insertion_order() {
        let mut buffer = ReadyBuffer::new();
        for i in 0..4 {
            buffer.push(Tick(2), i);
        }
        let items: Vec<_> = buffer
            .drain_until(&Tick(2))
            .into_iter()
            .map(|(_, i)| i)
            .collect();
        assert_eq!(items, [0, 1, 2, 3]);
    }
}
