// Fixed-capacity time-series storage shared by every collector
use std::collections::{HashMap, VecDeque};

/// FIFO buffer that evicts its oldest entry once full.
#[derive(Debug, Clone)]
pub struct BoundedBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        BoundedBuffer {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, returning the evicted one when the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// The last `n` items, oldest first.
    pub fn trailing(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip)
    }

    pub fn trailing_vec(&self, n: usize) -> Vec<T>
    where
        T: Clone,
    {
        self.trailing(n).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Named bounded buffers kept in an arena with a name index.
///
/// Removing a series frees its slot for reuse, so repeatedly clearing and
/// re-recording metrics does not grow the arena.
#[derive(Debug, Clone)]
pub struct KeyedRingTable<T> {
    slots: Vec<Option<Slot<T>>>,
    index: HashMap<String, usize>,
    free: Vec<usize>,
    series_capacity: usize,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    name: String,
    buffer: BoundedBuffer<T>,
}

impl<T> KeyedRingTable<T> {
    pub fn new(series_capacity: usize) -> Self {
        KeyedRingTable {
            slots: Vec::new(),
            index: HashMap::new(),
            free: Vec::new(),
            series_capacity,
        }
    }

    /// Append to the named series, creating it on first use.
    pub fn push(&mut self, name: &str, item: T) -> Option<T> {
        let slot = match self.index.get(name) {
            Some(&slot) => slot,
            None => self.allocate(name),
        };
        match self.slots.get_mut(slot) {
            Some(Some(entry)) => entry.buffer.push(item),
            _ => None,
        }
    }

    fn allocate(&mut self, name: &str) -> usize {
        let entry = Slot {
            name: name.to_string(),
            buffer: BoundedBuffer::new(self.series_capacity),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.index.insert(name.to_string(), slot);
        slot
    }

    pub fn get(&self, name: &str) -> Option<&BoundedBuffer<T>> {
        let slot = *self.index.get(name)?;
        self.slots.get(slot)?.as_ref().map(|entry| &entry.buffer)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.index.remove(name) {
            Some(slot) => {
                self.slots[slot] = None;
                self.free.push(slot);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.free.clear();
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of arena slots, including freed ones awaiting reuse.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundedBuffer<T>)> {
        self.slots
            .iter()
            .flatten()
            .map(|entry| (entry.name.as_str(), &entry.buffer))
    }
}
