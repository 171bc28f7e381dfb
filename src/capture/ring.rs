//! Bounded ring of packet summaries.

use parking_lot::Mutex;

use crate::domain::PacketSummaryRecord;
use crate::reporter::{render_capture_table, StatusSource};

/// Fixed-capacity circular buffer that overwrites its oldest slot.
///
/// All slots are allocated up front; `push` never allocates. `total`
/// counts every insertion ever made, so `min(capacity, total)` is the
/// number of live entries.
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Box<[T]>,
    head: usize,
    total: u64,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a ring with `capacity` pre-filled slots.
    ///
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity.max(1)].into_boxed_slice(),
            head: 0,
            total: 0,
        }
    }

    /// Write `item` at the head and advance it.
    pub fn push(&mut self, item: T) {
        self.slots[self.head] = item;
        self.head = (self.head + 1) % self.slots.len();
        self.total += 1;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        usize::try_from(self.total).map_or(self.slots.len(), |t| t.min(self.slots.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// All-time insertion count.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Live entries, oldest first.
    ///
    /// Walks back `len()` slots from the head.
    pub fn to_vec(&self) -> Vec<T> {
        let cap = self.slots.len();
        let count = self.len();
        (0..count)
            .map(|i| self.slots[(self.head + cap - count + i) % cap])
            .collect()
    }
}

/// A point-in-time copy of the capture ring.
#[derive(Debug, Clone)]
pub struct RingSnapshot {
    pub total: u64,
    pub capacity: usize,
    pub records: Vec<PacketSummaryRecord>,
}

/// The inspector's summary store.
///
/// One short-held lock guards the ring. Writers copy a fixed-size record
/// into a pre-allocated slot; readers copy the live window out and format
/// it after the lock is released.
#[derive(Debug)]
pub struct CaptureRing {
    inner: Mutex<RingBuffer<PacketSummaryRecord>>,
}

impl CaptureRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RingBuffer::new(capacity)),
        }
    }

    /// Store a record, overwriting the oldest once the ring has wrapped.
    pub fn record(&self, record: PacketSummaryRecord) {
        self.inner.lock().push(record);
    }

    pub fn total(&self) -> u64 {
        self.inner.lock().total()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn snapshot(&self) -> RingSnapshot {
        let ring = self.inner.lock();
        RingSnapshot {
            total: ring.total(),
            capacity: ring.capacity(),
            records: ring.to_vec(),
        }
    }

    /// Render the retained window as the capture table.
    pub fn report(&self) -> String {
        let snapshot = self.snapshot();
        render_capture_table(&snapshot)
    }
}

impl StatusSource for CaptureRing {
    fn render(&self) -> String {
        self.report()
    }
}
