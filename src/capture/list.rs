//! Full-frame capture list.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use parking_lot::Mutex;

use crate::domain::FullFrameCaptureRecord;

/// Totals released by [`CaptureList::drain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    pub records: usize,
    pub bytes: usize,
}

#[derive(Debug, Default)]
struct ListState {
    records: VecDeque<FullFrameCaptureRecord>,
    /// Frame bytes held by `records`
    bytes: usize,
        evicted: u64,
}

/// Insertion-ordered store of forwarded frame copies.
///
/// Unbounded by default: records are only released by [`drain`](Self::drain)
/// at teardown, so memory grows with traffic for the life of the wire. With
/// a limit the oldest record is evicted once the list is full.
#[derive(Debug)]
pub struct CaptureList {
    state: Mutex<ListState>,
    limit: Option<NonZeroUsize>,
}

impl CaptureList {
    pub fn unbounded() -> Self {
        Self {
            state: Mutex::new(ListState::default()),
            limit: None,
        }
    }

    pub fn bounded(limit: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(ListState::default()),
            limit: Some(limit),
        }
    }

    /// Build from a configured limit, where 0 means unbounded.
    pub fn with_limit(limit: usize) -> Self {
        NonZeroUsize::new(limit).map_or_else(Self::unbounded, Self::bounded)
    }

    pub fn limit(&self) -> Option<NonZeroUsize> {
        self.limit
    }

    /// Append a record, returning the evicted one if the list was full.
    ///
    /// The record is fully built before the lock is taken.
    pub fn append(&self, record: FullFrameCaptureRecord) -> Option<FullFrameCaptureRecord> {
        let mut state = self.state.lock();
        let evicted = match self.limit {
            Some(limit) if state.records.len() >= limit.get() => {
                state.evicted += 1;
                state.records.pop_front()
            }
            _ => None,
        };
        if let Some(old) = &evicted {
            state.bytes -= old.len();
        }
        state.bytes += record.len();
        state.records.push_back(record);
        evicted
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Records dropped by the bounded variant.
    pub fn evicted(&self) -> u64 {
        self.state.lock().evicted
    }

    /// Bytes of frame data currently retained.
    pub fn retained_bytes(&self) -> usize {
        self.state.lock().bytes
    }

    /// Copy out the retained records, oldest first.
    pub fn records(&self) -> Vec<FullFrameCaptureRecord> {
        self.state.lock().records.iter().cloned().collect()
    }

    /// Release every retained record.
    ///
    /// The records are moved out under the lock and freed after it is
    /// released.
    pub fn drain(&self) -> DrainSummary {
        let (drained, bytes) = {
            let mut state = self.state.lock();
            let bytes = std::mem::take(&mut state.bytes);
            (std::mem::take(&mut state.records), bytes)
        };
        DrainSummary {
            records: drained.len(),
            bytes,
        }
    }
}

impl Default for CaptureList {
    fn default() -> Self {
        Self::unbounded()
    }
}
