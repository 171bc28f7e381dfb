//! One side of the wire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use macaddr::MacAddr6;
use parking_lot::Mutex;
use tracing::info;

use crate::domain::{EndpointId, EndpointStats, IfName};

/// An endpoint: identity, address, peer and counters.
///
/// The peer is stored as the other endpoint's id and can be set exactly
/// once. Counters sit behind their own lock; each update takes it once and
/// never while holding any other lock.
#[derive(Debug)]
pub struct Endpoint {
    id: EndpointId,
    name: IfName,
    mac: MacAddr6,
    peer: OnceLock<EndpointId>,
    open: AtomicBool,
    stats: Mutex<EndpointStats>,
}

impl Endpoint {
    pub(crate) fn new(id: EndpointId, name: &str, mac: MacAddr6) -> Self {
        Self {
            id,
            name: IfName::new(name),
            mac,
            peer: OnceLock::new(),
            open: AtomicBool::new(false),
            stats: Mutex::new(EndpointStats::default()),
        }
    }

    /// Record the peer. Returns false if a peer was already set.
    pub(crate) fn pair_with(&self, peer: EndpointId) -> bool {
        self.peer.set(peer).is_ok()
    }

    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn name(&self) -> &IfName {
        &self.name
    }

    pub fn mac(&self) -> MacAddr6 {
        self.mac
    }

    pub fn peer(&self) -> Option<EndpointId> {
        self.peer.get().copied()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Start accepting submissions.
    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
        info!("{}: transmit queue started", self.name);
    }

    /// Stop accepting submissions. Forwards already past the check finish.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
        info!("{}: transmit queue stopped", self.name);
    }

    /// Copy of the counters.
    pub fn stats(&self) -> EndpointStats {
        *self.stats.lock()
    }

    pub(crate) fn record_tx(&self, bytes: usize) {
        self.stats.lock().record_tx(bytes);
    }

    pub(crate) fn record_rx(&self, bytes: usize) {
        self.stats.lock().record_rx(bytes);
    }

    pub(crate) fn record_drop(&self) {
        self.stats.lock().record_drop();
    }
}
