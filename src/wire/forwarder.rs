//! Transmit path: duplicate a frame onto the peer's receive path.

use tracing::{debug, trace, warn};

use super::{Sent, VirtualWire};
use crate::domain::{EndpointId, Frame, FullFrameCaptureRecord, WireDirection};
use crate::error::ForwardError;

impl VirtualWire {
    /// Forward `frame`, submitted on `source`, to the source's peer.
    ///
    /// The original frame is consumed on every path. On success the peer's
    /// ingress stack receives a fresh copy carrying receive-side metadata
    /// and both endpoints' counters move by the frame length. On failure
    /// only the source's `tx_dropped` moves.
    ///
    /// Each counter update and the capture append take their own lock, one
    /// at a time. No lock is held while the stack consumes the copy.
    pub fn forward(&self, source: EndpointId, frame: Frame) -> Result<Sent, ForwardError> {
        let src = self.endpoint(source);
        let len = frame.len();

        let Some(peer_id) = src.peer() else {
            src.record_drop();
            warn!("{}: no peer, dropping {}-byte frame", src.name(), len);
            return Err(ForwardError::NoPeer {
                source_name: src.name().to_string(),
            });
        };
        let peer = self.endpoint(peer_id);

        let Some(copy) = self.allocator.try_copy(frame.data()) else {
            src.record_drop();
            warn!("{}: out of memory copying {}-byte frame", src.name(), len);
            return Err(ForwardError::AllocationFailed { len });
        };

        let captured = self.capture(source, &frame);

        let duplicate = Frame::received(*peer.name(), peer.mac(), copy);

        src.record_tx(len);
        peer.record_rx(len);
        drop(frame);

        debug!(
            "{} -> {}: forwarded {} bytes ({:?})",
            src.name(),
            peer.name(),
            len,
            duplicate.kind()
        );
        self.stack.deliver(duplicate);

        Ok(Sent {
            bytes: len,
            captured,
        })
    }

    /// Append a full copy of `frame` to the capture list.
    ///
    /// Best effort: returns false without touching the list when the copy
    /// cannot be allocated.
    fn capture(&self, source: EndpointId, frame: &Frame) -> bool {
        let Some(data) = self.allocator.try_copy(frame.data()) else {
            debug!("{}: skipping capture, out of memory", self.endpoint(source).name());
            return false;
        };

        let record = FullFrameCaptureRecord {
            data,
            interface: *self.endpoint(source).name(),
            timestamp: self.clock.ticks(),
            direction: WireDirection::from_source(source),
        };

        if let Some(evicted) = self.captures.append(record) {
            trace!(
                "Capture list full, evicted {}-byte record from {}",
                evicted.len(),
                evicted.interface
            );
        }
        true
    }
}
