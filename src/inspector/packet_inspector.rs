//! Header inspection into the capture ring.

use std::sync::Arc;

use tracing::trace;

use crate::capture::CaptureRing;
use crate::domain::{Frame, HookDirection, IfName, PacketSummaryRecord};
use crate::parser::HeaderParser;
use crate::utils::Clock;

/// Summarizes IPv4 frames into a [`CaptureRing`].
///
/// The write path builds a `Copy` record on the stack and stores it in a
/// pre-allocated slot, so it neither allocates nor blocks beyond the ring's
/// short lock.
pub struct PacketInspector {
    parser: HeaderParser,
    ring: Arc<CaptureRing>,
    clock: Clock,
}

impl PacketInspector {
    pub fn new(ring: Arc<CaptureRing>, clock: Clock) -> Self {
        Self {
            parser: HeaderParser::new(),
            ring,
            clock,
        }
    }

    pub fn ring(&self) -> &Arc<CaptureRing> {
        &self.ring
    }

    /// Record a summary of `frame` as seen on `interface`.
    ///
    /// Non-IPv4 and malformed frames are ignored. Protocols other than TCP
    /// and UDP, or a missing transport header, record ports as 0.
    pub fn inspect(&self, frame: &Frame, interface: &str, direction: HookDirection) {
        let Ok(headers) = self.parser.parse(frame) else {
            return;
        };

        let (src_port, dst_port) = headers.ports_or_zero();
        let record = PacketSummaryRecord {
            timestamp: self.clock.ticks(),
            src_addr: headers.source,
            dst_addr: headers.destination,
            src_port,
            dst_port,
            protocol: headers.protocol.0,
            length: headers.total_length,
            interface: IfName::new(interface),
            direction,
        };

        self.ring.record(record);

        trace!(
            "{} {} {}:{} -> {}:{} proto {}",
            interface,
            direction,
            record.src_addr,
            record.src_port,
            record.dst_addr,
            record.dst_port,
            record.protocol
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FrameBuilder, Transport};
    use pnet::packet::ethernet::EtherTypes;
    use std::net::Ipv4Addr;

    fn inspector(capacity: usize) -> PacketInspector {
        PacketInspector::new(Arc::new(CaptureRing::new(capacity)), Clock::new())
    }

    #[test]
    fn test_tcp_frame_is_recorded() {
        let inspector = inspector(1000);
        let data = FrameBuilder::new()
            .source(Ipv4Addr::new(10, 1, 1, 1), 5555)
            .destination(Ipv4Addr::new(10, 1, 1, 2), 22)
            .build(Transport::Tcp, 74);

        inspector.inspect(&Frame::outbound("vnet0", data), "vnet0", HookDirection::Out);

        let snapshot = inspector.ring().snapshot();
        assert_eq!(snapshot.total, 1);
        let record = snapshot.records[0];
        assert_eq!(record.src_addr, Ipv4Addr::new(10, 1, 1, 1));
        assert_eq!(record.dst_addr, Ipv4Addr::new(10, 1, 1, 2));
        assert_eq!((record.src_port, record.dst_port), (5555, 22));
        assert_eq!(record.protocol, 6);
        assert_eq!(record.length, 60);
        assert_eq!(record.interface.as_str(), "vnet0");
        assert_eq!(record.direction, HookDirection::Out);
    }

    #[test]
    fn test_icmp_ports_are_zero() {
        let inspector = inspector(1000);
        let data = FrameBuilder::new().build(Transport::Icmp, 98);

        inspector.inspect(&Frame::outbound("vnet1", data), "vnet1", HookDirection::In);

        let record = inspector.ring().snapshot().records[0];
        assert_eq!(record.protocol, 1);
        assert_eq!((record.src_port, record.dst_port), (0, 0));
    }

    #[test]
    fn test_non_ip_frame_is_ignored() {
        let inspector = inspector(1000);
        let data = FrameBuilder::new().ethernet(EtherTypes::Arp, &[0u8; 28]);

        inspector.inspect(&Frame::outbound("vnet0", data), "vnet0", HookDirection::In);

        assert_eq!(inspector.ring().total(), 0);
        assert!(inspector.ring().is_empty());
    }

    #[test]
    fn test_truncated_ip_header_is_ignored() {
        let inspector = inspector(1000);
        let mut data = FrameBuilder::new().build(Transport::Udp, 42);
        data.truncate(24);

        inspector.inspect(&Frame::outbound("vnet0", data), "vnet0", HookDirection::In);

        assert_eq!(inspector.ring().total(), 0);
    }

    #[test]
    fn test_ring_keeps_latest_window() {
        let inspector = inspector(1000);
        for i in 1..=1200u16 {
            let data = FrameBuilder::new()
                .source(Ipv4Addr::new(10, 0, 0, 1), i)
                .build(Transport::Tcp, 60);
            inspector.inspect(&Frame::outbound("vnet0", data), "vnet0", HookDirection::In);
        }

        let snapshot = inspector.ring().snapshot();
        assert_eq!(snapshot.total, 1200);
        assert_eq!(snapshot.records.len(), 1000);
        assert_eq!(snapshot.records[0].src_port, 201);
        assert_eq!(snapshot.records[999].src_port, 1200);
    }
}
