//! Frame sources for feeding the wire.
//!
//! A [`FrameSource`] yields raw Ethernet frames. [`PnetSource`] reads them
//! from a real interface; [`ReplaySource`] plays back a fixed list.
//! [`pump`] transmits whatever a source yields on one wire endpoint.

mod pnet_source;
mod replay;

pub use pnet_source::PnetSource;
pub use replay::ReplaySource;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::debug;

use crate::error::{SourceError, SubmitError};
use crate::host::LoopbackHost;
use crate::wire::VirtualWire;

/// A producer of raw Ethernet frames.
pub trait FrameSource: Send {
    /// Iterate over frames until the source is exhausted or the running
    /// flag is cleared.
    fn frames(&mut self) -> Result<Box<dyn Iterator<Item = Vec<u8>> + '_>, SourceError>;

    /// Name of the interface frames come from.
    fn interface_name(&self) -> &str;

    /// Install the flag checked between frames for graceful shutdown.
    fn set_running(&mut self, running: Arc<AtomicBool>);
}

/// Totals from a [`pump`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpSummary {
    pub read: usize,
    pub forwarded: usize,
    pub dropped: usize,
}

/// Transmit frames from `source` on wire interface `dev` through `host`,
/// stopping after `limit` frames if one is given.
///
/// Per-frame failures are counted, not returned.
pub fn pump<S>(
    source: &mut S,
    host: &LoopbackHost,
    wire: &VirtualWire,
    dev: &str,
    limit: Option<usize>,
) -> Result<PumpSummary, SourceError>
where
    S: FrameSource + ?Sized,
{
    let mut summary = PumpSummary::default();
    let frames = source.frames()?;

    for data in frames.take(limit.unwrap_or(usize::MAX)) {
        summary.read += 1;
        match host.transmit(wire, dev, data) {
            Ok(_) => summary.forwarded += 1,
            Err(SubmitError::QueueStopped(_)) => {
                debug!("{} is stopped, ending pump", dev);
                summary.dropped += 1;
                break;
            }
            Err(e) => {
                debug!("Frame not forwarded: {}", e);
                summary.dropped += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FrameBuilder, Transport};
    use crate::config::Config;
    use crate::domain::EndpointId;
    use crate::host::DEFAULT_BACKLOG;

    fn setup() -> (Arc<LoopbackHost>, Arc<VirtualWire>) {
        let host = Arc::new(LoopbackHost::new());
        let wire = VirtualWire::builder(&Config::default())
            .setup(host.as_ref(), host.clone())
            .unwrap();
        (host, wire)
    }

    fn frames(count: usize) -> Vec<Vec<u8>> {
        (0..count)
            .map(|_| FrameBuilder::new().build(Transport::Udp, 64))
            .collect()
    }

    #[test]
    fn test_pump_forwards_everything() {
        let (host, wire) = setup();
        wire.open(EndpointId::A);
        let mut source = ReplaySource::new("pcap0", frames(5));

        let summary = pump(&mut source, &host, &wire, "vnet0", None).unwrap();
        assert_eq!(
            summary,
            PumpSummary {
                read: 5,
                forwarded: 5,
                dropped: 0
            }
        );
        assert_eq!(wire.stats(EndpointId::B).rx_packets, 5);
    }

    #[test]
    fn test_pump_honours_limit() {
        let (host, wire) = setup();
        wire.open(EndpointId::A);
        let mut source = ReplaySource::new("pcap0", frames(10));

        let summary = pump(&mut source, &host, &wire, "vnet0", Some(3)).unwrap();
        assert_eq!(summary.read, 3);
        assert_eq!(host.inbox_len("vnet1"), 3);
    }

    #[test]
    fn test_long_pump_keeps_inbox_bounded() {
        let (host, wire) = setup();
        wire.open(EndpointId::A);
        let mut source = ReplaySource::new("pcap0", frames(DEFAULT_BACKLOG * 3));

        let summary = pump(&mut source, &host, &wire, "vnet0", None).unwrap();
        assert_eq!(summary.forwarded, DEFAULT_BACKLOG * 3);
        assert_eq!(host.inbox_len("vnet1"), DEFAULT_BACKLOG);
        assert_eq!(host.backlog_dropped(), (DEFAULT_BACKLOG * 2) as u64);
        assert_eq!(wire.stats(EndpointId::B).rx_packets, (DEFAULT_BACKLOG * 3) as u64);
    }

    #[test]
    fn test_pump_counts_oversized_frames() {
        let (host, wire) = setup();
        wire.open(EndpointId::A);
        let mut all = frames(2);
        all.insert(1, FrameBuilder::new().build(Transport::Udp, 2000));
        let mut source = ReplaySource::new("pcap0", all);

        let summary = pump(&mut source, &host, &wire, "vnet0", None).unwrap();
        assert_eq!(summary.forwarded, 2);
        assert_eq!(summary.dropped, 1);
        assert_eq!(wire.stats(EndpointId::A).tx_dropped, 1);
    }

    #[test]
    fn test_pump_stops_on_closed_endpoint() {
        let (host, wire) = setup();
        let mut source = ReplaySource::new("pcap0", frames(4));

        let summary = pump(&mut source, &host, &wire, "vnet0", None).unwrap();
        assert_eq!(summary.read, 1);
        assert_eq!(summary.forwarded, 0);
    }
}
