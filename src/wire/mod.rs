//! The virtual wire: two paired endpoints and the capture list.
//!
//! [`VirtualWire`] owns both endpoints and the capture list for its whole
//! lifetime. It is created by [`WireBuilder::setup`], which registers both
//! interfaces and the statistics entry with the host, and released by
//! [`VirtualWire::teardown`].

pub(crate) mod alloc;
mod endpoint;
mod forwarder;

pub use alloc::{FrameAllocator, HeapAllocator};
pub use endpoint::Endpoint;

use std::sync::{Arc, Weak};

use macaddr::MacAddr6;
use tracing::{info, warn};

use crate::capture::{CaptureList, DrainSummary};
use crate::config::Config;
use crate::domain::{EndpointId, EndpointStats, Frame};
use crate::error::{SetupError, SubmitError};
use crate::host::{IngressStack, InterfaceInfo, InterfaceRegistrar, StatusRegistrar};
use crate::reporter::{render_stats_table, EndpointStatus, StatusSource, WireStatus};
use crate::utils::{format_mac, random_mac, Clock};

/// Name of the endpoint statistics status entry.
pub const STATS_ENTRY: &str = "vnet_stats";

/// Outcome of a successful forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sent {
    pub bytes: usize,
    /// Whether a full copy made it into the capture list.
    pub captured: bool,
}

/// Two endpoints joined back to back.
pub struct VirtualWire {
    endpoints: [Endpoint; 2],
    captures: CaptureList,
    stack: Arc<dyn IngressStack>,
    allocator: Arc<dyn FrameAllocator>,
    clock: Clock,
    mtu: usize,
    max_frame_len: usize,
}

impl VirtualWire {
    pub fn builder(config: &Config) -> WireBuilder {
        WireBuilder {
            config: config.clone(),
            allocator: None,
            clock: None,
            macs: None,
        }
    }

    pub fn endpoint(&self, id: EndpointId) -> &Endpoint {
        &self.endpoints[id.index()]
    }

    pub fn endpoint_by_name(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|ep| ep.name().as_str() == name)
    }

    pub fn captures(&self) -> &CaptureList {
        &self.captures
    }

    pub fn stats(&self, id: EndpointId) -> EndpointStats {
        self.endpoint(id).stats()
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    pub fn open(&self, id: EndpointId) {
        self.endpoint(id).open();
    }

    pub fn close(&self, id: EndpointId) {
        self.endpoint(id).close();
    }

    /// Host-facing transmit entry point.
    ///
    /// A closed endpoint hands the frame back in
    /// [`SubmitError::QueueStopped`]. A frame longer than MTU plus the
    /// Ethernet header is dropped and counted.
    pub fn submit(&self, id: EndpointId, frame: Frame) -> Result<Sent, SubmitError> {
        let endpoint = self.endpoint(id);
        if !endpoint.is_open() {
            return Err(SubmitError::QueueStopped(frame));
        }

        if frame.len() > self.max_frame_len {
            endpoint.record_drop();
            warn!(
                "{}: dropping {}-byte frame, limit is {}",
                endpoint.name(),
                frame.len(),
                self.max_frame_len
            );
            return Err(SubmitError::FrameTooLarge {
                len: frame.len(),
                max: self.max_frame_len,
            });
        }

        Ok(self.forward(id, frame)?)
    }

    /// Snapshot of both endpoints and the capture list.
    ///
    /// Each endpoint's counters are read under its own lock, one after the
    /// other.
    pub fn status(&self) -> WireStatus {
        let endpoints = self
            .endpoints
            .iter()
            .map(|ep| EndpointStatus {
                name: *ep.name(),
                peer: ep.peer().map(|peer| *self.endpoint(peer).name()),
                open: ep.is_open(),
                stats: ep.stats(),
            })
            .collect();

        WireStatus {
            endpoints,
            captured_frames: self.captures.len(),
            captured_bytes: self.captures.retained_bytes(),
            evicted_frames: self.captures.evicted(),
        }
    }

    pub fn report(&self) -> String {
        render_stats_table(&self.status())
    }

    /// Disable both endpoints, unregister everything `setup` registered and
    /// free every retained capture record.
    pub fn teardown<R>(&self, host: &R) -> DrainSummary
    where
        R: InterfaceRegistrar + StatusRegistrar + ?Sized,
    {
        for endpoint in &self.endpoints {
            endpoint.close();
        }

        host.unregister_status(STATS_ENTRY);
        for endpoint in self.endpoints.iter().rev() {
            host.unregister_interface(endpoint.name().as_str());
        }

        let drained = self.captures.drain();
        info!(
            "Wire torn down, released {} captured frames ({} bytes)",
            drained.records, drained.bytes
        );
        drained
    }

    fn from_parts(
        config: &Config,
        macs: [MacAddr6; 2],
        stack: Arc<dyn IngressStack>,
        allocator: Arc<dyn FrameAllocator>,
        clock: Clock,
    ) -> Self {
        Self {
            endpoints: [
                Endpoint::new(EndpointId::A, &config.device_a, macs[0]),
                Endpoint::new(EndpointId::B, &config.device_b, macs[1]),
            ],
            captures: CaptureList::with_limit(config.capture_list_limit),
            stack,
            allocator,
            clock,
            mtu: config.mtu,
            max_frame_len: config.max_frame_len(),
        }
    }

    fn pair(&self) {
        for endpoint in &self.endpoints {
            endpoint.pair_with(endpoint.id().opposite());
        }
    }

    fn interface_info(&self, id: EndpointId) -> InterfaceInfo {
        let endpoint = self.endpoint(id);
        InterfaceInfo {
            name: endpoint.name().to_string(),
            mac: endpoint.mac(),
            mtu: self.mtu,
            no_arp: true,
            hw_checksum: true,
        }
    }

    /// A wire whose endpoints were never paired and never registered.
    #[cfg(test)]
    pub(crate) fn build_unpaired(config: &Config, stack: Arc<dyn IngressStack>) -> Self {
        Self::from_parts(
            config,
            [random_mac(), random_mac()],
            stack,
            Arc::new(HeapAllocator),
            Clock::new(),
        )
    }
}

/// Configures and sets up a [`VirtualWire`].
pub struct WireBuilder {
    config: Config,
    allocator: Option<Arc<dyn FrameAllocator>>,
    clock: Option<Clock>,
    macs: Option<[MacAddr6; 2]>,
}

impl WireBuilder {
    pub fn with_allocator(mut self, allocator: Arc<dyn FrameAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use fixed endpoint addresses instead of random ones.
    pub fn with_macs(mut self, macs: [MacAddr6; 2]) -> Self {
        self.macs = Some(macs);
        self
    }

    /// Create both endpoints, pair them and register them with `host`.
    ///
    /// Endpoints start closed. On failure everything registered so far is
    /// unregistered again before the error is returned.
    pub fn setup<R>(
        self,
        host: &R,
        stack: Arc<dyn IngressStack>,
    ) -> Result<Arc<VirtualWire>, SetupError>
    where
        R: InterfaceRegistrar + StatusRegistrar + ?Sized,
    {
        self.config
            .validate()
            .map_err(|e| SetupError::InvalidConfig(e.to_string()))?;

        let macs = self.macs.unwrap_or_else(|| [random_mac(), random_mac()]);
        let wire = Arc::new(VirtualWire::from_parts(
            &self.config,
            macs,
            stack,
            self.allocator.unwrap_or_else(|| Arc::new(HeapAllocator)),
            self.clock.unwrap_or_default(),
        ));
        wire.pair();

        let mut registered: Vec<&str> = Vec::with_capacity(2);
        for id in EndpointId::ALL {
            let info = wire.interface_info(id);
            if let Err(source) = host.register_interface(&info) {
                for name in registered.iter().rev() {
                    host.unregister_interface(name);
                }
                return Err(SetupError::Interface {
                    name: info.name,
                    source,
                });
            }
            info!(
                "Registered {} ({}), mtu {}",
                info.name,
                format_mac(&info.mac),
                info.mtu
            );
            registered.push(wire.endpoint(id).name().as_str());
        }

        let entry = Arc::new(StatsEntry {
            wire: Arc::downgrade(&wire),
        });
        if let Err(source) = host.register_status(STATS_ENTRY, entry) {
            for name in registered.iter().rev() {
                host.unregister_interface(name);
            }
            return Err(SetupError::Status {
                name: STATS_ENTRY.to_string(),
                source,
            });
        }

        info!(
            "Paired {} <-> {}",
            wire.endpoint(EndpointId::A).name(),
            wire.endpoint(EndpointId::B).name()
        );
        Ok(wire)
    }
}

/// Status entry for the wire. Holds a weak reference so the host's
/// registry does not keep the wire alive.
struct StatsEntry {
    wire: Weak<VirtualWire>,
}

impl StatusSource for StatsEntry {
    fn render(&self) -> String {
        self.wire
            .upgrade()
            .map(|wire| wire.report())
            .unwrap_or_default()
    }
}
