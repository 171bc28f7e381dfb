//! Capture records produced by the forwarder and the inspector.

use std::fmt;
use std::net::Ipv4Addr;

use super::frame::IfName;
use super::stats::EndpointId;

/// Which way a forwarded frame crossed the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireDirection {
    AToB,
    BToA,
}

impl WireDirection {
    /// Direction of a frame transmitted by `source`.
    pub fn from_source(source: EndpointId) -> Self {
        match source {
            EndpointId::A => Self::AToB,
            EndpointId::B => Self::BToA,
        }
    }

    /// Numeric flag: 0 for A to B, 1 for B to A.
    pub fn as_flag(&self) -> u8 {
        match self {
            Self::AToB => 0,
            Self::BToA => 1,
        }
    }
}

/// The interception point a summary was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookDirection {
    /// Inbound to the local stack.
    #[default]
    In,
    /// Outbound from the local stack.
    Out,
}

impl HookDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for HookDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A full copy of a forwarded frame.
///
/// Owned by the capture list until it is drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullFrameCaptureRecord {
    pub data: Vec<u8>,
    pub interface: IfName,
    pub timestamp: u64,
    pub direction: WireDirection,
}

impl FullFrameCaptureRecord {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Header summary of an inspected IPv4 packet.
///
/// `Copy` and fixed-size so the ring can hold pre-allocated slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketSummaryRecord {
    pub timestamp: u64,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
    pub length: u16,
    pub interface: IfName,
    pub direction: HookDirection,
}

impl Default for PacketSummaryRecord {
    fn default() -> Self {
        Self {
            timestamp: 0,
            src_addr: Ipv4Addr::UNSPECIFIED,
            dst_addr: Ipv4Addr::UNSPECIFIED,
            src_port: 0,
            dst_port: 0,
            protocol: 0,
            length: 0,
            interface: IfName::default(),
            direction: HookDirection::default(),
        }
    }
}
