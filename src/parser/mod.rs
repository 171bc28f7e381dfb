//! Network and transport header parsing.
//!
//! This module turns the bytes of a tagged IPv4 frame into a
//! [`PacketHeaders`] summary without allocating.

mod header_parser;

pub use header_parser::{HeaderParser, PacketHeaders, TransportPorts};
