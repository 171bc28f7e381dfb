//! IPv4/TCP/UDP header parser.
//!
//! Parses in place over borrowed bytes (RFC 791, RFC 793, RFC 768).

use std::net::Ipv4Addr;

use pnet::packet::ethernet::EtherTypes;
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;

use crate::domain::Frame;
use crate::error::ParseError;

/// Minimum IPv4 header size (IHL = 5)
const IPV4_MIN_HEADER_LEN: usize = 20;

/// Source and destination ports of a TCP or UDP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPorts {
    pub source: u16,
    pub destination: u16,
}

/// Header fields extracted from an IPv4 packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeaders {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Total length as declared in the IP header
    pub total_length: u16,
    pub protocol: IpNextHeaderProtocol,
    /// Present only for TCP/UDP with a parseable transport header
    pub ports: Option<TransportPorts>,
}

impl PacketHeaders {
    /// Ports as (source, destination), zero when absent.
    pub fn ports_or_zero(&self) -> (u16, u16) {
        self.ports
            .map(|p| (p.source, p.destination))
            .unwrap_or((0, 0))
    }
}

/// Parser for the headers the inspector records.
#[derive(Debug, Clone, Copy)]
pub struct HeaderParser;

impl HeaderParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse the IPv4 header of a frame tagged as IPv4.
    ///
    /// Frames carrying any other protocol tag are rejected without looking
    /// at their bytes.
    pub fn parse(&self, frame: &Frame) -> Result<PacketHeaders, ParseError> {
        if frame.protocol() != EtherTypes::Ipv4 {
            return Err(ParseError::NotIpv4 {
                ethertype: frame.protocol().0,
            });
        }

        let transport = frame
            .transport_offset()
            .map(|offset| frame.data().get(offset..).unwrap_or_default());

        self.parse_network(frame.network_header(), transport)
    }

    fn parse_network(
        &self,
        data: &[u8],
        transport: Option<&[u8]>,
    ) -> Result<PacketHeaders, ParseError> {
        let ipv4 = Ipv4Packet::new(data).ok_or(ParseError::Truncated {
            expected: IPV4_MIN_HEADER_LEN,
            actual: data.len(),
        })?;

        let version = ipv4.get_version();
        if version != 4 {
            return Err(ParseError::BadVersion(version));
        }

        let header_len = usize::from(ipv4.get_header_length()) * 4;
        if header_len < IPV4_MIN_HEADER_LEN {
            return Err(ParseError::BadHeaderLength(header_len));
        }
        if header_len > data.len() {
            return Err(ParseError::Truncated {
                expected: header_len,
                actual: data.len(),
            });
        }

        // Without a recorded transport offset the transport header follows the IP options
        let transport = transport.unwrap_or(&data[header_len..]);
        let protocol = ipv4.get_next_level_protocol();

        Ok(PacketHeaders {
            source: ipv4.get_source(),
            destination: ipv4.get_destination(),
            total_length: ipv4.get_total_length(),
            protocol,
            ports: Self::parse_ports(protocol, transport),
        })
    }

    /// Extract ports for TCP and UDP. Anything else, or a short header, has none.
    fn parse_ports(protocol: IpNextHeaderProtocol, data: &[u8]) -> Option<TransportPorts> {
        if protocol == IpNextHeaderProtocols::Tcp {
            TcpPacket::new(data).map(|tcp| TransportPorts {
                source: tcp.get_source(),
                destination: tcp.get_destination(),
            })
        } else if protocol == IpNextHeaderProtocols::Udp {
            UdpPacket::new(data).map(|udp| TransportPorts {
                source: udp.get_source(),
                destination: udp.get_destination(),
            })
        } else {
            None
        }
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ETH_HEADER_LEN;
    use pnet::packet::ethernet::EtherType;

    /// Build an Ethernet + IPv4 frame with the given protocol and L4 bytes.
    fn ipv4_frame(protocol: u8, l4: &[u8]) -> Vec<u8> {
        let total_len = (IPV4_MIN_HEADER_LEN + l4.len()) as u16;
        let mut frame = vec![0u8; ETH_HEADER_LEN];
        frame[12] = 0x08; // EtherType IPv4
        frame[13] = 0x00;

        let mut ip = vec![0u8; IPV4_MIN_HEADER_LEN];
        ip[0] = 0x45; // version 4, IHL 5
        ip[2..4].copy_from_slice(&total_len.to_be_bytes());
        ip[8] = 64; // TTL
        ip[9] = protocol;
        ip[12..16].copy_from_slice(&[192, 168, 1, 10]);
        ip[16..20].copy_from_slice(&[192, 168, 1, 20]);

        frame.extend_from_slice(&ip);
        frame.extend_from_slice(l4);
        frame
    }

    fn ports_header(src: u16, dst: u16, len: usize) -> Vec<u8> {
        let mut l4 = vec![0u8; len];
        l4[0..2].copy_from_slice(&src.to_be_bytes());
        l4[2..4].copy_from_slice(&dst.to_be_bytes());
        l4
    }

    #[test]
    fn test_parse_tcp() {
        let parser = HeaderParser::new();
        let frame = Frame::outbound("vnet0", ipv4_frame(6, &ports_header(43210, 80, 20)));

        let headers = parser.parse(&frame).unwrap();
        assert_eq!(headers.source, Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(headers.destination, Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(headers.protocol, IpNextHeaderProtocols::Tcp);
        assert_eq!(headers.total_length, 40);
        assert_eq!(headers.ports_or_zero(), (43210, 80));
    }

    #[test]
    fn test_parse_udp() {
        let parser = HeaderParser::new();
        let frame = Frame::outbound("vnet0", ipv4_frame(17, &ports_header(5353, 53, 8)));

        let headers = parser.parse(&frame).unwrap();
        assert_eq!(headers.protocol, IpNextHeaderProtocols::Udp);
        assert_eq!(headers.ports_or_zero(), (5353, 53));
    }

    #[test]
    fn test_icmp_has_no_ports() {
        let parser = HeaderParser::new();
        let frame = Frame::outbound("vnet0", ipv4_frame(1, &[8, 0, 0, 0, 0, 1, 0, 1]));

        let headers = parser.parse(&frame).unwrap();
        assert_eq!(headers.protocol, IpNextHeaderProtocols::Icmp);
        assert!(headers.ports.is_none());
        assert_eq!(headers.ports_or_zero(), (0, 0));
    }

    #[test]
    fn test_truncated_tcp_header_has_no_ports() {
        let parser = HeaderParser::new();
        let frame = Frame::outbound("vnet0", ipv4_frame(6, &ports_header(1, 2, 10)));

        let headers = parser.parse(&frame).unwrap();
        assert!(headers.ports.is_none());
    }

    #[test]
    fn test_non_ipv4_rejected() {
        let parser = HeaderParser::new();
        let frame = Frame::outbound("vnet0", ipv4_frame(6, &[0u8; 20]))
            .with_protocol(EtherType(0x86dd));

        assert_eq!(
            parser.parse(&frame),
            Err(ParseError::NotIpv4 { ethertype: 0x86dd })
        );
    }

    #[test]
    fn test_truncated_ip_header() {
        let parser = HeaderParser::new();
        let mut data = ipv4_frame(6, &[]);
        data.truncate(ETH_HEADER_LEN + 12);
        let frame = Frame::outbound("vnet0", data);

        assert!(matches!(
            parser.parse(&frame),
            Err(ParseError::Truncated { expected: 20, actual: 12 })
        ));
    }

    #[test]
    fn test_wrong_version() {
        let parser = HeaderParser::new();
        let mut data = ipv4_frame(6, &[0u8; 20]);
        data[ETH_HEADER_LEN] = 0x65;
        let frame = Frame::outbound("vnet0", data);

        assert_eq!(parser.parse(&frame), Err(ParseError::BadVersion(6)));
    }

    #[test]
    fn test_bad_header_length() {
        let parser = HeaderParser::new();
        let mut data = ipv4_frame(6, &[0u8; 20]);
        data[ETH_HEADER_LEN] = 0x43; // IHL 3
        let frame = Frame::outbound("vnet0", data);

        assert_eq!(parser.parse(&frame), Err(ParseError::BadHeaderLength(12)));
    }

    #[test]
    fn test_options_longer_than_packet() {
        let parser = HeaderParser::new();
        let mut data = ipv4_frame(6, &[]);
        data[ETH_HEADER_LEN] = 0x4f; // IHL 15 = 60 bytes
        let frame = Frame::outbound("vnet0", data);

        assert!(matches!(
            parser.parse(&frame),
            Err(ParseError::Truncated { expected: 60, .. })
        ));
    }

    #[test]
    fn test_recorded_transport_offset_is_used() {
        let parser = HeaderParser::new();
        let mut l4 = vec![0u8; 4];
        l4.extend_from_slice(&ports_header(1000, 2000, 20));
        // Transport header pushed 4 bytes past the IP header
        let offset = ETH_HEADER_LEN + IPV4_MIN_HEADER_LEN + 4;
        let frame =
            Frame::outbound("vnet0", ipv4_frame(6, &l4)).with_transport_offset(offset);

        let headers = parser.parse(&frame).unwrap();
        assert_eq!(headers.ports_or_zero(), (1000, 2000));
    }
}
