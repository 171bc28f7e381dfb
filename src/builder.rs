//! Synthetic Ethernet/IPv4 frames.

use std::net::Ipv4Addr;

use macaddr::MacAddr6;
use pnet::packet::ethernet::{EtherType, EtherTypes, MutableEthernetPacket};
use pnet::packet::icmp::{self, IcmpCode, IcmpTypes, MutableIcmpPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::{self, MutableIpv4Packet};
use pnet::packet::tcp::{self, MutableTcpPacket, TcpFlags};
use pnet::packet::udp::{self, MutableUdpPacket};
use pnet::packet::MutablePacket;
use pnet::util::MacAddr;

use crate::domain::ETH_HEADER_LEN;

const IPV4_HEADER_LEN: usize = 20;
const TCP_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;
const ICMP_HEADER_LEN: usize = 8;

/// Transport carried by a synthetic frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
    Icmp,
}

impl Transport {
    pub fn protocol(&self) -> IpNextHeaderProtocol {
        match self {
            Self::Tcp => IpNextHeaderProtocols::Tcp,
            Self::Udp => IpNextHeaderProtocols::Udp,
            Self::Icmp => IpNextHeaderProtocols::Icmp,
        }
    }

    fn header_len(&self) -> usize {
        match self {
            Self::Tcp => TCP_HEADER_LEN,
            Self::Udp => UDP_HEADER_LEN,
            Self::Icmp => ICMP_HEADER_LEN,
        }
    }
}

/// Builds well-formed frames with valid IPv4 and transport checksums.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    src_mac: MacAddr6,
    dst_mac: MacAddr6,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    ttl: u8,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self {
            src_mac: MacAddr6::new(0x02, 0x00, 0x00, 0x00, 0x00, 0x01),
            dst_mac: MacAddr6::broadcast(),
            src_ip: Ipv4Addr::new(10, 0, 0, 1),
            dst_ip: Ipv4Addr::new(10, 0, 0, 2),
            src_port: 40000,
            dst_port: 80,
            ttl: 64,
        }
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destination_mac(mut self, mac: MacAddr6) -> Self {
        self.dst_mac = mac;
        self
    }

    pub fn source(mut self, addr: Ipv4Addr, port: u16) -> Self {
        self.src_ip = addr;
        self.src_port = port;
        self
    }

    pub fn destination(mut self, addr: Ipv4Addr, port: u16) -> Self {
        self.dst_ip = addr;
        self.dst_port = port;
        self
    }

    /// Shortest frame that carries complete headers for `transport`.
    pub fn min_len(transport: Transport) -> usize {
        ETH_HEADER_LEN + IPV4_HEADER_LEN + transport.header_len()
    }

    /// Build a frame of `frame_len` bytes, zero payload.
    ///
    /// Lengths below [`min_len`](Self::min_len) are raised to it; the IPv4
    /// total length is capped at 65535.
    pub fn build(&self, transport: Transport, frame_len: usize) -> Vec<u8> {
        let frame_len = frame_len
            .max(Self::min_len(transport))
            .min(ETH_HEADER_LEN + usize::from(u16::MAX));
        let mut buf = vec![0u8; frame_len];
        self.write(&mut buf, transport);
        buf
    }

    /// Build a non-IP frame with an arbitrary EtherType.
    pub fn ethernet(&self, ethertype: EtherType, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; ETH_HEADER_LEN + payload.len()];
        if let Some(mut eth) = MutableEthernetPacket::new(&mut buf) {
            eth.set_destination(to_pnet(self.dst_mac));
            eth.set_source(to_pnet(self.src_mac));
            eth.set_ethertype(ethertype);
            eth.payload_mut().copy_from_slice(payload);
        }
        buf
    }

    fn write(&self, buf: &mut [u8], transport: Transport) -> Option<()> {
        let ip_len = u16::try_from(buf.len() - ETH_HEADER_LEN).ok()?;

        let mut eth = MutableEthernetPacket::new(buf)?;
        eth.set_destination(to_pnet(self.dst_mac));
        eth.set_source(to_pnet(self.src_mac));
        eth.set_ethertype(EtherTypes::Ipv4);

        let mut ip = MutableIpv4Packet::new(eth.payload_mut())?;
        ip.set_version(4);
        ip.set_header_length((IPV4_HEADER_LEN / 4) as u8);
        ip.set_total_length(ip_len);
        ip.set_ttl(self.ttl);
        ip.set_next_level_protocol(transport.protocol());
        ip.set_source(self.src_ip);
        ip.set_destination(self.dst_ip);

        match transport {
            Transport::Tcp => {
                let mut tcp = MutableTcpPacket::new(ip.payload_mut())?;
                tcp.set_source(self.src_port);
                tcp.set_destination(self.dst_port);
                tcp.set_data_offset((TCP_HEADER_LEN / 4) as u8);
                tcp.set_flags(TcpFlags::SYN);
                tcp.set_window(64240);
                let checksum = tcp::ipv4_checksum(&tcp.to_immutable(), &self.src_ip, &self.dst_ip);
                tcp.set_checksum(checksum);
            }
            Transport::Udp => {
                let mut udp = MutableUdpPacket::new(ip.payload_mut())?;
                udp.set_source(self.src_port);
                udp.set_destination(self.dst_port);
                udp.set_length(ip_len - IPV4_HEADER_LEN as u16);
                let checksum = udp::ipv4_checksum(&udp.to_immutable(), &self.src_ip, &self.dst_ip);
                udp.set_checksum(checksum);
            }
            Transport::Icmp => {
                let mut icmp = MutableIcmpPacket::new(ip.payload_mut())?;
                icmp.set_icmp_type(IcmpTypes::EchoRequest);
                icmp.set_icmp_code(IcmpCode::new(0));
                let checksum = icmp::checksum(&icmp.to_immutable());
                icmp.set_checksum(checksum);
            }
        }

        let checksum = ipv4::checksum(&ip.to_immutable());
        ip.set_checksum(checksum);
        Some(())
    }
}

fn to_pnet(mac: MacAddr6) -> MacAddr {
    let [a, b, c, d, e, f] = mac.into_array();
    MacAddr::new(a, b, c, d, e, f)
}
