//! Frames and the per-frame metadata a network stack keeps beside the bytes.

use std::fmt;

use macaddr::MacAddr6;
use pnet::packet::ethernet::{EtherType, EthernetPacket};

/// Length of an untagged Ethernet II header.
pub const ETH_HEADER_LEN: usize = 14;

/// Protocol tag for frames too short to carry an Ethernet header.
pub const ETH_P_NONE: EtherType = EtherType(0x0000);
/// Raw 802.3 frame (length field followed by 0xFFFF).
pub const ETH_P_802_3: EtherType = EtherType(0x0001);
/// 802.2 LLC frame (length field followed by an LLC header).
pub const ETH_P_802_2: EtherType = EtherType(0x0004);

/// EtherType values below this are 802.3 length fields.
const ETH_P_802_3_MIN: u16 = 0x0600;

/// Maximum interface name length, excluding the terminator.
const IFNAME_MAX: usize = 15;

/// Fixed-size interface name.
///
/// Stored inline so records carrying a name can be written without
/// allocating. Names longer than 15 bytes are truncated on a character
/// boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IfName {
    bytes: [u8; IFNAME_MAX + 1],
    len: u8,
}

impl IfName {
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(IFNAME_MAX);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = [0u8; IFNAME_MAX + 1];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self {
            bytes,
            len: end as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..usize::from(self.len)]).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Debug for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IfName({:?})", self.as_str())
    }
}

/// Checksum state of a frame's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumState {
    /// Nothing verified yet.
    #[default]
    None,
    /// The receiver does not need to verify (software wire, no corruption).
    Unnecessary,
}

/// Who a received frame was addressed to, relative to the receiving interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacketKind {
    /// Unicast to the receiving interface.
    #[default]
    Host,
    Broadcast,
    Multicast,
    /// Unicast to some other station.
    OtherHost,
    /// Locally generated, on its way out.
    Outgoing,
}

/// A link-layer frame plus the metadata a stack tracks beside it.
///
/// `data` always starts at the Ethernet header. The network header offset
/// is where the IP header starts; the transport offset is only known once a
/// layer above has parsed the IP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    dev: IfName,
    protocol: EtherType,
    kind: PacketKind,
    network_offset: usize,
    transport_offset: Option<usize>,
    checksum: ChecksumState,
}

impl Frame {
    /// Create a locally generated frame about to be transmitted on `dev`.
    ///
    /// The protocol tag is taken from the Ethernet header.
    pub fn outbound(dev: &str, data: Vec<u8>) -> Self {
        let protocol = detect_protocol(&data);
        Self {
            data,
            dev: IfName::new(dev),
            protocol,
            kind: PacketKind::Outgoing,
            network_offset: ETH_HEADER_LEN,
            transport_offset: None,
            checksum: ChecksumState::None,
        }
    }

    /// Build the receive-side view of `data` arriving on `dev`.
    ///
    /// Every piece of metadata is derived from the bytes and the receiving
    /// interface, nothing is carried over from the sender.
    pub fn received(dev: IfName, dev_mac: MacAddr6, data: Vec<u8>) -> Self {
        let protocol = detect_protocol(&data);
        let kind = classify(&data, dev_mac);
        Self {
            data,
            dev,
            protocol,
            kind,
            network_offset: ETH_HEADER_LEN,
            transport_offset: None,
            checksum: ChecksumState::Unnecessary,
        }
    }

    /// Override the protocol tag.
    pub fn with_protocol(mut self, protocol: EtherType) -> Self {
        self.protocol = protocol;
        self
    }

    /// Record where the transport header starts.
    pub fn with_transport_offset(mut self, offset: usize) -> Self {
        self.transport_offset = Some(offset);
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dev(&self) -> &IfName {
        &self.dev
    }

    pub fn protocol(&self) -> EtherType {
        self.protocol
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn checksum(&self) -> ChecksumState {
        self.checksum
    }

    pub fn network_offset(&self) -> usize {
        self.network_offset
    }

    pub fn transport_offset(&self) -> Option<usize> {
        self.transport_offset
    }

    /// Bytes from the network header onwards (empty for runt frames).
    pub fn network_header(&self) -> &[u8] {
        self.data.get(self.network_offset..).unwrap_or_default()
    }
}

/// Determine the protocol tag from the Ethernet type/length field.
fn detect_protocol(data: &[u8]) -> EtherType {
    let Some(ethernet) = EthernetPacket::new(data) else {
        return ETH_P_NONE;
    };

    let ethertype = ethernet.get_ethertype();
    if ethertype.0 >= ETH_P_802_3_MIN {
        return ethertype;
    }

    // Novell raw 802.3 frames start their payload with 0xFFFF
    if data.get(ETH_HEADER_LEN..ETH_HEADER_LEN + 2) == Some(&[0xff, 0xff]) {
        ETH_P_802_3
    } else {
        ETH_P_802_2
    }
}

/// Classify a received frame by its destination address.
fn classify(data: &[u8], own: MacAddr6) -> PacketKind {
    let Some(ethernet) = EthernetPacket::new(data) else {
        return PacketKind::OtherHost;
    };

    let dst = ethernet.get_destination();
    if dst.is_broadcast() {
        PacketKind::Broadcast
    } else if dst.0 & 0x01 != 0 {
        PacketKind::Multicast
    } else if dst.octets() == own.into_array() {
        PacketKind::Host
    } else {
        PacketKind::OtherHost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::packet::ethernet::EtherTypes;

    fn ethernet_frame(dst: [u8; 6], ethertype: [u8; 2], payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&dst);
        data.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        data.extend_from_slice(&ethertype);
        data.extend_from_slice(payload);
        data
    }

    mod ifname_tests {
        use super::*;

        #[test]
        fn keeps_short_names() {
            let name = IfName::new("vnet0");
            assert_eq!(name.as_str(), "vnet0");
            assert!(!name.is_empty());
        }

        #[test]
        fn truncates_long_names() {
            let name = IfName::new("averyveryverylongname");
            assert_eq!(name.as_str(), "averyveryverylo");
        }

        #[test]
        fn truncates_on_char_boundary() {
            // 14 ASCII bytes then a 2-byte character straddling the limit
            let name = IfName::new("abcdefghijklmné");
            assert_eq!(name.as_str(), "abcdefghijklmn");
        }

        #[test]
        fn display_honours_width() {
            assert_eq!(format!("{:<9}|", IfName::new("vnet0")), "vnet0    |");
        }

        #[test]
        fn default_is_empty() {
            assert!(IfName::default().is_empty());
            assert_eq!(IfName::default().as_str(), "");
        }
    }

    mod protocol_tests {
        use super::*;

        #[test]
        fn ethernet_ii_type_is_used() {
            let data = ethernet_frame([0xff; 6], [0x08, 0x00], &[0u8; 20]);
            assert_eq!(detect_protocol(&data), EtherTypes::Ipv4);
        }

        #[test]
        fn runt_frame_has_no_protocol() {
            assert_eq!(detect_protocol(&[0u8; 10]), ETH_P_NONE);
        }

        #[test]
        fn raw_802_3_frame() {
            let data = ethernet_frame([0xff; 6], [0x00, 0x40], &[0xff, 0xff, 0x00]);
            assert_eq!(detect_protocol(&data), ETH_P_802_3);
        }

        #[test]
        fn llc_frame() {
            let data = ethernet_frame([0xff; 6], [0x00, 0x40], &[0x42, 0x42, 0x03]);
            assert_eq!(detect_protocol(&data), ETH_P_802_2);
        }
    }

    mod received_tests {
        use super::*;

        const OWN: [u8; 6] = [0x02, 0x11, 0x22, 0x33, 0x44, 0x55];

        fn receive(dst: [u8; 6]) -> Frame {
            let data = ethernet_frame(dst, [0x08, 0x00], &[0u8; 20]);
            Frame::received(IfName::new("vnet1"), MacAddr6::from(OWN), data)
        }

        #[test]
        fn unicast_to_self_is_host() {
            assert_eq!(receive(OWN).kind(), PacketKind::Host);
        }

        #[test]
        fn broadcast_is_classified() {
            assert_eq!(receive([0xff; 6]).kind(), PacketKind::Broadcast);
        }

        #[test]
        fn multicast_is_classified() {
            assert_eq!(
                receive([0x01, 0x00, 0x5e, 0x00, 0x00, 0x01]).kind(),
                PacketKind::Multicast
            );
        }

        #[test]
        fn unicast_elsewhere_is_other_host() {
            assert_eq!(
                receive([0x02, 0x99, 0x99, 0x99, 0x99, 0x99]).kind(),
                PacketKind::OtherHost
            );
        }

        #[test]
        fn metadata_is_reset() {
            let frame = receive(OWN);
            assert_eq!(frame.dev().as_str(), "vnet1");
            assert_eq!(frame.protocol(), EtherTypes::Ipv4);
            assert_eq!(frame.network_offset(), ETH_HEADER_LEN);
            assert_eq!(frame.transport_offset(), None);
            assert_eq!(frame.checksum(), ChecksumState::Unnecessary);
        }
    }

    #[test]
    fn outbound_frame_metadata() {
        let data = ethernet_frame([0xff; 6], [0x08, 0x06], &[0u8; 28]);
        let frame = Frame::outbound("vnet0", data);
        assert_eq!(frame.kind(), PacketKind::Outgoing);
        assert_eq!(frame.protocol(), EtherTypes::Arp);
        assert_eq!(frame.network_header().len(), 28);
        assert_eq!(frame.len(), 42);
    }

    #[test]
    fn network_header_of_runt_is_empty() {
        let frame = Frame::outbound("vnet0", vec![0u8; 6]);
        assert!(frame.network_header().is_empty());
    }
}
