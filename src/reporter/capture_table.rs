//! Capture ring table renderer.
//!
//! The column layout is consumed by existing tooling and must not change.

use std::borrow::Cow;
use std::fmt::Write;

use crate::capture::RingSnapshot;
use crate::domain::PacketSummaryRecord;

const BANNER: &str =
    "============== Virtual Network Packet Capture Statistics ==============\n";
const HEADER_RULE: &str =
    "+------------+-----+-----------------+-------+-----------------+-------+-------+------+-----------+\n";
const HEADER: &str =
    "| Timestamp  | Dir |   Source IP     | SPort |     Dest IP     | DPort | Proto | Len  |   Iface   |\n";
// Narrower address columns than the header rule; parsers key on it as-is.
const FOOTER_RULE: &str =
    "+------------+-----+---------------+-------+---------------+-------+-------+------+-----------+\n";

/// Display name of an IP protocol number.
pub fn protocol_name(protocol: u8) -> Cow<'static, str> {
    match protocol {
        1 => Cow::Borrowed("ICMP"),
        6 => Cow::Borrowed("TCP"),
        17 => Cow::Borrowed("UDP"),
        other => Cow::Owned(other.to_string()),
    }
}

/// Render the capture table for a ring snapshot.
///
/// Rows are the retained window, oldest first.
pub fn render_capture_table(snapshot: &RingSnapshot) -> String {
    let mut output = String::with_capacity(512 + snapshot.records.len() * 104);

    output.push_str(BANNER);
    let _ = writeln!(output, "Total packets captured: {}", snapshot.total);
    let _ = writeln!(
        output,
        "Current buffer size: {} packets",
        snapshot.records.len()
    );
    output.push('\n');

    output.push_str(HEADER_RULE);
    output.push_str(HEADER);
    output.push_str(HEADER_RULE);

    for record in &snapshot.records {
        format_row(&mut output, record);
    }

    output.push_str(FOOTER_RULE);
    output
}

fn format_row(output: &mut String, record: &PacketSummaryRecord) {
    let _ = writeln!(
        output,
        "| {:>10} | {:<3} | {:>15} | {:>5} | {:>15} | {:>5} | {:>5} | {:>4} | {:<9} |",
        record.timestamp,
        record.direction.as_str(),
        record.src_addr.to_string(),
        record.src_port,
        record.dst_addr.to_string(),
        record.dst_port,
        protocol_name(record.protocol),
        record.length,
        record.interface.as_str(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HookDirection, IfName};
    use std::net::Ipv4Addr;

    fn record(protocol: u8) -> PacketSummaryRecord {
        PacketSummaryRecord {
            timestamp: 4_294_901_234,
            src_addr: Ipv4Addr::new(10, 0, 0, 1),
            dst_addr: Ipv4Addr::new(192, 168, 100, 200),
            src_port: 443,
            dst_port: 51000,
            protocol,
            length: 1500,
            interface: IfName::new("vnet0"),
            direction: HookDirection::In,
        }
    }

    fn snapshot(records: Vec<PacketSummaryRecord>, total: u64) -> RingSnapshot {
        RingSnapshot {
            total,
            capacity: 1000,
            records,
        }
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(protocol_name(1), "ICMP");
        assert_eq!(protocol_name(6), "TCP");
        assert_eq!(protocol_name(17), "UDP");
        assert_eq!(protocol_name(47), "47");
    }

    #[test]
    fn test_empty_table() {
        let text = render_capture_table(&snapshot(Vec::new(), 0));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], BANNER.trim_end());
        assert_eq!(lines[1], "Total packets captured: 0");
        assert_eq!(lines[2], "Current buffer size: 0 packets");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], HEADER_RULE.trim_end());
        assert_eq!(lines[5], HEADER.trim_end());
        assert_eq!(lines[6], HEADER_RULE.trim_end());
        assert_eq!(lines[7], FOOTER_RULE.trim_end());
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_row_layout() {
        let text = render_capture_table(&snapshot(vec![record(6)], 1));
        let row = text.lines().nth(7).unwrap();

        assert_eq!(
            row,
            "| 4294901234 | IN  |        10.0.0.1 |   443 | 192.168.100.200 | 51000 |   TCP | 1500 | vnet0     |"
        );
    }

    #[test]
    fn test_out_direction_and_numeric_protocol() {
        let mut rec = record(47);
        rec.direction = HookDirection::Out;
        rec.timestamp = 7;
        rec.src_port = 0;
        rec.dst_port = 0;
        let text = render_capture_table(&snapshot(vec![rec], 1));
        let row = text.lines().nth(7).unwrap();

        assert_eq!(
            row,
            "|          7 | OUT |        10.0.0.1 |     0 | 192.168.100.200 |     0 |    47 | 1500 | vnet0     |"
        );
    }

    #[test]
    fn test_total_and_buffer_size_differ_after_wrap() {
        let records = vec![record(17); 3];
        let text = render_capture_table(&snapshot(records, 1200));

        assert!(text.contains("Total packets captured: 1200\n"));
        assert!(text.contains("Current buffer size: 3 packets\n"));
        assert_eq!(text.lines().filter(|l| l.contains("UDP")).count(), 3);
    }
}
