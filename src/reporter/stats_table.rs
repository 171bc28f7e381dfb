//! Endpoint statistics renderer.

use std::fmt::Write;

use crate::domain::{EndpointStats, IfName};

const BANNER: &str = "============== Virtual Network Interface Statistics ==============\n";
const RULE: &str =
    "+-----------+-----------+-------+------------+--------------+------------+--------------+------------+\n";
const HEADER: &str =
    "| Iface     | Peer      | State | RX packets |     RX bytes | TX packets |     TX bytes | TX dropped |\n";

/// Status of one endpoint at snapshot time.
#[derive(Debug, Clone)]
pub struct EndpointStatus {
    pub name: IfName,
    pub peer: Option<IfName>,
    pub open: bool,
    pub stats: EndpointStats,
}

/// Status of the whole wire at snapshot time.
///
/// Counters of the two endpoints are read one after the other, so a
/// transmit may show on one side before the matching receive shows on
/// the other.
#[derive(Debug, Clone)]
pub struct WireStatus {
    pub endpoints: Vec<EndpointStatus>,
    pub captured_frames: usize,
    pub captured_bytes: usize,
    pub evicted_frames: u64,
}

/// Render the endpoint statistics table.
pub fn render_stats_table(status: &WireStatus) -> String {
    let mut output = String::new();

    output.push_str(BANNER);
    output.push_str(RULE);
    output.push_str(HEADER);
    output.push_str(RULE);

    for endpoint in &status.endpoints {
        let peer = endpoint.peer.as_ref().map_or("-", IfName::as_str);
        let state = if endpoint.open { "UP" } else { "DOWN" };
        let _ = writeln!(
            output,
            "| {:<9} | {:<9} | {:<5} | {:>10} | {:>12} | {:>10} | {:>12} | {:>10} |",
            endpoint.name.as_str(),
            peer,
            state,
            endpoint.stats.rx_packets,
            endpoint.stats.rx_bytes,
            endpoint.stats.tx_packets,
            endpoint.stats.tx_bytes,
            endpoint.stats.tx_dropped,
        );
    }
    output.push_str(RULE);

    let _ = writeln!(
        output,
        "Captured frames retained: {} ({} bytes)",
        status.captured_frames, status.captured_bytes
    );
    if status.evicted_frames > 0 {
        let _ = writeln!(output, "Captured frames evicted: {}", status.evicted_frames);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(evicted: u64) -> WireStatus {
        WireStatus {
            endpoints: vec![
                EndpointStatus {
                    name: IfName::new("vnet0"),
                    peer: Some(IfName::new("vnet1")),
                    open: true,
                    stats: EndpointStats {
                        tx_packets: 1,
                        tx_bytes: 64,
                        ..EndpointStats::default()
                    },
                },
                EndpointStatus {
                    name: IfName::new("vnet1"),
                    peer: None,
                    open: false,
                    stats: EndpointStats {
                        rx_packets: 1,
                        rx_bytes: 64,
                        ..EndpointStats::default()
                    },
                },
            ],
            captured_frames: 1,
            captured_bytes: 64,
            evicted_frames: evicted,
        }
    }

    #[test]
    fn test_rows() {
        let text = render_stats_table(&status(0));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[4],
            "| vnet0     | vnet1     | UP    |          0 |            0 |          1 |           64 |          0 |"
        );
        assert_eq!(
            lines[5],
            "| vnet1     | -         | DOWN  |          1 |           64 |          0 |            0 |          0 |"
        );
        assert_eq!(lines[7], "Captured frames retained: 1 (64 bytes)");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_evictions_are_reported() {
        let text = render_stats_table(&status(5));
        assert!(text.ends_with("Captured frames evicted: 5\n"));
    }
}
