use std::time::Instant;

use macaddr::MacAddr6;

/// Monotonic tick source for capture timestamps.
///
/// Ticks are milliseconds since the clock was created, so timestamps from
/// the same clock are comparable and never go backwards.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    pub fn ticks(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a MAC address as lowercase colon-separated hex (aa:bb:cc:dd:ee:ff)
pub fn format_mac(mac: &MacAddr6) -> String {
    mac.as_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Check whether an interface name starts with the given prefix.
///
/// An empty prefix matches nothing.
pub fn matches_prefix(name: &str, prefix: &str) -> bool {
    !prefix.is_empty() && name.starts_with(prefix)
}

/// Generate a random locally administered unicast MAC address.
pub fn random_mac() -> MacAddr6 {
    let mut bytes: [u8; 6] = rand::random();
    bytes[0] &= 0xfe; // clear multicast bit
    bytes[0] |= 0x02; // set local assignment bit
    MacAddr6::from(bytes)
}
