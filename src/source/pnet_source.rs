//! Live frames from a host interface through pnet's datalink layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, NetworkInterface};
use tracing::debug;

use super::FrameSource;
use crate::error::SourceError;

/// How long a read may block before the running flag is checked again.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Reads every frame seen on a host interface.
pub struct PnetSource {
    interface: NetworkInterface,
    running: Arc<AtomicBool>,
}

impl PnetSource {
    /// Open the interface named `interface_name`.
    pub fn new(interface_name: &str) -> Result<Self, SourceError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| SourceError::InterfaceNotFound(interface_name.to_string()))?;

        Ok(Self::with_interface(interface))
    }

    /// Open the first interface that is up, not loopback and has an address.
    pub fn on_default_interface() -> Result<Self, SourceError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.is_up() && !iface.is_loopback() && !iface.ips.is_empty())
            .ok_or_else(|| {
                SourceError::InterfaceNotFound("no suitable interface found".to_string())
            })?;

        Ok(Self::with_interface(interface))
    }

    fn with_interface(interface: NetworkInterface) -> Self {
        Self {
            interface,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// One line per host interface: name, state, MAC and addresses.
    pub fn list_interfaces() -> Vec<String> {
        datalink::interfaces()
            .into_iter()
            .map(|iface| {
                let state = if iface.is_up() { "UP" } else { "DOWN" };
                let mac = iface
                    .mac
                    .map(|mac| mac.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let ips: Vec<_> = iface.ips.iter().map(|ip| ip.to_string()).collect();
                let ips = if ips.is_empty() {
                    "no IP".to_string()
                } else {
                    ips.join(", ")
                };
                format!("{}: {} {} [{}]", iface.name, state, mac, ips)
            })
            .collect()
    }
}

impl FrameSource for PnetSource {
    fn frames(&mut self) -> Result<Box<dyn Iterator<Item = Vec<u8>> + '_>, SourceError> {
        let config = Config {
            read_timeout: Some(READ_TIMEOUT),
            ..Config::default()
        };

        let rx = match datalink::channel(&self.interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => {
                return Err(SourceError::ChannelCreation(
                    "unsupported channel type".to_string(),
                ))
            }
            Err(e) => {
                let msg = e.to_string();
                if e.kind() == std::io::ErrorKind::PermissionDenied
                    || msg.contains("Operation not permitted")
                {
                    return Err(SourceError::InsufficientPermissions);
                }
                return Err(SourceError::ChannelCreation(msg));
            }
        };

        Ok(Box::new(LiveFrames {
            rx,
            running: Arc::clone(&self.running),
        }))
    }

    fn interface_name(&self) -> &str {
        &self.interface.name
    }

    fn set_running(&mut self, running: Arc<AtomicBool>) {
        self.running = running;
    }
}

/// Blocking iterator over received frames, ending once `running` clears.
struct LiveFrames {
    rx: Box<dyn datalink::DataLinkReceiver>,
    running: Arc<AtomicBool>,
}

impl Iterator for LiveFrames {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.running.load(Ordering::SeqCst) {
            match self.rx.next() {
                Ok(frame) => return Some(frame.to_vec()),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => debug!("Capture error: {}", e),
            }
        }
        None
    }
}
