//! Host collaborator contracts.
//!
//! The wire and the tap never talk to a network stack directly. They are
//! handed implementations of these traits:
//!
//! - [`InterfaceRegistrar`]: makes the two endpoints visible to the host.
//! - [`IngressStack`]: accepts frames delivered to an endpoint's receive path.
//! - [`HookRegistrar`]: calls a [`PacketHook`] for every frame crossing an
//!   interception point.
//! - [`StatusRegistrar`]: exposes a [`StatusSource`] as a read-only entry.
//!
//! [`LoopbackHost`] implements all of them in-process.

mod loopback;

pub use loopback::{LoopbackHost, DEFAULT_BACKLOG};

use std::fmt;
use std::sync::Arc;

use macaddr::MacAddr6;

use crate::domain::Frame;
use crate::error::HostError;
use crate::reporter::StatusSource;

/// Interception points on the local IPv4 path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Packets delivered to the local stack.
    LocalIn,
    /// Packets generated by the local stack.
    LocalOut,
}

impl HookPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalIn => "LOCAL_IN",
            Self::LocalOut => "LOCAL_OUT",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook decided about a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Let the frame continue.
    Accept,
}

/// Where a hook invocation happens.
#[derive(Debug, Clone, Copy)]
pub struct HookState<'a> {
    pub point: HookPoint,
    pub in_dev: Option<&'a str>,
    pub out_dev: Option<&'a str>,
}

impl<'a> HookState<'a> {
    pub fn local_in(dev: &'a str) -> Self {
        Self {
            point: HookPoint::LocalIn,
            in_dev: Some(dev),
            out_dev: None,
        }
    }

    pub fn local_out(dev: &'a str) -> Self {
        Self {
            point: HookPoint::LocalOut,
            in_dev: None,
            out_dev: Some(dev),
        }
    }
}

/// A per-frame callback invoked by the host at an interception point.
///
/// Hooks may run concurrently and from contexts that cannot block; an
/// implementation must only take short, non-nested locks.
pub trait PacketHook: Send + Sync {
    fn on_packet(&self, frame: &Frame, state: &HookState<'_>) -> Verdict;
}

/// Identifies a registered hook so it can be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle {
    pub point: HookPoint,
    pub id: u64,
}

/// What the host needs to know about an interface it registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub mac: MacAddr6,
    pub mtu: usize,
    /// The interface does not resolve addresses (no ARP).
    pub no_arp: bool,
    /// The interface checksums in "hardware", so the stack may skip it.
    pub hw_checksum: bool,
}

/// Registers interfaces with the host.
pub trait InterfaceRegistrar {
    fn register_interface(&self, info: &InterfaceInfo) -> Result<(), HostError>;

    fn unregister_interface(&self, name: &str);
}

/// The receive path of the host stack.
pub trait IngressStack: Send + Sync {
    /// Hand a frame to the stack. The stack owns it from here on.
    fn deliver(&self, frame: Frame);
}

/// Registers interception hooks.
pub trait HookRegistrar {
    fn register_hook(
        &self,
        point: HookPoint,
        hook: Arc<dyn PacketHook>,
    ) -> Result<HookHandle, HostError>;

    fn unregister_hook(&self, handle: HookHandle);
}

/// Exposes read-only status entries.
pub trait StatusRegistrar {
    fn register_status(&self, name: &str, source: Arc<dyn StatusSource>)
        -> Result<(), HostError>;

    fn unregister_status(&self, name: &str);
}
