//! Packet inspection tap.
//!
//! The tap is independent of the wire: it is attached to the host's local
//! IPv4 path, summarizes frames on interfaces matching a prefix and keeps
//! the summaries in a [`CaptureRing`].

mod capture_hook;
mod packet_inspector;

pub use capture_hook::CaptureHook;
pub use packet_inspector::PacketInspector;

use std::sync::Arc;

use tracing::info;

use crate::capture::CaptureRing;
use crate::config::Config;
use crate::error::SetupError;
use crate::host::{HookHandle, HookPoint, HookRegistrar, StatusRegistrar};
use crate::utils::Clock;

/// Name of the capture ring status entry.
pub const CAPTURE_ENTRY: &str = "vnet_capture";

/// An installed capture tap.
pub struct Tap {
    inspector: Arc<PacketInspector>,
    hooks: [HookHandle; 2],
}

impl Tap {
    /// Register the capture status entry, then the `LocalIn` hook, then the
    /// `LocalOut` hook.
    ///
    /// If a step fails, the steps before it are undone in reverse order.
    pub fn install<R>(config: &Config, clock: Clock, host: &R) -> Result<Self, SetupError>
    where
        R: HookRegistrar + StatusRegistrar + ?Sized,
    {
        if config.ring_capacity == 0 {
            return Err(SetupError::InvalidConfig(
                "ring_capacity must be greater than zero".to_string(),
            ));
        }

        let ring = Arc::new(CaptureRing::new(config.ring_capacity));
        let inspector = Arc::new(PacketInspector::new(Arc::clone(&ring), clock));
        let hook = Arc::new(CaptureHook::new(
            Arc::clone(&inspector),
            config.hook_prefix.clone(),
        ));

        host.register_status(CAPTURE_ENTRY, ring)
            .map_err(|source| SetupError::Status {
                name: CAPTURE_ENTRY.to_string(),
                source,
            })?;

        let local_in = match host.register_hook(HookPoint::LocalIn, hook.clone()) {
            Ok(handle) => handle,
            Err(source) => {
                host.unregister_status(CAPTURE_ENTRY);
                return Err(SetupError::Hook {
                    point: HookPoint::LocalIn,
                    source,
                });
            }
        };

        let local_out = match host.register_hook(HookPoint::LocalOut, hook) {
            Ok(handle) => handle,
            Err(source) => {
                host.unregister_hook(local_in);
                host.unregister_status(CAPTURE_ENTRY);
                return Err(SetupError::Hook {
                    point: HookPoint::LocalOut,
                    source,
                });
            }
        };

        info!(
            "Capture tap installed on '{}*' ({} slots)",
            config.hook_prefix, config.ring_capacity
        );

        Ok(Self {
            inspector,
            hooks: [local_in, local_out],
        })
    }

    pub fn inspector(&self) -> &Arc<PacketInspector> {
        &self.inspector
    }

    pub fn ring(&self) -> &Arc<CaptureRing> {
        self.inspector.ring()
    }

    /// Render the capture table.
    pub fn report(&self) -> String {
        self.ring().report()
    }

    /// Remove both hooks and the status entry.
    pub fn uninstall<R>(self, host: &R)
    where
        R: HookRegistrar + StatusRegistrar + ?Sized,
    {
        for handle in self.hooks.into_iter().rev() {
            host.unregister_hook(handle);
        }
        host.unregister_status(CAPTURE_ENTRY);
        info!(
            "Capture tap removed after {} packets",
            self.inspector.ring().total()
        );
    }
}
