//! Interception hook feeding the inspector.

use std::sync::Arc;

use super::PacketInspector;
use crate::domain::{Frame, HookDirection};
use crate::host::{HookPoint, HookState, PacketHook, Verdict};
use crate::utils::matches_prefix;

/// Passes frames on matching interfaces to the inspector.
///
/// The interface is the inbound device at `LocalIn` and the outbound device
/// at `LocalOut`. Frames are always accepted.
pub struct CaptureHook {
    inspector: Arc<PacketInspector>,
    prefix: String,
}

impl CaptureHook {
    pub fn new(inspector: Arc<PacketInspector>, prefix: impl Into<String>) -> Self {
        Self {
            inspector,
            prefix: prefix.into(),
        }
    }
}

impl PacketHook for CaptureHook {
    fn on_packet(&self, frame: &Frame, state: &HookState<'_>) -> Verdict {
        let (device, direction) = match state.point {
            HookPoint::LocalIn => (state.in_dev, HookDirection::In),
            HookPoint::LocalOut => (state.out_dev, HookDirection::Out),
        };
        let Some(interface) = device else {
            return Verdict::Accept;
        };

        if matches_prefix(interface, &self.prefix) {
            self.inspector.inspect(frame, interface, direction);
        }

        Verdict::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FrameBuilder, Transport};
    use crate::capture::CaptureRing;
    use crate::utils::Clock;

    fn hook() -> CaptureHook {
        let ring = Arc::new(CaptureRing::new(16));
        CaptureHook::new(Arc::new(PacketInspector::new(ring, Clock::new())), "vnet")
    }

    fn frame(dev: &str) -> Frame {
        Frame::outbound(dev, FrameBuilder::new().build(Transport::Udp, 60))
    }

    #[test]
    fn test_matching_interface_is_recorded() {
        let hook = hook();
        let verdict = hook.on_packet(&frame("vnet1"), &HookState::local_in("vnet1"));

        assert_eq!(verdict, Verdict::Accept);
        let record = hook.inspector.ring().snapshot().records[0];
        assert_eq!(record.interface.as_str(), "vnet1");
        assert_eq!(record.direction, HookDirection::In);
    }

    #[test]
    fn test_out_direction() {
        let hook = hook();
        hook.on_packet(&frame("vnet0"), &HookState::local_out("vnet0"));

        let record = hook.inspector.ring().snapshot().records[0];
        assert_eq!(record.direction, HookDirection::Out);
    }

    #[test]
    fn test_device_follows_hook_point() {
        let hook = hook();
        let state = HookState {
            point: HookPoint::LocalOut,
            in_dev: Some("vnet1"),
            out_dev: None,
        };
        hook.on_packet(&frame("vnet1"), &state);
        assert_eq!(hook.inspector.ring().total(), 0);

        let state = HookState {
            point: HookPoint::LocalIn,
            in_dev: Some("eth0"),
            out_dev: Some("vnet0"),
        };
        hook.on_packet(&frame("eth0"), &state);
        assert_eq!(hook.inspector.ring().total(), 0);
    }

    #[test]
    fn test_other_interfaces_are_skipped() {
        let hook = hook();
        let verdict = hook.on_packet(&frame("eth0"), &HookState::local_in("eth0"));

        assert_eq!(verdict, Verdict::Accept);
        assert_eq!(hook.inspector.ring().total(), 0);
    }
}
