//! In-process host.
//!
//! Stands in for a kernel network stack: keeps a registry of interfaces,
//! hooks and status entries, runs hooks on the local IPv4 path and queues
//! delivered frames per interface.
//!
//! Each interface's inbox is a receive backlog of fixed capacity. Once it
//! is full the oldest frame is dropped and counted. Frames unicast to some
//! other station are dropped before the `LocalIn` hooks run. Link state is
//! not tracked here, so frames reaching a closed endpoint are still
//! delivered.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pnet::packet::ethernet::EtherTypes;
use tracing::{debug, info, trace};

use super::{
    HookHandle, HookPoint, HookRegistrar, HookState, IngressStack, InterfaceInfo,
    InterfaceRegistrar, PacketHook, StatusRegistrar,
};
use crate::domain::{Frame, PacketKind};
use crate::error::{HostError, SubmitError};
use crate::reporter::StatusSource;
use crate::wire::{Sent, VirtualWire};

#[derive(Default)]
struct HostState {
    interfaces: HashMap<String, InterfaceInfo>,
    hooks: Vec<(HookHandle, Arc<dyn PacketHook>)>,
    next_hook_id: u64,
    status: HashMap<String, Arc<dyn StatusSource>>,
    inboxes: HashMap<String, VecDeque<Frame>>,
    /// Registrations that will be rejected (interface, hook point or status names)
    reject: HashSet<String>,
}

/// Frames kept per interface inbox before the oldest is dropped.
pub const DEFAULT_BACKLOG: usize = 1000;

/// A loopback host for the wire and the tap.
///
/// The registry lock is never held while hooks run or while the wire
/// forwards.
pub struct LoopbackHost {
    state: Mutex<HostState>,
    backlog: usize,
    delivered: AtomicU64,
    backlog_dropped: AtomicU64,
    other_host_dropped: AtomicU64,
}

impl Default for LoopbackHost {
    fn default() -> Self {
        Self::with_backlog(DEFAULT_BACKLOG)
    }
}

impl LoopbackHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host whose inboxes hold at most `backlog` frames each.
    ///
    /// A backlog of 0 keeps nothing: frames still pass the hooks and are
    /// then dropped.
    pub fn with_backlog(backlog: usize) -> Self {
        Self {
            state: Mutex::new(HostState::default()),
            backlog,
            delivered: AtomicU64::new(0),
            backlog_dropped: AtomicU64::new(0),
            other_host_dropped: AtomicU64::new(0),
        }
    }

    /// Make future registrations of `name` fail.
    ///
    /// `name` is matched against interface names, status entry names and
    /// hook point names (`LOCAL_IN`, `LOCAL_OUT`).
    pub fn reject_registration(&self, name: &str) {
        self.state.lock().reject.insert(name.to_string());
    }

    /// Transmit `data` from the local stack on interface `dev`.
    ///
    /// Runs the `LocalOut` hooks, then submits the frame to the wire's
    /// transmit path.
    pub fn transmit(
        &self,
        wire: &VirtualWire,
        dev: &str,
        data: Vec<u8>,
    ) -> Result<Sent, SubmitError> {
        let endpoint = wire
            .endpoint_by_name(dev)
            .ok_or_else(|| SubmitError::UnknownInterface(dev.to_string()))?;

        let frame = Frame::outbound(dev, data);
        if frame.protocol() == EtherTypes::Ipv4 {
            self.run_hooks(&frame, &HookState::local_out(dev));
        }

        wire.submit(endpoint.id(), frame)
    }

    /// Remove and return everything delivered to `dev` so far.
    pub fn take_inbox(&self, dev: &str) -> Vec<Frame> {
        self.state
            .lock()
            .inboxes
            .get_mut(dev)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn inbox_len(&self, dev: &str) -> usize {
        self.state.lock().inboxes.get(dev).map_or(0, VecDeque::len)
    }

    pub fn backlog(&self) -> usize {
        self.backlog
    }

    /// Total frames delivered through the ingress path.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Frames dropped because an inbox was full.
    pub fn backlog_dropped(&self) -> u64 {
        self.backlog_dropped.load(Ordering::Relaxed)
    }

    /// Frames dropped because they were unicast to another station.
    pub fn other_host_dropped(&self) -> u64 {
        self.other_host_dropped.load(Ordering::Relaxed)
    }

    /// Read a status entry, returning its text verbatim.
    pub fn read_status(&self, name: &str) -> Option<String> {
        let source = self.state.lock().status.get(name).cloned()?;
        Some(source.render())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.state.lock().interfaces.contains_key(name)
    }

    pub fn interface(&self, name: &str) -> Option<InterfaceInfo> {
        self.state.lock().interfaces.get(name).cloned()
    }

    pub fn has_status(&self, name: &str) -> bool {
        self.state.lock().status.contains_key(name)
    }

    pub fn hook_count(&self) -> usize {
        self.state.lock().hooks.len()
    }

    fn run_hooks(&self, frame: &Frame, hook_state: &HookState<'_>) {
        let hooks: Vec<Arc<dyn PacketHook>> = self
            .state
            .lock()
            .hooks
            .iter()
            .filter(|(handle, _)| handle.point == hook_state.point)
            .map(|(_, hook)| Arc::clone(hook))
            .collect();

        for hook in hooks {
            hook.on_packet(frame, hook_state);
        }
    }

    fn check_rejected(state: &HostState, name: &str) -> Result<(), HostError> {
        if state.reject.contains(name) {
            return Err(HostError::Rejected {
                name: name.to_string(),
                reason: "registration refused by host".to_string(),
            });
        }
        Ok(())
    }
}

impl InterfaceRegistrar for LoopbackHost {
    fn register_interface(&self, info: &InterfaceInfo) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check_rejected(&state, &info.name)?;
        if state.interfaces.contains_key(&info.name) {
            return Err(HostError::AlreadyRegistered(info.name.clone()));
        }

        state.interfaces.insert(info.name.clone(), info.clone());
        state.inboxes.entry(info.name.clone()).or_default();
        debug!("Registered interface {} (mtu {})", info.name, info.mtu);
        Ok(())
    }

    fn unregister_interface(&self, name: &str) {
        let mut state = self.state.lock();
        state.interfaces.remove(name);
        state.inboxes.remove(name);
        debug!("Unregistered interface {}", name);
    }
}

impl IngressStack for LoopbackHost {
    fn deliver(&self, frame: Frame) {
        self.delivered.fetch_add(1, Ordering::Relaxed);

        if frame.kind() == PacketKind::OtherHost {
            self.other_host_dropped.fetch_add(1, Ordering::Relaxed);
            trace!("{}: dropping frame for another host", frame.dev());
            return;
        }

        if frame.protocol() == EtherTypes::Ipv4 {
            let dev = *frame.dev();
            self.run_hooks(&frame, &HookState::local_in(dev.as_str()));
        }

        let mut state = self.state.lock();
        let Some(inbox) = state.inboxes.get_mut(frame.dev().as_str()) else {
            debug!("Dropping frame for unregistered interface {}", frame.dev());
            return;
        };

        inbox.push_back(frame);
        let mut overflow = 0;
        while inbox.len() > self.backlog {
            inbox.pop_front();
            overflow += 1;
        }
        if overflow > 0 {
            self.backlog_dropped.fetch_add(overflow, Ordering::Relaxed);
        }
    }
}

impl HookRegistrar for LoopbackHost {
    fn register_hook(
        &self,
        point: HookPoint,
        hook: Arc<dyn PacketHook>,
    ) -> Result<HookHandle, HostError> {
        let mut state = self.state.lock();
        Self::check_rejected(&state, point.as_str())?;

        let handle = HookHandle {
            point,
            id: state.next_hook_id,
        };
        state.next_hook_id += 1;
        state.hooks.push((handle, hook));
        info!("Registered {} hook", point);
        Ok(handle)
    }

    fn unregister_hook(&self, handle: HookHandle) {
        self.state.lock().hooks.retain(|(h, _)| *h != handle);
        info!("Unregistered {} hook", handle.point);
    }
}

impl StatusRegistrar for LoopbackHost {
    fn register_status(
        &self,
        name: &str,
        source: Arc<dyn StatusSource>,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock();
        Self::check_rejected(&state, name)?;
        if state.status.contains_key(name) {
            return Err(HostError::AlreadyRegistered(name.to_string()));
        }
        state.status.insert(name.to_string(), source);
        Ok(())
    }

    fn unregister_status(&self, name: &str) {
        self.state.lock().status.remove(name);
    }
}
