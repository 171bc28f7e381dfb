use thiserror::Error;

use crate::domain::Frame;
use crate::host::HookPoint;

/// Per-packet failures on the forwarding path.
///
/// Both variants are drops: the frame is released, the source's
/// `tx_dropped` counter is bumped and nothing reaches the peer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForwardError {
    #[error("no peer paired with {source_name}")]
    NoPeer { source_name: String },

    #[error("could not allocate a {len}-byte frame copy")]
    AllocationFailed { len: usize },
}

/// Errors from the host-facing transmit entry point.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The endpoint is closed. The frame is handed back untouched.
    #[error("transmit queue stopped")]
    QueueStopped(Frame),

    #[error("frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("no wire endpoint named {0}")]
    UnknownInterface(String),

    #[error(transparent)]
    Forward(#[from] ForwardError),
}

/// Header parsing errors. The inspector swallows all of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("not an IPv4 frame (ethertype {ethertype:#06x})")]
    NotIpv4 { ethertype: u16 },

    #[error("header truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unsupported IP version {0}")]
    BadVersion(u8),

    #[error("invalid IPv4 header length {0}")]
    BadHeaderLength(usize),
}

/// Failures reported by host collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("'{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("'{0}' is not registered")]
    NotRegistered(String),

    #[error("host rejected '{name}': {reason}")]
    Rejected { name: String, reason: String },
}

/// Setup failures. Nothing stays registered when one of these is returned.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to register interface {name}: {source}")]
    Interface { name: String, source: HostError },

    #[error("failed to register {point} hook: {source}")]
    Hook { point: HookPoint, source: HostError },

    #[error("failed to create status entry {name}: {source}")]
    Status { name: String, source: HostError },
}

/// Errors opening a live frame source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("Failed to create capture channel: {0}")]
    ChannelCreation(String),

    #[error("Insufficient permissions for packet capture (try running as root)")]
    InsufficientPermissions,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}
