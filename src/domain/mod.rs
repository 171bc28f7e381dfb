//! Domain models for the virtual wire and its capture stores.
//!
//! These types carry no locking or host concerns; the wire, the
//! capture stores and the inspector build on them.

mod frame;
mod records;
mod stats;

pub use frame::{
    ChecksumState, Frame, IfName, PacketKind, ETH_HEADER_LEN, ETH_P_802_2, ETH_P_802_3,
    ETH_P_NONE,
};
pub use records::{FullFrameCaptureRecord, HookDirection, PacketSummaryRecord, WireDirection};
pub use stats::{EndpointId, EndpointStats};
