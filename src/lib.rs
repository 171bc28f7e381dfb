//! vnetwire - a virtual interface pair with packet capture.
//!
//! Two endpoints are joined back to back: a frame transmitted on one is
//! copied onto the other's receive path, with per-endpoint counters and a
//! full-frame capture list. Independently, a tap hooked into the local
//! IPv4 path summarizes packet headers into a fixed-size ring and renders
//! them as a text table.
//!
//! ```text
//!   host.transmit("vnet0") --LOCAL_OUT--> tap
//!          |
//!          v
//!   VirtualWire::submit -> forward -> CaptureList
//!          |
//!          v
//!   IngressStack::deliver("vnet1") --LOCAL_IN--> tap -> CaptureRing
//! ```

pub mod builder;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod host;
pub mod inspector;
pub mod parser;
pub mod reporter;
pub mod source;
pub mod utils;
pub mod wire;

pub use builder::{FrameBuilder, Transport};
pub use capture::{CaptureList, CaptureRing, DrainSummary};
pub use config::Config;
pub use domain::{EndpointId, Frame};
pub use error::{ForwardError, SetupError, SubmitError};
pub use host::LoopbackHost;
pub use inspector::{Tap, CAPTURE_ENTRY};
pub use wire::{Sent, VirtualWire, STATS_ENTRY};
