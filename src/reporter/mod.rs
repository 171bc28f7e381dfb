//! Read-only text reports.
//!
//! This module defines the `StatusSource` trait that the host exposes as a
//! readable status entry, and the renderers for the two reports: the
//! capture table and the endpoint statistics table.

mod capture_table;
mod stats_table;

pub use capture_table::{protocol_name, render_capture_table};
pub use stats_table::{render_stats_table, EndpointStatus, WireStatus};

/// A source of read-only status text.
///
/// Implementations snapshot their state and render it; the host returns
/// the text verbatim to readers. There is no write side.
pub trait StatusSource: Send + Sync {
    /// Render the current status.
    fn render(&self) -> String;
}
