//! Capture stores.
//!
//! Two independent stores with independent locks:
//!
//! - [`CaptureRing`]: fixed-capacity ring of header summaries, written by the
//!   inspector from contexts that must not block or allocate.
//! - [`CaptureList`]: insertion-ordered list of full frame copies, written by
//!   the forwarder and drained at teardown.
//!
//! They record overlapping traffic at different points and are never merged.

mod list;
mod ring;

pub use list::{CaptureList, DrainSummary};
pub use ring::{CaptureRing, RingBuffer, RingSnapshot};
