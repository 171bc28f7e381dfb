//! In-memory frame playback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::FrameSource;
use crate::error::SourceError;

/// Plays back a fixed list of frames once.
pub struct ReplaySource {
    name: String,
    frames: Vec<Vec<u8>>,
    running: Arc<AtomicBool>,
}

impl ReplaySource {
    pub fn new(name: impl Into<String>, frames: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            frames,
            running: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl FrameSource for ReplaySource {
    fn frames(&mut self) -> Result<Box<dyn Iterator<Item = Vec<u8>> + '_>, SourceError> {
        let running = Arc::clone(&self.running);
        Ok(Box::new(
            self.frames
                .drain(..)
                .take_while(move |_| running.load(Ordering::SeqCst)),
        ))
    }

    fn interface_name(&self) -> &str {
        &self.name
    }

    fn set_running(&mut self, running: Arc<AtomicBool>) {
        self.running = running;
    }
}
