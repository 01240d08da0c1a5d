//! Test and helper mocks for enrich_core

use enrich_traits::{DebugSink, DebugSnapshot};
use std::sync::{Arc, Mutex};

/// Debug sink that keeps every snapshot; clones share the same log so a test
/// can hand one clone to a strategy and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<DebugSnapshot>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<DebugSnapshot> {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<DebugSnapshot> {
        self.log.lock().ok().and_then(|g| g.last().copied())
    }
}

impl DebugSink for RecordingSink {
    fn publish(&mut self, snapshot: &DebugSnapshot) {
        if let Ok(mut g) = self.log.lock() {
            g.push(*snapshot);
        }
    }
}
