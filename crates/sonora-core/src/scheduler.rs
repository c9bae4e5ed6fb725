//! Frame scheduling seam
//!
//! The manager never loops on its own. It asks a `FrameScheduler` for the next
//! frame and gets back a handle; the host later calls
//! `VisualizerManager::on_frame` with that handle. Cancelling a handle
//! guarantees the host will not deliver it.

use std::collections::BTreeSet;

/// Registration token for one pending frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Host-side frame callback registration
pub trait FrameScheduler {
    /// Register interest in the next frame
    fn request_frame(&mut self) -> FrameHandle;

    /// Drop a pending registration. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Deterministic scheduler driven by the caller
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: BTreeSet<u64>,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest pending registration, as the host would when a frame is due
    pub fn next_due(&mut self) -> Option<FrameHandle> {
        self.pending.pop_first().map(FrameHandle)
    }

    /// Number of registrations not yet delivered or cancelled
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Whether a handle is still pending
    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains(&handle.0)
    }

    /// Total registrations made
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Total registrations cancelled while pending
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.requested += 1;
        self.pending.insert(id);
        FrameHandle(id)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending.remove(&handle.0) {
            self.cancelled += 1;
        }
    }
}
