use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::path::{Path, PathBuf};

use crate::SurfaceId;

/// The active request to write a number of frames from one surface into a directory.
///
/// Each presentation of the target claims one unit of the budget before it attempts a capture.
/// Claiming is atomic, so concurrent presents never claim more than `frame_count` units in total.
#[derive(Debug)]
pub struct CaptureSession {
    target: SurfaceId,
    destination: PathBuf,
    frame_count: u32,

    claimed: AtomicU32,
    written: AtomicU32,
    failed: AtomicU32,
    aborted: AtomicBool,
}

/// A snapshot of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureProgress {
    /// The surface being captured.
    pub target: SurfaceId,

    /// Number of frames requested.
    pub requested: u32,

    /// Number of frames a capture was attempted for.
    pub attempted: u32,

    /// Number of frames written successfully.
    pub written: u32,

    /// Number of frames whose readback or write failed.
    pub failed: u32,

    /// Number of frames still to be captured.
    pub remaining: u32,
}

impl CaptureProgress {
    /// If every requested frame has been attempted.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

impl CaptureSession {
    /// Creates a new session. `frame_count` must already be validated as positive.
    pub fn new(target: SurfaceId, destination: impl Into<PathBuf>, frame_count: u32) -> Self {
        Self {
            target,
            destination: destination.into(),
            frame_count,

            claimed: AtomicU32::new(0),
            written: AtomicU32::new(0),
            failed: AtomicU32::new(0),
            aborted: AtomicBool::new(false),
        }
    }

    /// The surface being captured.
    pub fn target(&self) -> SurfaceId {
        self.target
    }

    /// The directory frames are written into.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Number of frames requested.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Claims one unit of the budget, returning the sequence number of the frame to capture.
    ///
    /// Returns `None` once the budget is spent or the session was aborted.
    pub fn claim(&self) -> Option<u32> {
        if self.aborted.load(Ordering::Acquire) {
            return None;
        }

        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |claimed| {
                (claimed < self.frame_count).then_some(claimed + 1)
            })
            .ok()
    }

    /// Number of frames still to be claimed.
    pub fn remaining(&self) -> u32 {
        self.frame_count
            .saturating_sub(self.claimed.load(Ordering::Acquire))
    }

    /// If the session will still capture frames.
    pub fn is_armed(&self) -> bool {
        !self.aborted.load(Ordering::Acquire) && self.remaining() > 0
    }

    /// Stops the session, no further frames will be claimed.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    /// Records a frame written successfully.
    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::AcqRel);
    }

    /// Records a frame whose capture failed.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::AcqRel);
    }

    /// A snapshot of the session.
    pub fn progress(&self) -> CaptureProgress {
        let attempted = self.claimed.load(Ordering::Acquire);

        CaptureProgress {
            target: self.target,
            requested: self.frame_count,
            attempted,
            written: self.written.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            remaining: self.frame_count.saturating_sub(attempted),
        }
    }
}
