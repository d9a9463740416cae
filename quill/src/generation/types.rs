//! Owned job and result types exchanged with the generation worker.
//!
//! Everything here is `Send` so it can cross from the UI thread to the worker
//! and back without borrowing from either side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use quill_core::generation::{GenerationRequest, OutlineItem, OutlineRequest};

/// Identifies one job for its whole round trip.
pub type JobId = u64;

/// Shared cancellation flag, checked by the worker between chunks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub enum JobKind {
    /// Stream text into a document.
    Stream(GenerationRequest),
    /// Produce an outline to post as a confirmation card.
    Outline(OutlineRequest),
}

/// Command sent from the UI loop to the worker thread.
#[derive(Debug)]
pub struct GenerationJob {
    pub id: JobId,
    pub kind: JobKind,
    pub cancel: CancelFlag,
}

/// Result sent from the worker thread back to the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    Chunk { job: JobId, text: String },
    /// Every chunk of a stream job was delivered.
    Finished { job: JobId },
    Outline { job: JobId, items: Vec<OutlineItem> },
    /// The job stopped early because its cancel flag was set.
    Cancelled { job: JobId },
    Failed { job: JobId, error: String },
}

impl GenerationEvent {
    pub fn job(&self) -> JobId {
        match self {
            GenerationEvent::Chunk { job, .. }
            | GenerationEvent::Finished { job }
            | GenerationEvent::Outline { job, .. }
            | GenerationEvent::Cancelled { job }
            | GenerationEvent::Failed { job, .. } => *job,
        }
    }
}
