use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Explicit cancellation flag threaded through every provider call.
///
/// Cancellation timing is deterministic: long-running work checks the
/// token immediately before each provider round trip and stops with
/// whatever partial results it already produced. Cancelling is a
/// truncation, not a failure.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
