//! Cooperative cancellation of build passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag that requests cancellation of a running pass.
///
/// Cancellation is cooperative: the scheduler checks the flag at phase
/// boundaries and before starting each compile job. In-flight toolchain
/// invocations always run to completion; nothing is killed mid-process.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears the flag so the same token can gate a new pass.
    ///
    /// Called by the session before each pass; clones handed out earlier
    /// stay wired to the same flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
