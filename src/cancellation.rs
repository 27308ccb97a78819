//! # Cancellation of estimation runs
//!
//! Queries already answered have been billed: cancelling only prevents the next ones.
//!

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A handle to stop a run between two rounds, clones share the same flag
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Cancellation::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
