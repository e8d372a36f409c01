use std::sync::atomic::{AtomicBool, Ordering};

/// Whether queue mode is on. Shared by the session and the capture router.
#[derive(Debug, Default)]
pub struct QueueMode {
    active: AtomicBool,
}

impl QueueMode {
    pub fn new(active: bool) -> Self {
        Self {
            active: AtomicBool::new(active),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Set the mode, returning the previous value.
    pub fn set(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::SeqCst)
    }
}
