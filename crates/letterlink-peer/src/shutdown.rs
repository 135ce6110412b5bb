use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide cancellation token.
///
/// Clones share one flag. Loops poll [`is_triggered`](Self::is_triggered)
/// between bounded blocking calls, so a trigger takes effect within one
/// polling interval.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    /// Create an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown of every loop holding a clone of this token.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
