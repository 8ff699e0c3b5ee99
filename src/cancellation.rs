use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheap, shareable flag `deform` polls between iterations.
///
/// Setting it from another thread (or from an input handler in the caller's event
/// loop) causes the in-flight `deform` call to return the current `V_cur` without
/// finishing its remaining iterations, and without an error.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}
