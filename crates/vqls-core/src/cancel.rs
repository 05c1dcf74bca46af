//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{VqlsError, VqlsResult};

/// Shared flag checked by the optimizer before each iteration and by the
/// gradient estimator before each cost evaluation.
///
/// Clones observe the same flag. Cancelling never touches committed
/// parameters; the iteration in flight is abandoned.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> VqlsResult<()> {
        if self.is_cancelled() {
            Err(VqlsError::Cancelled)
        } else {
            Ok(())
        }
    }
}
