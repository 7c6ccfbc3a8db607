//! View scopes: drop responses that arrive after a view went away.
//!
//! Navigating away does not abort requests already on the wire. A view wraps
//! its awaits in `ViewScope::run`; once the view deactivates, late results
//! come back as `None` and are never applied.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

#[derive(Clone, Debug)]
pub struct ViewScope {
    active: Arc<AtomicBool>,
}

impl ViewScope {
    #[must_use]
    pub fn new() -> Self {
        Self { active: Arc::new(AtomicBool::new(true)) }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the view gone. Affects every clone of this scope.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Await `fut`, yielding its output only if the view is still active.
    pub async fn run<F>(&self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        let output = fut.await;
        if self.is_active() {
            Some(output)
        } else {
            debug!("discarding response for inactive view");
            None
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}
