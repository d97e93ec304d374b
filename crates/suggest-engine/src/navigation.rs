//! Navigation boundary.
//!
//! The engine never routes by itself. Committed selections are handed to a
//! `Navigator`, which the host implements on top of its router.

use suggest_core::NavigationAction;
use tokio::sync::mpsc;

/// Receives navigation requests from the engine.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Navigate to a search results page or a product page.
    fn navigate(&self, action: &NavigationAction);
}

/// Forward navigation requests over a channel, for hosts that route on
/// another task.
impl Navigator for mpsc::UnboundedSender<NavigationAction> {
    fn navigate(&self, action: &NavigationAction) {
        if self.send(action.clone()).is_err() {
            tracing::warn!("Navigator channel closed, dropping {}", action.route());
        }
    }
}
