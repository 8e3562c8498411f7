//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging observers (logging, metrics,
//! alerting) into the session runtime.
//!
//! Each subscriber gets:
//! - **Dedicated worker task**
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are reported as `EventKind::SubscriberPanicked`)
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use agentlink::{Event, EventKind, Subscribe};
//!
//! struct ReconnectCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for ReconnectCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::BackoffScheduled) {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "reconnects" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of session events.
///
/// Runs on its own worker task, so a slow or failing subscriber only loses its
/// own events. Keep `on_event` non-blocking and never panic on purpose.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event; events arrive in publish order.
    async fn on_event(&self, event: &Event);

    /// Name reported in `SubscriberOverflow` / `SubscriberPanicked` events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Bounded queue size (min 1). Default: 256.
    fn queue_capacity(&self) -> usize {
        256
    }
}
