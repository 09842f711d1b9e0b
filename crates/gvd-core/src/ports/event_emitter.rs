//! Event emitter trait for delivering core events to a front end.

use crate::events::AppEvent;

/// Trait for emitting application events.
///
/// Keeps the delivery mechanism (channel, GUI bridge, terminal renderer) out
/// of the job and dependency coordinators.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts without a listener
/// - `ChannelEmitter` in `gvd-runtime` - forwards into a tokio channel
pub trait AppEventEmitter: Send + Sync {
    /// Emit an application event. Must not block.
    fn emit(&self, event: AppEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn AppEventEmitter>;
}

/// Emitter that discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl AppEventEmitter for NoopEmitter {
    fn emit(&self, _event: AppEvent) {}

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}
