//! Channel-backed event emitter.

use gvd_core::{AppEvent, AppEventEmitter};
use tokio::sync::mpsc;

/// Forwards every event into an unbounded tokio channel.
///
/// Emission never blocks; events sent after the receiver is dropped are
/// discarded.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl ChannelEmitter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AppEventEmitter for ChannelEmitter {
    fn emit(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gvd_core::DependencyEvent;

    #[test]
    fn test_events_arrive_in_order() {
        let (emitter, mut rx) = ChannelEmitter::new();
        for percent in [0, 50, 100] {
            emitter.emit(DependencyEvent::Progress { name: "ffmpeg".into(), percent }.into());
        }

        let received: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(received.len(), 3);
        assert_eq!(
            received[2],
            AppEvent::Dependency(DependencyEvent::Progress { name: "ffmpeg".into(), percent: 100 })
        );
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (emitter, rx) = ChannelEmitter::new();
        drop(rx);
        emitter.emit(DependencyEvent::Info { name: "x".into(), message: "y".into() }.into());
    }
}
