//! UI event channel factory and the [`StateSink`] seam.

use super::types::UiEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

/// Default buffer size for event channels.
///
/// This provides enough buffer to handle bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for UI events.
pub type UiEventSender = mpsc::Sender<UiEvent>;
/// Receiver handle for UI events.
pub type UiEventReceiver = mpsc::Receiver<UiEvent>;

/// Create a new UI event channel.
///
/// The sender half implements [`StateSink`] and can be handed to any
/// number of controllers.
pub fn ui_event_channel() -> (UiEventSender, UiEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Destination for state updates produced by the controllers.
#[async_trait]
pub trait StateSink: Send + Sync {
    async fn emit(&self, event: UiEvent);
}

#[async_trait]
impl StateSink for mpsc::Sender<UiEvent> {
    async fn emit(&self, event: UiEvent) {
        let kind = event.kind();
        if let Err(e) = self.send(event).await {
            warn!(event = kind, error = %e, "Failed to send UiEvent, receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sender_delivers_in_order() {
        let (tx, mut rx) = ui_event_channel();
        tx.emit(UiEvent::UpdateSpendPending(true)).await;
        tx.emit(UiEvent::UpdateSpendPending(false)).await;

        assert_eq!(rx.recv().await, Some(UiEvent::UpdateSpendPending(true)));
        assert_eq!(rx.recv().await, Some(UiEvent::UpdateSpendPending(false)));
    }

    #[tokio::test]
    async fn test_emit_after_receiver_dropped_does_not_fail() {
        let (tx, rx) = ui_event_channel();
        drop(rx);
        tx.emit(UiEvent::Reset).await;
    }
}
