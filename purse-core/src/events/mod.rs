//! UI events and the sink the controllers emit them into.
//!
//! # Event Flow
//!
//! 1. `SendConfirmation` emits transaction, pending, phase and notification events
//! 2. `RequestAmount` emits `AmountPairUpdated` and `ReceiveAddressUpdated`
//! 3. The view layer (or the CLI renderer) drains the receiver
//!
//! Controllers hold an `Arc<dyn StateSink>`; they never read state back
//! from the view.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, StateSink, UiEventReceiver, UiEventSender, ui_event_channel,
};
pub use types::{Notification, UiEvent};
