//! UI event type definitions.
//!
//! Events are the only way the controllers talk to the view layer. Each
//! one carries the full value the view needs, so a renderer never has to
//! reach back into controller state.

use crate::processors::send_confirmation::{SpendError, SpendPhase};
use purse_sdk::objects::{
    AmountPair, ParsedPaymentIntent, PaymentProtocolInfo, ReceiveAddress, Transaction,
};

/// User-facing alert with a title and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub success: bool,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The send screen's transaction changed.
    ///
    /// `transaction: None` means "not ready to send". It is only an error
    /// when `error` is set.
    UpdateTransaction {
        transaction: Option<Transaction>,
        parsed_intent: Option<ParsedPaymentIntent>,
        force_update_gui: bool,
        error: Option<SpendError>,
    },
    /// A merchant invoice was built into a transaction.
    UpdatePaymentProtocolTransaction {
        transaction: Transaction,
        info: PaymentProtocolInfo,
    },
    UpdateSpendPending(bool),
    PhaseChanged(SpendPhase),
    UpdateLabel(String),
    Reset,
    Notify(Notification),
    /// Leave the send screen after a completed send.
    DismissSendScreen,
    /// Both sides of the request amount, always together.
    AmountPairUpdated(AmountPair),
    ReceiveAddressUpdated(ReceiveAddress),
}

impl UiEvent {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            UiEvent::UpdateTransaction { .. } => "update_transaction",
            UiEvent::UpdatePaymentProtocolTransaction { .. } => "update_payment_protocol_transaction",
            UiEvent::UpdateSpendPending(_) => "update_spend_pending",
            UiEvent::PhaseChanged(_) => "phase_changed",
            UiEvent::UpdateLabel(_) => "update_label",
            UiEvent::Reset => "reset",
            UiEvent::Notify(_) => "notify",
            UiEvent::DismissSendScreen => "dismiss_send_screen",
            UiEvent::AmountPairUpdated(_) => "amount_pair_updated",
            UiEvent::ReceiveAddressUpdated(_) => "receive_address_updated",
        }
    }
}
