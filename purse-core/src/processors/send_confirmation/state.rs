//! Send screen state.

use super::error::SpendError;
use crate::wallet::SendForm;
use purse_sdk::objects::{PaymentProtocolInfo, Transaction};

/// Where the current send attempt stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SpendPhase {
    #[default]
    Idle,
    Building,
    Built,
    /// The last build failed quietly; the form is incomplete.
    NotReady,
    BuildFailed,
    Signing,
    Signed,
    Broadcasting,
    Broadcast,
    Saving,
    Saved,
    Failed,
}

/// Everything the send screen renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendConfirmationState {
    pub form: SendForm,
    pub phase: SpendPhase,
    /// Current transaction; `None` means not ready to send.
    pub transaction: Option<Transaction>,
    /// Invoice the current transaction pays, when it came from one.
    pub protocol_info: Option<PaymentProtocolInfo>,
    pub pending: bool,
    pub error: Option<SpendError>,
    pub force_update_gui: bool,
}
