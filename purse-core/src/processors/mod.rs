//! Screen controllers.
//!
//! - `SendConfirmation`: builds, signs, broadcasts and saves spends
//! - `RequestAmount`: keeps the request screen's crypto/fiat pair in sync
//!
//! Both receive their collaborators explicitly and report through a
//! [`StateSink`](crate::events::StateSink).

pub mod request_amount;
pub mod send_confirmation;

pub use request_amount::{RequestAmount, RequestError, RequestInput, RequestState};
pub use send_confirmation::{
    SendAction, SendConfirmation, SendConfirmationState, SendOutcome, SpendError, SpendPhase,
    SpendStep,
};
