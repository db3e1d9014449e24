//! SendConfirmation processor.
//!
//! The SendConfirmation controller is responsible for:
//! - Rebuilding the transaction whenever the amount, fee, unique identifier
//!   or payment target changes
//! - Resolving payment-protocol invoices into a transaction
//! - Running sign → broadcast → save at most once at a time
//! - Reporting every outcome to the view through the [`StateSink`]
//!
//! Engine failures never escape: each becomes a phase transition and, for
//! a send attempt, exactly one notification.

pub mod error;
pub mod state;

pub use error::{SpendError, SpendStep};
pub use state::{SendConfirmationState, SpendPhase};

use crate::engine::EngineError;
use crate::events::{Notification, StateSink, UiEvent};
use crate::wallet::{SpendInfoBuilder, WalletGateway};
use kanau::processor::Processor;
use purse_sdk::amount::mul_decimal_str;
use purse_sdk::config::SendConfig;
use purse_sdk::objects::{Metadata, NetworkFeeOption, ParsedPaymentIntent, Transaction};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Result of a send-screen action.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// A transaction is ready to send.
    Built(Transaction),
    /// Nothing to send yet.
    NotReady,
    BuildFailed(SpendError),
    /// Signed, broadcast and saved.
    Sent(Transaction),
    /// The send attempt failed at the given error.
    Failed(SpendError),
    /// A send attempt is already in flight; nothing was done.
    AlreadyPending,
    /// A query failed and left the state untouched.
    QueryFailed(SpendError),
    /// Form field recorded.
    Updated,
}

/// Send-screen actions, dispatched through [`Processor`].
#[derive(Debug, Clone)]
pub enum SendAction {
    UpdateAmount {
        native_amount: String,
        exchange_amount: String,
        fiat_per_crypto: String,
    },
    UniqueIdentifierUpdated(String),
    PaymentProtocolReceived(ParsedPaymentIntent),
    CreateTx {
        update: ParsedPaymentIntent,
        force_update_gui: bool,
    },
    UpdateMaxSpend,
    SignBroadcastAndSave,
    UpdateNetworkFee {
        option: NetworkFeeOption,
        custom: serde_json::Map<String, serde_json::Value>,
    },
    UpdateParsedIntent(ParsedPaymentIntent),
    UpdateLabel(String),
    Reset,
}

/// Clears the in-flight flag when the send attempt ends.
struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Controller behind the send-confirmation screen of one wallet.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct SendConfirmation {
    gateway: WalletGateway,
    sink: Arc<dyn StateSink>,
    config: SendConfig,
    state: Arc<RwLock<SendConfirmationState>>,
    in_flight: Arc<AtomicBool>,
}

impl SendConfirmation {
    /// Create a new SendConfirmation.
    ///
    /// # Arguments
    ///
    /// * `gateway` - Wallet the screen spends from
    /// * `sink` - Destination for UI events
    /// * `config` - Step timeout and notification texts
    pub fn new(gateway: WalletGateway, sink: Arc<dyn StateSink>, config: SendConfig) -> Self {
        Self {
            gateway,
            sink,
            config,
            state: Arc::new(RwLock::new(SendConfirmationState::default())),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn snapshot(&self) -> SendConfirmationState {
        self.state.read().await.clone()
    }

    fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Rebuild with a new amount; the fiat value is `exchange_amount * fiat_per_crypto`.
    pub async fn update_amount(
        &self,
        native_amount: &str,
        exchange_amount: &str,
        fiat_per_crypto: &str,
    ) -> Result<SendOutcome, SpendError> {
        let amount_fiat = mul_decimal_str(exchange_amount, fiat_per_crypto)?;
        let update = ParsedPaymentIntent {
            native_amount: Some(native_amount.to_string()),
            metadata: Some(Metadata::with_amount_fiat(amount_fiat)),
            ..ParsedPaymentIntent::default()
        };
        Ok(self.create_tx(update, false).await)
    }

    /// Attach a new unique identifier (memo, destination tag) and rebuild.
    ///
    /// A failed build clears the transaction without reporting an error:
    /// the identifier is usually still being typed.
    pub async fn unique_identifier_updated(&self, unique_identifier: &str) -> SendOutcome {
        if self.is_in_flight() {
            return SendOutcome::AlreadyPending;
        }
        let (intent, request) = {
            let state = self.state.read().await;
            let update = state.form.intent.with_unique_identifier(unique_identifier);
            SpendInfoBuilder::from_form(&state.form, &update)
        };

        self.set_phase(SpendPhase::Building).await;
        match self
            .run_step(SpendStep::Build, self.gateway.make_spend(&request))
            .await
        {
            Ok(transaction) => {
                self.update_transaction(
                    Some(transaction.clone()),
                    Some(intent),
                    false,
                    None,
                    SpendPhase::Built,
                )
                .await;
                SendOutcome::Built(transaction)
            }
            Err(e) => {
                debug!(
                    wallet_id = %self.gateway.wallet_id(),
                    error = %e,
                    "Spend not ready after unique identifier update"
                );
                self.update_transaction(None, Some(intent), false, None, SpendPhase::NotReady)
                    .await;
                SendOutcome::NotReady
            }
        }
    }

    /// Resolve the intent's payment-protocol URI and build the invoice.
    ///
    /// Any stage failing (resolution, stale invoice, build) ends in
    /// `BuildFailed`. A stale or missing invoice is never built from.
    pub async fn payment_protocol_received(&self, intent: ParsedPaymentIntent) -> SendOutcome {
        if self.is_in_flight() {
            return SendOutcome::AlreadyPending;
        }
        self.set_phase(SpendPhase::Building).await;

        let result = async {
            let uri = intent
                .payment_protocol_uri
                .as_deref()
                .ok_or(SpendError::MissingProtocolUri)?;
            let resolution = self
                .within(
                    SpendStep::ProtocolInfo,
                    self.gateway.get_payment_protocol_info(uri),
                )
                .await?;
            let info = resolution.fresh().map_err(SpendError::StaleProtocolInfo)?;
            let request = SpendInfoBuilder::from_payment_protocol_info(&info);
            let transaction = self
                .run_step(SpendStep::Build, self.gateway.make_spend(&request))
                .await?;
            Ok::<_, SpendError>((info, transaction))
        }
        .await;

        match result {
            Ok((info, transaction)) => {
                info!(
                    wallet_id = %self.gateway.wallet_id(),
                    merchant = info.display_name(),
                    native_amount = %info.native_amount,
                    "Built payment-protocol transaction"
                );
                {
                    let mut state = self.state.write().await;
                    state.form.intent = intent;
                    state.transaction = Some(transaction.clone());
                    state.protocol_info = Some(info.clone());
                    state.error = None;
                    state.force_update_gui = true;
                    state.phase = SpendPhase::Built;
                }
                self.sink.emit(UiEvent::PhaseChanged(SpendPhase::Built)).await;
                self.sink
                    .emit(UiEvent::UpdatePaymentProtocolTransaction {
                        transaction: transaction.clone(),
                        info,
                    })
                    .await;
                SendOutcome::Built(transaction)
            }
            Err(e) => {
                warn!(
                    wallet_id = %self.gateway.wallet_id(),
                    error = %e,
                    "Failed to build payment-protocol transaction"
                );
                self.state.write().await.protocol_info = None;
                self.update_transaction(
                    None,
                    Some(intent),
                    true,
                    Some(e.clone()),
                    SpendPhase::BuildFailed,
                )
                .await;
                SendOutcome::BuildFailed(e)
            }
        }
    }

    /// Merge `update` into the form and build.
    ///
    /// With `force_update_gui = false` the view is not re-notified when the
    /// result is identical to what it already shows.
    pub async fn create_tx(&self, update: ParsedPaymentIntent, force_update_gui: bool) -> SendOutcome {
        if self.is_in_flight() {
            return SendOutcome::AlreadyPending;
        }
        let (intent, request) = {
            let state = self.state.read().await;
            SpendInfoBuilder::from_form(&state.form, &update)
        };

        self.set_phase(SpendPhase::Building).await;
        match self
            .run_step(SpendStep::Build, self.gateway.make_spend(&request))
            .await
        {
            Ok(transaction) => {
                debug!(
                    wallet_id = %self.gateway.wallet_id(),
                    native_amount = %transaction.native_amount,
                    network_fee = %transaction.network_fee,
                    "Built transaction"
                );
                self.update_transaction(
                    Some(transaction.clone()),
                    Some(intent),
                    force_update_gui,
                    None,
                    SpendPhase::Built,
                )
                .await;
                SendOutcome::Built(transaction)
            }
            Err(e) => {
                debug!(
                    wallet_id = %self.gateway.wallet_id(),
                    error = %e,
                    "Failed to build transaction"
                );
                self.update_transaction(
                    None,
                    Some(intent),
                    force_update_gui,
                    Some(e.clone()),
                    SpendPhase::BuildFailed,
                )
                .await;
                SendOutcome::BuildFailed(e)
            }
        }
    }

    /// Replace the amount with the wallet's maximum spendable and rebuild.
    pub async fn update_max_spend(&self) -> SendOutcome {
        if self.is_in_flight() {
            return SendOutcome::AlreadyPending;
        }
        let (_, request) = {
            let state = self.state.read().await;
            SpendInfoBuilder::from_form(&state.form, &ParsedPaymentIntent::default())
        };
        match self
            .run_step(
                SpendStep::MaxSpendable,
                self.gateway.get_max_spendable(&request),
            )
            .await
        {
            Ok(native_amount) => {
                debug!(
                    wallet_id = %self.gateway.wallet_id(),
                    %native_amount,
                    "Max spendable resolved"
                );
                self.create_tx(ParsedPaymentIntent::with_native_amount(native_amount), true)
                    .await
            }
            Err(e) => {
                warn!(
                    wallet_id = %self.gateway.wallet_id(),
                    error = %e,
                    "Failed to compute max spendable"
                );
                SendOutcome::QueryFailed(e)
            }
        }
    }

    /// Sign, broadcast and save the built transaction.
    ///
    /// Only one attempt runs at a time; a concurrent call returns
    /// [`SendOutcome::AlreadyPending`] without touching the engine. Raises
    /// exactly one notification per attempt that reaches the engine.
    ///
    /// The attempt runs on its own task: dropping the returned future does
    /// not cancel it, and the pending flag and notification still follow.
    pub async fn sign_broadcast_and_save(&self) -> SendOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(
                wallet_id = %self.gateway.wallet_id(),
                "Send already in flight, ignoring"
            );
            return SendOutcome::AlreadyPending;
        }
        let guard = PendingGuard(self.in_flight.clone());

        let unsigned = {
            let state = self.state.read().await;
            match (state.phase, &state.transaction) {
                (SpendPhase::Built, Some(transaction)) => Some(transaction.clone()),
                _ => None,
            }
        };
        let Some(snapshot) = unsigned else {
            debug!(
                wallet_id = %self.gateway.wallet_id(),
                "No built transaction to send"
            );
            return SendOutcome::NotReady;
        };

        let this = self.clone();
        let attempt = tokio::spawn(async move {
            let _guard = guard;
            this.run_send_attempt(snapshot).await
        });
        match attempt.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                error!(
                    wallet_id = %self.gateway.wallet_id(),
                    error = %e,
                    "Send task ended without an outcome"
                );
                SendOutcome::Failed(SpendError::Interrupted)
            }
        }
    }

    async fn run_send_attempt(&self, mut snapshot: Transaction) -> SendOutcome {
        self.set_pending(true).await;
        let result = self.sign_broadcast_save_steps(&mut snapshot).await;
        self.set_pending(false).await;

        match result {
            Ok(()) => {
                info!(
                    wallet_id = %self.gateway.wallet_id(),
                    txid = %snapshot.txid,
                    "Transaction sent"
                );
                {
                    let mut state = self.state.write().await;
                    state.transaction = Some(snapshot.clone());
                    state.error = None;
                    state.phase = SpendPhase::Saved;
                }
                self.sink.emit(UiEvent::PhaseChanged(SpendPhase::Saved)).await;
                self.sink.emit(UiEvent::DismissSendScreen).await;
                self.sink
                    .emit(UiEvent::Notify(Notification::success(
                        &self.config.success_title,
                        &self.config.success_message,
                    )))
                    .await;
                SendOutcome::Sent(snapshot)
            }
            Err(e) => {
                error!(
                    wallet_id = %self.gateway.wallet_id(),
                    txid = %snapshot.txid,
                    error = %e,
                    "Failed to send transaction"
                );
                let marker = SpendError::BroadcastError(Box::new(e.clone()));
                self.update_transaction(Some(snapshot), None, true, Some(marker), SpendPhase::Failed)
                    .await;
                self.sink
                    .emit(UiEvent::Notify(Notification::failure(
                        &self.config.failure_title,
                        e.user_message(),
                    )))
                    .await;
                SendOutcome::Failed(e)
            }
        }
    }

    /// `snapshot` always holds the last transaction the engine handed back.
    async fn sign_broadcast_save_steps(&self, snapshot: &mut Transaction) -> Result<(), SpendError> {
        self.set_phase(SpendPhase::Signing).await;
        *snapshot = self
            .run_step(SpendStep::Sign, self.gateway.sign_tx(snapshot.clone()))
            .await?;
        self.set_phase(SpendPhase::Signed).await;

        self.set_phase(SpendPhase::Broadcasting).await;
        *snapshot = self
            .run_step(
                SpendStep::Broadcast,
                self.gateway.broadcast_tx(snapshot.clone()),
            )
            .await?;
        self.set_phase(SpendPhase::Broadcast).await;

        self.set_phase(SpendPhase::Saving).await;
        self.run_step(SpendStep::Save, self.gateway.save_tx(snapshot))
            .await?;
        Ok(())
    }

    /// Record a new fee selection and rebuild.
    pub async fn update_network_fee(
        &self,
        option: NetworkFeeOption,
        custom: serde_json::Map<String, serde_json::Value>,
    ) -> SendOutcome {
        if self.is_in_flight() {
            return SendOutcome::AlreadyPending;
        }
        {
            let mut state = self.state.write().await;
            state.form.network_fee_option = option;
            state.form.custom_network_fee = custom;
        }
        self.create_tx(ParsedPaymentIntent::default(), true).await
    }

    /// Load a freshly parsed payment target and build it.
    pub async fn update_parsed_intent(&self, intent: ParsedPaymentIntent) -> SendOutcome {
        self.create_tx(intent, true).await
    }

    pub async fn update_label(&self, label: impl Into<String>) -> SendOutcome {
        let label = label.into();
        self.state.write().await.form.label = label.clone();
        self.sink.emit(UiEvent::UpdateLabel(label)).await;
        SendOutcome::Updated
    }

    /// Discard the form and transaction. Refused while a send is in flight.
    pub async fn reset(&self) -> SendOutcome {
        if self.is_in_flight() {
            return SendOutcome::AlreadyPending;
        }
        *self.state.write().await = SendConfirmationState::default();
        self.sink.emit(UiEvent::Reset).await;
        SendOutcome::Updated
    }

    async fn set_phase(&self, phase: SpendPhase) {
        self.state.write().await.phase = phase;
        self.sink.emit(UiEvent::PhaseChanged(phase)).await;
    }

    async fn set_pending(&self, pending: bool) {
        self.state.write().await.pending = pending;
        self.sink.emit(UiEvent::UpdateSpendPending(pending)).await;
    }

    /// Store the outcome of a step and tell the view.
    ///
    /// `parsed_intent: None` keeps the current intent.
    async fn update_transaction(
        &self,
        transaction: Option<Transaction>,
        parsed_intent: Option<ParsedPaymentIntent>,
        force_update_gui: bool,
        error: Option<SpendError>,
        phase: SpendPhase,
    ) {
        let unchanged = {
            let mut state = self.state.write().await;
            let unchanged = !force_update_gui
                && state.transaction == transaction
                && state.error == error
                && parsed_intent
                    .as_ref()
                    .is_none_or(|intent| *intent == state.form.intent);
            if let Some(intent) = &parsed_intent {
                state.form.intent = intent.clone();
            }
            state.transaction = transaction.clone();
            state.error = error.clone();
            state.force_update_gui = force_update_gui;
            state.phase = phase;
            unchanged
        };

        self.sink.emit(UiEvent::PhaseChanged(phase)).await;
        if !unchanged {
            self.sink
                .emit(UiEvent::UpdateTransaction {
                    transaction,
                    parsed_intent,
                    force_update_gui,
                    error,
                })
                .await;
        }
    }

    /// Bound `future` by the step timeout.
    async fn within<T>(
        &self,
        step: SpendStep,
        future: impl Future<Output = T>,
    ) -> Result<T, SpendError> {
        tokio::time::timeout(self.config.step_timeout, future)
            .await
            .map_err(|_| {
                warn!(
                    wallet_id = %self.gateway.wallet_id(),
                    %step,
                    timeout_secs = self.config.step_timeout.as_secs_f64(),
                    "Engine step timed out"
                );
                SpendError::Timeout(step)
            })
    }

    async fn run_step<T>(
        &self,
        step: SpendStep,
        future: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, SpendError> {
        self.within(step, future)
            .await?
            .map_err(|e| SpendError::from_engine(step, e))
    }
}

// ---------------------------------------------------------------------------
// Processor trait implementation
// ---------------------------------------------------------------------------

impl Processor<SendAction> for SendConfirmation {
    type Output = SendOutcome;
    type Error = SpendError;

    #[tracing::instrument(skip_all, err, name = "SendConfirmation:process")]
    async fn process(&self, action: SendAction) -> Result<SendOutcome, SpendError> {
        let outcome = match action {
            SendAction::UpdateAmount {
                native_amount,
                exchange_amount,
                fiat_per_crypto,
            } => {
                return self
                    .update_amount(&native_amount, &exchange_amount, &fiat_per_crypto)
                    .await;
            }
            SendAction::UniqueIdentifierUpdated(id) => self.unique_identifier_updated(&id).await,
            SendAction::PaymentProtocolReceived(intent) => {
                self.payment_protocol_received(intent).await
            }
            SendAction::CreateTx {
                update,
                force_update_gui,
            } => self.create_tx(update, force_update_gui).await,
            SendAction::UpdateMaxSpend => self.update_max_spend().await,
            SendAction::SignBroadcastAndSave => self.sign_broadcast_and_save().await,
            SendAction::UpdateNetworkFee { option, custom } => {
                self.update_network_fee(option, custom).await
            }
            SendAction::UpdateParsedIntent(intent) => self.update_parsed_intent(intent).await,
            SendAction::UpdateLabel(label) => self.update_label(label).await,
            SendAction::Reset => self.reset().await,
        };
        Ok(outcome)
    }
}
