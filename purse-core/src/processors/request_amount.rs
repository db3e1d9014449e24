//! RequestAmount processor.
//!
//! Keeps the request screen's crypto and fiat amounts consistent. Whichever
//! side the user edits is the source of truth for that edit; the other side
//! is derived from the configured rate, and both are always emitted
//! together in one `AmountPairUpdated`.

use crate::engine::EngineError;
use crate::events::{StateSink, UiEvent};
use crate::wallet::WalletGateway;
use kanau::processor::Processor;
use purse_sdk::amount::{
    AmountError, crypto_from_fiat, fiat_from_crypto, format_decimal, parse_non_negative,
    sanitize_input,
};
use purse_sdk::config::RequestConfig;
use purse_sdk::objects::{AmountPair, ReceiveAddress};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Errors that can occur on the request screen.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Input is not a finite non-negative number; state was left untouched
    #[error("invalid amount input: {0:?}")]
    InvalidInput(String),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// What the request screen shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    pub receive_address: Option<ReceiveAddress>,
    pub amounts: AmountPair,
}

/// Request-screen inputs, dispatched through [`Processor`].
#[derive(Debug, Clone)]
pub enum RequestInput {
    Crypto(String),
    Fiat(String),
    RefreshReceiveAddress { currency_code: String },
    UpdateRate(Decimal),
}

/// Controller behind the request screen of one wallet.
pub struct RequestAmount {
    gateway: WalletGateway,
    sink: Arc<dyn StateSink>,
    config: RwLock<RequestConfig>,
    state: RwLock<RequestState>,
}

impl RequestAmount {
    pub fn new(gateway: WalletGateway, sink: Arc<dyn StateSink>, config: RequestConfig) -> Self {
        Self {
            gateway,
            sink,
            config: RwLock::new(config),
            state: RwLock::new(RequestState::default()),
        }
    }

    pub async fn snapshot(&self) -> RequestState {
        self.state.read().await.clone()
    }

    /// The user typed a crypto amount; derive fiat.
    pub async fn on_crypto_input(&self, raw: &str) -> Result<AmountPair, RequestError> {
        let crypto = Self::validate(raw)?;
        let config = self.config.read().await.clone();
        let fiat = fiat_from_crypto(crypto, config.fiat_per_crypto, config.fiat_decimals)?;
        Ok(self
            .publish(AmountPair {
                crypto: format_decimal(crypto),
                fiat: format_decimal(fiat),
            })
            .await)
    }

    /// The user typed a fiat amount; derive crypto.
    pub async fn on_fiat_input(&self, raw: &str) -> Result<AmountPair, RequestError> {
        let fiat = Self::validate(raw)?;
        let config = self.config.read().await.clone();
        let crypto = crypto_from_fiat(fiat, config.fiat_per_crypto, config.crypto_decimals)?;
        Ok(self
            .publish(AmountPair {
                crypto: format_decimal(crypto),
                fiat: format_decimal(fiat),
            })
            .await)
    }

    /// Fetch the wallet's next receive address.
    pub async fn refresh_receive_address(
        &self,
        currency_code: &str,
    ) -> Result<ReceiveAddress, RequestError> {
        let address = self.gateway.get_receive_address(currency_code).await?;
        info!(
            wallet_id = %self.gateway.wallet_id(),
            currency_code,
            public_address = %address.public_address,
            "Receive address refreshed"
        );
        self.state.write().await.receive_address = Some(address.clone());
        self.sink
            .emit(UiEvent::ReceiveAddressUpdated(address.clone()))
            .await;
        Ok(address)
    }

    /// Change the rate. The fiat side is re-derived from the current crypto
    /// amount so the pair stays consistent.
    pub async fn update_rate(&self, fiat_per_crypto: Decimal) -> Result<(), RequestError> {
        if fiat_per_crypto <= Decimal::ZERO {
            return Err(AmountError::NonPositiveRate.into());
        }
        self.config.write().await.fiat_per_crypto = fiat_per_crypto;
        debug!(%fiat_per_crypto, "Request rate updated");

        let crypto = self.state.read().await.amounts.crypto.clone();
        if parse_non_negative(&crypto).is_some() {
            self.on_crypto_input(&crypto).await?;
        }
        Ok(())
    }

    fn validate(raw: &str) -> Result<Decimal, RequestError> {
        let sanitized = sanitize_input(raw);
        parse_non_negative(&sanitized).ok_or_else(|| {
            debug!(input = raw, "Ignoring invalid amount input");
            RequestError::InvalidInput(sanitized)
        })
    }

    async fn publish(&self, amounts: AmountPair) -> AmountPair {
        self.state.write().await.amounts = amounts.clone();
        self.sink
            .emit(UiEvent::AmountPairUpdated(amounts.clone()))
            .await;
        amounts
    }
}

impl Processor<RequestInput> for RequestAmount {
    type Output = RequestState;
    type Error = RequestError;

    #[tracing::instrument(skip_all, err, name = "RequestAmount:process")]
    async fn process(&self, input: RequestInput) -> Result<RequestState, RequestError> {
        match input {
            RequestInput::Crypto(raw) => {
                self.on_crypto_input(&raw).await?;
            }
            RequestInput::Fiat(raw) => {
                self.on_fiat_input(&raw).await?;
            }
            RequestInput::RefreshReceiveAddress { currency_code } => {
                self.refresh_receive_address(&currency_code).await?;
            }
            RequestInput::UpdateRate(rate) => self.update_rate(rate).await?,
        }
        Ok(self.snapshot().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryWallet;
    use crate::events::{UiEventReceiver, ui_event_channel};

    fn controller() -> (RequestAmount, UiEventReceiver) {
        let gateway = WalletGateway::new(Arc::new(MemoryWallet::builder("wallet-1").build()));
        let (tx, rx) = ui_event_channel();
        (
            RequestAmount::new(gateway, Arc::new(tx), RequestConfig::default()),
            rx,
        )
    }

    fn pair(crypto: &str, fiat: &str) -> AmountPair {
        AmountPair {
            crypto: crypto.to_string(),
            fiat: fiat.to_string(),
        }
    }

    #[tokio::test]
    async fn test_crypto_input_derives_fiat() {
        let (controller, mut rx) = controller();
        let amounts = controller.on_crypto_input("2").await.unwrap();

        assert_eq!(amounts, pair("2", "3.55"));
        assert_eq!(rx.try_recv().ok(), Some(UiEvent::AmountPairUpdated(amounts)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fiat_input_derives_crypto() {
        let (controller, mut rx) = controller();
        let amounts = controller.on_fiat_input("1.77345").await.unwrap();

        assert_eq!(amounts, pair("1", "1.77345"));
        assert_eq!(controller.snapshot().await.amounts, amounts);
        assert_eq!(rx.try_recv().ok(), Some(UiEvent::AmountPairUpdated(amounts)));
    }

    #[tokio::test]
    async fn test_negative_input_dispatches_nothing() {
        let (controller, mut rx) = controller();
        controller.on_crypto_input("1").await.unwrap();
        rx.try_recv().unwrap();

        let result = controller.on_crypto_input("-5").await;
        assert_eq!(result, Err(RequestError::InvalidInput("-5".to_string())));
        assert!(rx.try_recv().is_err());
        assert_eq!(controller.snapshot().await.amounts, pair("1", "1.77"));
    }

    #[tokio::test]
    async fn test_non_numeric_and_empty_input_are_ignored() {
        let (controller, mut rx) = controller();
        for raw in ["abc", "", "   ", "1.2.3"] {
            assert!(controller.on_fiat_input(raw).await.is_err(), "{raw:?}");
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(controller.snapshot().await, RequestState::default());
    }

    #[tokio::test]
    async fn test_input_is_sanitized() {
        let (controller, _rx) = controller();
        let amounts = controller.on_crypto_input(" 0,5 ").await.unwrap();
        assert_eq!(amounts.crypto, "0.5");
        assert_eq!(amounts.fiat, "0.89");
    }

    #[tokio::test]
    async fn test_rate_change_rederives_fiat() {
        let (controller, mut rx) = controller();
        controller.on_crypto_input("2").await.unwrap();
        rx.try_recv().unwrap();

        controller.update_rate(Decimal::new(10, 0)).await.unwrap();
        assert_eq!(controller.snapshot().await.amounts, pair("2", "20"));
        assert_eq!(
            rx.try_recv().ok(),
            Some(UiEvent::AmountPairUpdated(pair("2", "20")))
        );

        assert_eq!(
            controller.update_rate(Decimal::ZERO).await,
            Err(RequestError::Amount(AmountError::NonPositiveRate))
        );
    }

    #[tokio::test]
    async fn test_receive_address_refresh() {
        let (controller, mut rx) = controller();
        let state = controller
            .process(RequestInput::RefreshReceiveAddress {
                currency_code: "BTC".to_string(),
            })
            .await
            .unwrap();

        let address = state.receive_address.unwrap();
        assert_eq!(address.public_address, "1BoatSLRHtKNngkdXEeobR76b53LETtpyT");
        assert_eq!(
            rx.try_recv().ok(),
            Some(UiEvent::ReceiveAddressUpdated(address))
        );
    }
}
