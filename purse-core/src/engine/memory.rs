//! In-memory wallet engine.
//!
//! Implements every [`CurrencyWallet`] capability against in-memory
//! balances so the send and request flows can run without a network. Each
//! engine call can be made to fail or hang through [`Fault`] injection, and
//! token enable/disable calls are journaled for inspection.

use super::{CurrencyWallet, EngineError};
use crate::storage::{MemoryFolder, WalletFolder};
use async_trait::async_trait;
use compact_str::CompactString;
use purse_sdk::amount::exchange_to_native;
use purse_sdk::objects::{
    CurrencyCode, Metadata, NetworkFeeOption, ParsedPaymentIntent, PaymentProtocolInfo,
    ReceiveAddress, SpendRequest, TokenInfo, Transaction, TransactionQuery, UriParseResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Engine calls that accept an injected [`Fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineCall {
    PaymentProtocol,
    MakeSpend,
    Sign,
    Broadcast,
    Save,
    EnableTokens,
    DisableTokens,
}

/// How an injected fault behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail with [`EngineError::Rejected`].
    Reject(String),
    /// Never resolve.
    Stall,
}

/// Journal entry for token enable/disable calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCall {
    Enable(Vec<String>),
    Disable(Vec<String>),
}

#[derive(Debug, Default)]
struct MemoryWalletState {
    name: String,
    /// Native balances keyed by currency code.
    balances: HashMap<CurrencyCode, u128>,
    transactions: Vec<Transaction>,
    enabled_tokens: Vec<String>,
    custom_tokens: Vec<TokenInfo>,
    invoices: HashMap<String, PaymentProtocolInfo>,
    faults: HashMap<EngineCall, Fault>,
    token_calls: Vec<TokenCall>,
    broadcast_count: usize,
    resync_count: usize,
}

/// Wallet engine backed entirely by process memory.
pub struct MemoryWallet {
    id: String,
    currency_code: CurrencyCode,
    multiplier: String,
    uri_scheme: String,
    network_fee: u128,
    receive_address: String,
    private_seed: Option<String>,
    folder: Arc<dyn WalletFolder>,
    state: RwLock<MemoryWalletState>,
}

/// Builder for [`MemoryWallet`].
pub struct MemoryWalletBuilder {
    id: String,
    name: String,
    currency_code: CurrencyCode,
    multiplier: String,
    uri_scheme: String,
    network_fee: u128,
    balance: u128,
    receive_address: String,
    private_seed: Option<String>,
    folder: Option<Arc<dyn WalletFolder>>,
}

impl MemoryWalletBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn currency(
        mut self,
        currency_code: impl Into<CompactString>,
        multiplier: impl Into<String>,
        uri_scheme: impl Into<String>,
    ) -> Self {
        self.currency_code = currency_code.into();
        self.multiplier = multiplier.into();
        self.uri_scheme = uri_scheme.into();
        self
    }

    /// Flat fee charged at [`NetworkFeeOption::Standard`].
    pub fn network_fee(mut self, native_fee: u128) -> Self {
        self.network_fee = native_fee;
        self
    }

    pub fn balance(mut self, native_balance: u128) -> Self {
        self.balance = native_balance;
        self
    }

    pub fn receive_address(mut self, address: impl Into<String>) -> Self {
        self.receive_address = address.into();
        self
    }

    pub fn private_seed(mut self, seed: Option<String>) -> Self {
        self.private_seed = seed;
        self
    }

    pub fn folder(mut self, folder: Arc<dyn WalletFolder>) -> Self {
        self.folder = Some(folder);
        self
    }

    pub fn build(self) -> MemoryWallet {
        let mut balances = HashMap::new();
        balances.insert(self.currency_code.clone(), self.balance);
        MemoryWallet {
            id: self.id,
            currency_code: self.currency_code,
            multiplier: self.multiplier,
            uri_scheme: self.uri_scheme,
            network_fee: self.network_fee,
            receive_address: self.receive_address,
            private_seed: self.private_seed,
            folder: self
                .folder
                .unwrap_or_else(|| Arc::new(MemoryFolder::new())),
            state: RwLock::new(MemoryWalletState {
                name: self.name,
                balances,
                ..MemoryWalletState::default()
            }),
        }
    }
}

impl MemoryWallet {
    /// Start building a BTC-denominated wallet with the given id.
    pub fn builder(id: impl Into<String>) -> MemoryWalletBuilder {
        MemoryWalletBuilder {
            id: id.into(),
            name: "My Wallet".to_string(),
            currency_code: CompactString::from("BTC"),
            multiplier: "100000000".to_string(),
            uri_scheme: "bitcoin".to_string(),
            network_fee: 1_000,
            balance: 0,
            receive_address: "1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string(),
            private_seed: None,
            folder: None,
        }
    }

    pub fn currency_code(&self) -> &CurrencyCode {
        &self.currency_code
    }

    pub async fn inject_fault(&self, call: EngineCall, fault: Fault) {
        self.state.write().await.faults.insert(call, fault);
    }

    pub async fn clear_fault(&self, call: EngineCall) {
        self.state.write().await.faults.remove(&call);
    }

    /// Register an invoice served for `uri` by the payment protocol.
    pub async fn register_invoice(&self, uri: impl Into<String>, info: PaymentProtocolInfo) {
        self.state.write().await.invoices.insert(uri.into(), info);
    }

    pub async fn set_balance(&self, currency_code: &str, native_balance: u128) {
        self.state
            .write()
            .await
            .balances
            .insert(currency_code.into(), native_balance);
    }

    pub async fn token_calls(&self) -> Vec<TokenCall> {
        self.state.read().await.token_calls.clone()
    }

    pub async fn enabled_tokens(&self) -> Vec<String> {
        self.state.read().await.enabled_tokens.clone()
    }

    pub async fn broadcast_count(&self) -> usize {
        self.state.read().await.broadcast_count
    }

    pub async fn resync_count(&self) -> usize {
        self.state.read().await.resync_count
    }

    pub async fn name(&self) -> String {
        self.state.read().await.name.clone()
    }

    async fn check_fault(&self, call: EngineCall) -> Result<(), EngineError> {
        let fault = self.state.read().await.faults.get(&call).cloned();
        match fault {
            None => Ok(()),
            Some(Fault::Reject(message)) => Err(EngineError::Rejected(message)),
            Some(Fault::Stall) => {
                debug!(wallet_id = %self.id, ?call, "Stalling engine call");
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    fn fee_for(&self, request: &SpendRequest) -> Result<u128, EngineError> {
        Ok(match request.network_fee_option {
            NetworkFeeOption::Low => self.network_fee / 2,
            NetworkFeeOption::Standard => self.network_fee,
            NetworkFeeOption::High => self.network_fee * 2,
            NetworkFeeOption::Custom => match request.custom_network_fee.get("nativeFee") {
                Some(serde_json::Value::String(fee)) => parse_native(fee)?,
                Some(serde_json::Value::Number(fee)) => fee
                    .as_u64()
                    .map(u128::from)
                    .ok_or_else(|| EngineError::Rejected(format!("invalid custom fee: {fee}")))?,
                _ => self.network_fee,
            },
        })
    }

    fn parse_token_uri(&self, url: &url::Url) -> Result<UriParseResult, EngineError> {
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let field = |key: &str| {
            params
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| EngineError::InvalidUri(format!("token URI is missing {key}")))
        };
        let decimal_places: u32 = field("decimalPlaces")?
            .parse()
            .map_err(|_| EngineError::InvalidUri("decimalPlaces is not a number".to_string()))?;
        if decimal_places > 30 {
            return Err(EngineError::InvalidUri(
                "decimalPlaces is out of range".to_string(),
            ));
        }
        Ok(UriParseResult::Token(TokenInfo {
            currency_code: field("currencyCode")?.to_uppercase().into(),
            currency_name: field("currencyName")?,
            contract_address: field("contractAddress")?,
            multiplier: 10u128.pow(decimal_places).to_string(),
        }))
    }

    fn parse_payment_uri(&self, url: &url::Url) -> Result<UriParseResult, EngineError> {
        let mut intent = ParsedPaymentIntent {
            currency_code: Some(self.currency_code.clone()),
            ..ParsedPaymentIntent::default()
        };
        let address = url.path();
        if !address.is_empty() {
            intent.public_address = Some(address.to_string());
        }

        let mut metadata = Metadata::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "amount" => {
                    let native = exchange_to_native(&value, &self.multiplier)
                        .map_err(|e| EngineError::InvalidUri(e.to_string()))?;
                    intent.native_amount = Some(native);
                }
                "label" => metadata.name = Some(value.into_owned()),
                "message" => metadata.notes = Some(value.into_owned()),
                "r" => intent.payment_protocol_uri = Some(value.into_owned()),
                "dt" | "memo" => intent.unique_identifier = Some(value.into_owned()),
                _ => {}
            }
        }
        if !metadata.is_empty() {
            intent.metadata = Some(metadata);
        }
        if intent.public_address.is_none() && intent.payment_protocol_uri.is_none() {
            return Err(EngineError::InvalidUri(
                "URI has neither an address nor a payment request".to_string(),
            ));
        }
        Ok(UriParseResult::Payment(intent))
    }
}

/// Non-negative amount in smallest units.
fn parse_native(value: &str) -> Result<u128, EngineError> {
    value
        .parse()
        .map_err(|_| EngineError::Rejected(format!("invalid native amount: {value:?}")))
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[async_trait]
impl CurrencyWallet for MemoryWallet {
    fn id(&self) -> &str {
        &self.id
    }

    fn folder(&self) -> Arc<dyn WalletFolder> {
        Arc::clone(&self.folder)
    }

    async fn rename_wallet(&self, name: &str) -> Result<(), EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::Rejected("wallet name cannot be empty".to_string()));
        }
        self.state.write().await.name = name.to_string();
        Ok(())
    }

    async fn get_num_transactions(&self, currency_code: &str) -> Result<u64, EngineError> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .filter(|tx| tx.currency_code == currency_code)
            .count() as u64)
    }

    async fn get_transactions(
        &self,
        currency_code: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, EngineError> {
        let state = self.state.read().await;
        let matching = state
            .transactions
            .iter()
            .filter(|tx| tx.currency_code == currency_code)
            .filter(|tx| query.start_date.is_none_or(|start| tx.date >= start))
            .filter(|tx| query.end_date.is_none_or(|end| tx.date <= end))
            .skip(query.start_index.unwrap_or(0))
            .take(query.count.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matching)
    }

    async fn save_tx_metadata(
        &self,
        txid: &str,
        currency_code: &str,
        metadata: &Metadata,
    ) -> Result<(), EngineError> {
        let mut state = self.state.write().await;
        let tx = state
            .transactions
            .iter_mut()
            .find(|tx| tx.txid == txid && tx.currency_code == currency_code)
            .ok_or_else(|| EngineError::Rejected(format!("unknown transaction {txid}")))?;
        tx.metadata = tx.metadata.merged(metadata);
        Ok(())
    }

    async fn get_receive_address(&self, _currency_code: &str) -> Result<ReceiveAddress, EngineError> {
        Ok(ReceiveAddress {
            public_address: self.receive_address.clone(),
            native_amount: "0".to_string(),
            metadata: Metadata::default(),
        })
    }

    async fn get_payment_protocol_info(
        &self,
        uri: &str,
    ) -> Result<PaymentProtocolInfo, EngineError> {
        self.check_fault(EngineCall::PaymentProtocol).await?;
        self.state
            .read()
            .await
            .invoices
            .get(uri)
            .cloned()
            .ok_or_else(|| EngineError::Network(format!("unable to fetch payment request {uri}")))
    }

    async fn make_spend(&self, request: &SpendRequest) -> Result<Transaction, EngineError> {
        self.check_fault(EngineCall::MakeSpend).await?;

        if request.spend_targets.is_empty() {
            return Err(EngineError::Rejected("no spend targets".to_string()));
        }
        let currency_code = request
            .currency_code()
            .cloned()
            .unwrap_or_else(|| self.currency_code.clone());

        let mut total: u128 = 0;
        for target in &request.spend_targets {
            if target.public_address.is_empty() {
                return Err(EngineError::Rejected("spend target has no address".to_string()));
            }
            total = total
                .checked_add(parse_native(&target.native_amount)?)
                .ok_or_else(|| EngineError::Rejected("amount overflow".to_string()))?;
        }
        if total == 0 {
            return Err(EngineError::Rejected("no amount specified".to_string()));
        }

        let fee = self.fee_for(request)?;
        let state = self.state.read().await;
        let primary = state.balances.get(&self.currency_code).copied().unwrap_or(0);
        let native_amount = if currency_code == self.currency_code {
            let required = total + fee;
            if required > primary {
                return Err(EngineError::InsufficientFunds {
                    required: required.to_string(),
                    available: primary.to_string(),
                });
            }
            required
        } else {
            let token = state.balances.get(&currency_code).copied().unwrap_or(0);
            if total > token || fee > primary {
                return Err(EngineError::InsufficientFunds {
                    required: total.to_string(),
                    available: token.to_string(),
                });
            }
            total
        };

        let mut other_params = serde_json::Map::new();
        if let Some(id) = request
            .spend_targets
            .first()
            .and_then(|target| target.other_params.unique_identifier.clone())
        {
            other_params.insert("uniqueIdentifier".to_string(), id.into());
        }

        Ok(Transaction {
            txid: uuid::Uuid::new_v4().simple().to_string(),
            date: now_unix(),
            currency_code,
            block_height: 0,
            native_amount: format!("-{native_amount}"),
            network_fee: fee.to_string(),
            our_receive_addresses: vec![],
            signed_tx: String::new(),
            metadata: request.metadata.clone(),
            other_params,
        })
    }

    async fn get_max_spendable(&self, request: &SpendRequest) -> Result<String, EngineError> {
        let fee = self.fee_for(request)?;
        let state = self.state.read().await;
        let currency_code = request
            .currency_code()
            .cloned()
            .unwrap_or_else(|| self.currency_code.clone());
        let balance = state.balances.get(&currency_code).copied().unwrap_or(0);
        let max = if currency_code == self.currency_code {
            balance.saturating_sub(fee)
        } else {
            balance
        };
        Ok(max.to_string())
    }

    async fn get_balance(&self, currency_code: &str) -> Result<String, EngineError> {
        let state = self.state.read().await;
        Ok(state
            .balances
            .get(currency_code)
            .copied()
            .unwrap_or(0)
            .to_string())
    }

    async fn enable_tokens(&self, tokens: &[String]) -> Result<(), EngineError> {
        self.state
            .write()
            .await
            .token_calls
            .push(TokenCall::Enable(tokens.to_vec()));
        self.check_fault(EngineCall::EnableTokens).await?;
        let mut state = self.state.write().await;
        for token in tokens {
            if !state.enabled_tokens.contains(token) {
                state.enabled_tokens.push(token.clone());
            }
        }
        Ok(())
    }

    async fn disable_tokens(&self, tokens: &[String]) -> Result<(), EngineError> {
        self.state
            .write()
            .await
            .token_calls
            .push(TokenCall::Disable(tokens.to_vec()));
        self.check_fault(EngineCall::DisableTokens).await?;
        self.state
            .write()
            .await
            .enabled_tokens
            .retain(|token| !tokens.contains(token));
        Ok(())
    }

    async fn add_custom_token(&self, token: &TokenInfo) -> Result<(), EngineError> {
        let mut state = self.state.write().await;
        if state
            .custom_tokens
            .iter()
            .any(|t| t.currency_code == token.currency_code)
        {
            return Err(EngineError::Rejected(format!(
                "token {} already exists",
                token.currency_code
            )));
        }
        state.custom_tokens.push(token.clone());
        state.balances.entry(token.currency_code.clone()).or_insert(0);
        Ok(())
    }

    fn parse_uri(&self, uri: &str) -> Result<UriParseResult, EngineError> {
        let uri = uri.trim();
        if !uri.contains(':') {
            if uri.is_empty() {
                return Err(EngineError::InvalidUri("empty URI".to_string()));
            }
            return Ok(UriParseResult::Payment(ParsedPaymentIntent {
                currency_code: Some(self.currency_code.clone()),
                public_address: Some(uri.to_string()),
                ..ParsedPaymentIntent::default()
            }));
        }

        let url = url::Url::parse(uri).map_err(|e| EngineError::InvalidUri(e.to_string()))?;
        if url.scheme() != self.uri_scheme {
            return Err(EngineError::InvalidUri(format!(
                "unsupported scheme {}",
                url.scheme()
            )));
        }
        if url.path() == "token" {
            self.parse_token_uri(&url)
        } else {
            self.parse_payment_uri(&url)
        }
    }

    async fn sign_tx(&self, mut transaction: Transaction) -> Result<Transaction, EngineError> {
        self.check_fault(EngineCall::Sign).await?;
        if !transaction.is_signed() {
            transaction.signed_tx = format!("signed:{}", transaction.txid);
        }
        Ok(transaction)
    }

    async fn broadcast_tx(&self, transaction: Transaction) -> Result<Transaction, EngineError> {
        self.check_fault(EngineCall::Broadcast).await?;
        if !transaction.is_signed() {
            return Err(EngineError::Rejected("transaction is not signed".to_string()));
        }
        self.state.write().await.broadcast_count += 1;
        Ok(transaction)
    }

    async fn save_tx(&self, transaction: &Transaction) -> Result<(), EngineError> {
        self.check_fault(EngineCall::Save).await?;
        // Outgoing transactions carry a negative amount.
        let spent = parse_native(transaction.native_amount.trim_start_matches('-'))?;
        let mut state = self.state.write().await;
        if state.transactions.iter().any(|tx| tx.txid == transaction.txid) {
            return Ok(());
        }
        if transaction.currency_code != self.currency_code {
            let fee = parse_native(&transaction.network_fee)?;
            let primary = state.balances.entry(self.currency_code.clone()).or_insert(0);
            *primary = primary.saturating_sub(fee);
        }
        let balance = state
            .balances
            .entry(transaction.currency_code.clone())
            .or_insert(0);
        *balance = balance.saturating_sub(spent);
        state.transactions.push(transaction.clone());
        Ok(())
    }

    async fn resync_blockchain(&self) -> Result<(), EngineError> {
        self.state.write().await.resync_count += 1;
        Ok(())
    }

    async fn get_display_private_seed(&self) -> Result<Option<String>, EngineError> {
        Ok(self.private_seed.clone())
    }
}
