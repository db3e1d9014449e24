use serde::{Deserialize, Serialize};

use super::{CurrencyCode, Metadata};

/// Engine-produced transaction record.
///
/// The same shape is returned unsigned by the spend builder and then
/// replaced by the signed and broadcast versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub txid: String,
    /// Unix timestamp in seconds.
    pub date: i64,
    pub currency_code: CurrencyCode,
    /// `0` while unconfirmed.
    pub block_height: u64,
    pub native_amount: String,
    pub network_fee: String,
    #[serde(default)]
    pub our_receive_addresses: Vec<String>,
    #[serde(default)]
    pub signed_tx: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub other_params: serde_json::Map<String, serde_json::Value>,
}

impl Transaction {
    /// Zero-amount stand-in used when the engine cannot build spends.
    pub fn placeholder() -> Self {
        Self {
            native_amount: "0".to_string(),
            network_fee: "0".to_string(),
            ..Self::default()
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.signed_tx.is_empty()
    }
}

/// Address handed out on the request screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveAddress {
    pub public_address: String,
    pub native_amount: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ReceiveAddress {
    pub fn placeholder() -> Self {
        Self {
            public_address: String::new(),
            native_amount: "0".to_string(),
            metadata: Metadata::with_amount_fiat(rust_decimal::Decimal::ZERO),
        }
    }
}

/// Paging options for transaction history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
}

/// Requested amount as shown on the request screen: crypto and fiat sides
/// are always updated together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountPair {
    pub crypto: String,
    pub fiat: String,
}
