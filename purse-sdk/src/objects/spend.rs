use serde::{Deserialize, Serialize};

use super::{CurrencyCode, Metadata};

/// Fee priority requested from the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkFeeOption {
    Low,
    #[default]
    Standard,
    High,
    /// Use the values in [`SpendRequest::custom_network_fee`].
    Custom,
}

/// Chain-specific parameters carried on a single spend target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendTargetParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_identifier: Option<String>,
    /// Anything else the engine understands for this target.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SpendTargetParams {
    pub fn is_empty(&self) -> bool {
        self.unique_identifier.is_none() && self.extra.is_empty()
    }
}

/// One output of a spend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<CurrencyCode>,
    pub public_address: String,
    pub native_amount: String,
    #[serde(default, skip_serializing_if = "SpendTargetParams::is_empty")]
    pub other_params: SpendTargetParams,
}

/// Normalized request handed to the engine's spend builder.
///
/// Built fresh for every attempt and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<CurrencyCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_amount: Option<String>,
    #[serde(default)]
    pub network_fee_option: NetworkFeeOption,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom_network_fee: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub metadata: Metadata,
    pub spend_targets: Vec<SpendTarget>,
}

impl SpendRequest {
    /// Currency of the spend, falling back to the first target's currency.
    pub fn currency_code(&self) -> Option<&CurrencyCode> {
        self.currency_code.as_ref().or_else(|| {
            self.spend_targets
                .first()
                .and_then(|target| target.currency_code.as_ref())
        })
    }
}
