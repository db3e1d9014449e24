//! Parsed payment targets.
//!
//! A [`ParsedPaymentIntent`] is produced by URI parsing and then replaced
//! (never mutated) by every amount or identifier edit the user makes on the
//! send screen. Every field is optional so the same shape also carries the
//! partial overrides applied by amount and fee edits.

use serde::{Deserialize, Serialize};

use super::{CurrencyCode, Metadata, TokenInfo};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPaymentIntent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<CurrencyCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_address: Option<String>,
    /// Requested amount in the currency's smallest unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_amount: Option<String>,
    /// Memo, destination tag or payment id depending on the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_protocol_uri: Option<String>,
}

impl ParsedPaymentIntent {
    /// An override that only carries a new amount.
    pub fn with_native_amount(native_amount: impl Into<String>) -> Self {
        Self {
            native_amount: Some(native_amount.into()),
            ..Self::default()
        }
    }

    /// Copy of this intent with `unique_identifier` replaced.
    pub fn with_unique_identifier(&self, unique_identifier: impl Into<String>) -> Self {
        Self {
            unique_identifier: Some(unique_identifier.into()),
            ..self.clone()
        }
    }

    /// Overlay `update` on this intent. Present fields of `update` win;
    /// metadata is merged field by field.
    pub fn merged(&self, update: &ParsedPaymentIntent) -> Self {
        let metadata = match (&self.metadata, &update.metadata) {
            (Some(current), Some(next)) => Some(current.merged(next)),
            (current, next) => next.clone().or_else(|| current.clone()),
        };
        Self {
            currency_code: update
                .currency_code
                .clone()
                .or_else(|| self.currency_code.clone()),
            public_address: update
                .public_address
                .clone()
                .or_else(|| self.public_address.clone()),
            legacy_address: update
                .legacy_address
                .clone()
                .or_else(|| self.legacy_address.clone()),
            native_amount: update
                .native_amount
                .clone()
                .or_else(|| self.native_amount.clone()),
            unique_identifier: update
                .unique_identifier
                .clone()
                .or_else(|| self.unique_identifier.clone()),
            metadata,
            payment_protocol_uri: update
                .payment_protocol_uri
                .clone()
                .or_else(|| self.payment_protocol_uri.clone()),
        }
    }

    /// Native amount, or `"0"` when none has been entered yet.
    pub fn native_amount_or_zero(&self) -> &str {
        self.native_amount.as_deref().unwrap_or("0")
    }
}

/// Result of parsing a scanned or pasted URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UriParseResult {
    /// A payment request that can feed the send flow.
    Payment(ParsedPaymentIntent),
    /// A token descriptor the user may add to the wallet.
    Token(TokenInfo),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Metadata;

    fn scanned() -> ParsedPaymentIntent {
        ParsedPaymentIntent {
            currency_code: Some("BTC".into()),
            public_address: Some("1F1tAaz5x1HUXrCNLbtMDqcw6o5GNn4xqX".to_string()),
            native_amount: Some("11000000".to_string()),
            metadata: Some(Metadata {
                name: Some("Cheese shop".to_string()),
                ..Metadata::default()
            }),
            ..ParsedPaymentIntent::default()
        }
    }

    #[test]
    fn test_merge_keeps_destination_and_replaces_amount() {
        let merged = scanned().merged(&ParsedPaymentIntent::with_native_amount("5000"));
        assert_eq!(merged.native_amount.as_deref(), Some("5000"));
        assert_eq!(merged.public_address, scanned().public_address);
        assert_eq!(
            merged.metadata.and_then(|m| m.name).as_deref(),
            Some("Cheese shop")
        );
    }

    #[test]
    fn test_with_unique_identifier_leaves_original_untouched() {
        let original = scanned();
        let tagged = original.with_unique_identifier("memo-42");
        assert_eq!(tagged.unique_identifier.as_deref(), Some("memo-42"));
        assert!(original.unique_identifier.is_none());
    }

    #[test]
    fn test_parse_result_is_tagged() {
        let json = serde_json::to_value(UriParseResult::Payment(scanned())).unwrap();
        assert_eq!(json["kind"], "payment");
        assert_eq!(json["publicAddress"], "1F1tAaz5x1HUXrCNLbtMDqcw6o5GNn4xqX");
    }
}
