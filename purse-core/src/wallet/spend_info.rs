//! SpendInfoBuilder: pure transformations into a [`SpendRequest`].

use purse_sdk::objects::{
    Metadata, NetworkFeeOption, ParsedPaymentIntent, PaymentProtocolInfo, SpendRequest,
    SpendTarget, SpendTargetParams,
};
use serde::{Deserialize, Serialize};

/// User-editable inputs of the send screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendForm {
    /// Current payment target, replaced on every edit.
    pub intent: ParsedPaymentIntent,
    pub network_fee_option: NetworkFeeOption,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom_network_fee: serde_json::Map<String, serde_json::Value>,
    /// Payee label typed by the user.
    #[serde(default)]
    pub label: String,
}

pub struct SpendInfoBuilder;

impl SpendInfoBuilder {
    /// A single-target spend paying `intent`.
    pub fn from_parsed_intent(intent: &ParsedPaymentIntent) -> SpendRequest {
        let native_amount = intent.native_amount_or_zero().to_string();
        SpendRequest {
            currency_code: intent.currency_code.clone(),
            native_amount: Some(native_amount.clone()),
            metadata: intent.metadata.clone().unwrap_or_default(),
            spend_targets: vec![SpendTarget {
                currency_code: intent.currency_code.clone(),
                public_address: intent.public_address.clone().unwrap_or_default(),
                native_amount,
                other_params: SpendTargetParams {
                    unique_identifier: intent.unique_identifier.clone(),
                    ..SpendTargetParams::default()
                },
            }],
            ..SpendRequest::default()
        }
    }

    /// Spend paying a merchant invoice. Invoices always go out at high fee
    /// priority with the targets exactly as the merchant sent them.
    pub fn from_payment_protocol_info(info: &PaymentProtocolInfo) -> SpendRequest {
        SpendRequest {
            currency_code: info
                .spend_targets
                .first()
                .and_then(|target| target.currency_code.clone()),
            native_amount: Some(info.native_amount.clone()),
            network_fee_option: NetworkFeeOption::High,
            metadata: Metadata {
                name: Some(info.display_name().to_string()),
                notes: info.memo.clone(),
                ..Metadata::default()
            },
            spend_targets: info.spend_targets.clone(),
            ..SpendRequest::default()
        }
    }

    /// Apply `update` to the form's intent and build the spend for the
    /// result. Returns the merged intent alongside the request.
    pub fn from_form(
        form: &SendForm,
        update: &ParsedPaymentIntent,
    ) -> (ParsedPaymentIntent, SpendRequest) {
        let intent = form.intent.merged(update);
        let mut request = Self::from_parsed_intent(&intent);
        request.network_fee_option = form.network_fee_option;
        if form.network_fee_option == NetworkFeeOption::Custom {
            request.custom_network_fee = form.custom_network_fee.clone();
        }
        if !form.label.is_empty() {
            request.metadata.name = Some(form.label.clone());
        }
        (intent, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn scanned() -> ParsedPaymentIntent {
        ParsedPaymentIntent {
            currency_code: Some("XRP".into()),
            public_address: Some("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".to_string()),
            native_amount: Some("25000000".to_string()),
            unique_identifier: Some("1234".to_string()),
            metadata: Some(Metadata {
                name: Some("Exchange deposit".to_string()),
                ..Metadata::default()
            }),
            ..ParsedPaymentIntent::default()
        }
    }

    fn invoice(merchant: Option<&str>) -> PaymentProtocolInfo {
        PaymentProtocolInfo {
            domain: "merchant.example".to_string(),
            native_amount: "11000000".to_string(),
            memo: Some("Invoice: 1.0 lb Havarti Cheese".to_string()),
            merchant: merchant.map(str::to_string),
            spend_targets: vec![SpendTarget {
                currency_code: Some("BTC".into()),
                public_address: "1F1tAaz5x1HUXrCNLbtMDqcw6o5GNn4xqX".to_string(),
                native_amount: "11000000".to_string(),
                other_params: SpendTargetParams::default(),
            }],
        }
    }

    #[test]
    fn test_parsed_intent_becomes_single_target() {
        let request = SpendInfoBuilder::from_parsed_intent(&scanned());

        assert_eq!(request.currency_code.as_deref(), Some("XRP"));
        assert_eq!(request.native_amount.as_deref(), Some("25000000"));
        assert_eq!(request.network_fee_option, NetworkFeeOption::Standard);
        assert_eq!(request.metadata.name.as_deref(), Some("Exchange deposit"));
        assert_eq!(request.spend_targets.len(), 1);

        let target = &request.spend_targets[0];
        assert_eq!(target.public_address, "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh");
        assert_eq!(target.native_amount, "25000000");
        assert_eq!(target.other_params.unique_identifier.as_deref(), Some("1234"));
    }

    #[test]
    fn test_missing_amount_defaults_to_zero() {
        let intent = ParsedPaymentIntent {
            native_amount: None,
            ..scanned()
        };
        let request = SpendInfoBuilder::from_parsed_intent(&intent);
        assert_eq!(request.native_amount.as_deref(), Some("0"));
        assert_eq!(request.spend_targets[0].native_amount, "0");
    }

    #[test]
    fn test_protocol_info_uses_high_fee_and_merchant_name() {
        let info = invoice(Some("Sprouts Farmers' Market"));
        let request = SpendInfoBuilder::from_payment_protocol_info(&info);

        assert_eq!(request.network_fee_option, NetworkFeeOption::High);
        assert_eq!(
            request.metadata.name.as_deref(),
            Some("Sprouts Farmers' Market")
        );
        assert_eq!(request.spend_targets, info.spend_targets);
        assert_eq!(request.currency_code.as_deref(), Some("BTC"));
    }

    #[test]
    fn test_protocol_info_without_merchant_falls_back_to_domain() {
        let request = SpendInfoBuilder::from_payment_protocol_info(&invoice(None));
        assert_eq!(request.metadata.name.as_deref(), Some("merchant.example"));
    }

    #[test]
    fn test_form_merges_amount_update_and_fee_selection() {
        let mut custom = serde_json::Map::new();
        custom.insert("nativeFee".to_string(), "777".into());
        let form = SendForm {
            intent: scanned(),
            network_fee_option: NetworkFeeOption::Custom,
            custom_network_fee: custom,
            label: String::new(),
        };
        let update = ParsedPaymentIntent {
            native_amount: Some("100".to_string()),
            metadata: Some(Metadata::with_amount_fiat(Decimal::new(177, 2))),
            ..ParsedPaymentIntent::default()
        };

        let (intent, request) = SpendInfoBuilder::from_form(&form, &update);
        assert_eq!(intent.native_amount.as_deref(), Some("100"));
        assert_eq!(intent.public_address, scanned().public_address);
        assert_eq!(request.network_fee_option, NetworkFeeOption::Custom);
        assert_eq!(request.custom_network_fee["nativeFee"], "777");
        assert_eq!(request.metadata.amount_fiat, Some(Decimal::new(177, 2)));
        assert_eq!(request.metadata.name.as_deref(), Some("Exchange deposit"));
        assert_eq!(
            request.spend_targets[0].other_params.unique_identifier.as_deref(),
            Some("1234")
        );
    }

    #[test]
    fn test_form_label_names_the_spend() {
        let form = SendForm {
            intent: scanned(),
            label: "Rent".to_string(),
            ..SendForm::default()
        };
        let (_, request) = SpendInfoBuilder::from_form(&form, &ParsedPaymentIntent::default());
        assert_eq!(request.metadata.name.as_deref(), Some("Rent"));
        assert!(request.custom_network_fee.is_empty());
    }
}
