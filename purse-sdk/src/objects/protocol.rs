//! Payment-protocol (merchant invoice) descriptors.

use serde::{Deserialize, Serialize};

use super::SpendTarget;

/// Merchant invoice resolved from a payment-protocol URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProtocolInfo {
    pub domain: String,
    pub native_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    pub spend_targets: Vec<SpendTarget>,
}

impl PaymentProtocolInfo {
    /// Merchant name for display, falling back to the requesting domain.
    pub fn display_name(&self) -> &str {
        match self.merchant.as_deref() {
            Some(merchant) if !merchant.is_empty() => merchant,
            _ => &self.domain,
        }
    }
}

/// Outcome of resolving a payment-protocol URI.
///
/// Resolution failures never surface as a realistic-looking invoice: a
/// substituted descriptor is always marked [`Stale`](Self::Stale).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolInfoResolution {
    /// Freshly resolved from the merchant.
    Fresh(PaymentProtocolInfo),
    /// Resolution failed; `info` is the last descriptor that resolved
    /// successfully on this wallet.
    Stale {
        info: PaymentProtocolInfo,
        reason: String,
    },
    /// Resolution failed and nothing was ever resolved before.
    Unavailable { reason: String },
}

impl ProtocolInfoResolution {
    /// The descriptor, if it came from the merchant just now.
    pub fn fresh(self) -> Result<PaymentProtocolInfo, String> {
        match self {
            ProtocolInfoResolution::Fresh(info) => Ok(info),
            ProtocolInfoResolution::Stale { reason, .. }
            | ProtocolInfoResolution::Unavailable { reason } => Err(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(merchant: Option<&str>) -> PaymentProtocolInfo {
        PaymentProtocolInfo {
            domain: "merchant.example".to_string(),
            native_amount: "11000000".to_string(),
            memo: Some("Invoice: 1.0 lb Havarti".to_string()),
            merchant: merchant.map(str::to_string),
            spend_targets: vec![],
        }
    }

    #[test]
    fn test_display_name_falls_back_to_domain() {
        assert_eq!(invoice(Some("Sprouts")).display_name(), "Sprouts");
        assert_eq!(invoice(None).display_name(), "merchant.example");
        assert_eq!(invoice(Some("")).display_name(), "merchant.example");
    }

    #[test]
    fn test_stale_resolution_is_not_fresh() {
        let stale = ProtocolInfoResolution::Stale {
            info: invoice(None),
            reason: "timeout".to_string(),
        };
        assert_eq!(stale.fresh(), Err("timeout".to_string()));

        let fresh = ProtocolInfoResolution::Fresh(invoice(Some("Sprouts")));
        assert_eq!(fresh.fresh(), Ok(invoice(Some("Sprouts"))));
    }
}
