use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// User-facing annotations attached to spends, transactions and receive
/// addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Fiat value of the amount at the time the metadata was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_fiat: Option<Decimal>,
}

impl Metadata {
    pub fn with_amount_fiat(amount_fiat: Decimal) -> Self {
        Self {
            amount_fiat: Some(amount_fiat),
            ..Self::default()
        }
    }

    /// Overlay `other` on top of `self`; fields present in `other` win.
    pub fn merged(&self, other: &Metadata) -> Metadata {
        Metadata {
            name: other.name.clone().or_else(|| self.name.clone()),
            category: other.category.clone().or_else(|| self.category.clone()),
            notes: other.notes.clone().or_else(|| self.notes.clone()),
            amount_fiat: other.amount_fiat.or(self.amount_fiat),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.notes.is_none()
            && self.amount_fiat.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_merged_prefers_overlay_fields() {
        let base = Metadata {
            name: Some("Coffee".to_string()),
            notes: Some("morning".to_string()),
            ..Metadata::default()
        };
        let overlay = Metadata::with_amount_fiat(Decimal::from_str("3.50").unwrap());

        let merged = base.merged(&overlay);
        assert_eq!(merged.name.as_deref(), Some("Coffee"));
        assert_eq!(merged.notes.as_deref(), Some("morning"));
        assert_eq!(merged.amount_fiat, Some(Decimal::from_str("3.5").unwrap()));
    }

    #[test]
    fn test_empty_fields_are_not_serialized() {
        let json = serde_json::to_string(&Metadata::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
