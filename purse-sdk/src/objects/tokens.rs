use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::CurrencyCode;

/// Descriptor of a secondary asset (custom token).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub currency_code: CurrencyCode,
    pub currency_name: String,
    pub contract_address: String,
    /// Smallest units per whole token, as a decimal string (`"1000000"`).
    pub multiplier: String,
}

/// Ordered set of enabled token codes for one wallet.
///
/// Serialized as a plain JSON array, which is also the on-disk format of
/// the wallet's enabled-token file. Duplicates are dropped keeping the
/// first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct EnabledTokenSet(Vec<String>);

impl EnabledTokenSet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::<String>::into).unique().collect())
    }

    /// `self` followed by the members of `other` not already present.
    pub fn union(&self, other: &EnabledTokenSet) -> Self {
        Self(self.0.iter().chain(other.0.iter()).cloned().unique().collect())
    }

    /// Members of `self` that are not in `other`, order preserved.
    pub fn difference(&self, other: &EnabledTokenSet) -> Self {
        Self(
            self.0
                .iter()
                .filter(|token| !other.contains(token))
                .cloned()
                .collect(),
        )
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for EnabledTokenSet {
    fn from(value: Vec<String>) -> Self {
        Self::new(value)
    }
}

impl From<EnabledTokenSet> for Vec<String> {
    fn from(value: EnabledTokenSet) -> Self {
        value.0
    }
}

impl<S: Into<String>> FromIterator<S> for EnabledTokenSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_then_difference_keeps_persisted_order() {
        let persisted = EnabledTokenSet::new(["A", "B"]);
        let to_enable = EnabledTokenSet::new(["C"]);
        let to_disable = EnabledTokenSet::new(["B"]);

        let result = persisted.union(&to_enable).difference(&to_disable);
        assert_eq!(result.as_slice(), ["A", "C"]);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let set = EnabledTokenSet::new(["REP", "WINGS", "REP"]);
        assert_eq!(set.as_slice(), ["REP", "WINGS"]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let set = EnabledTokenSet::new(["BTC", "ETH"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["BTC","ETH"]"#);

        let parsed: EnabledTokenSet = serde_json::from_str(r#"["BTC","ETH"]"#).unwrap();
        assert_eq!(parsed, set);
    }
}
