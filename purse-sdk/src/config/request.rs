//! Request screen configuration.

use rust_decimal::Decimal;

/// Conversion settings for the request screen.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Fiat units per whole crypto unit.
    pub fiat_per_crypto: Decimal,
    /// Decimal places kept on the fiat side.
    pub fiat_decimals: u32,
    /// Decimal places kept on the crypto side.
    pub crypto_decimals: u32,
}

impl RequestConfig {
    /// Create a new RequestConfig.
    pub fn new(fiat_per_crypto: Decimal, fiat_decimals: u32, crypto_decimals: u32) -> Self {
        Self {
            fiat_per_crypto,
            fiat_decimals,
            crypto_decimals,
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            fiat_per_crypto: Decimal::new(177345, 5),
            fiat_decimals: 2,
            crypto_decimals: 8,
        }
    }
}
