//! Wallet data model shared between the engine seam and the UI layer.
//!
//! Field names serialize in camelCase so the objects line up with the JSON
//! the wallet engine produces and consumes.

pub mod intent;
pub mod metadata;
pub mod protocol;
pub mod spend;
pub mod tokens;
pub mod transaction;

pub use intent::{ParsedPaymentIntent, UriParseResult};
pub use metadata::Metadata;
pub use protocol::{PaymentProtocolInfo, ProtocolInfoResolution};
pub use spend::{NetworkFeeOption, SpendRequest, SpendTarget, SpendTargetParams};
pub use tokens::{EnabledTokenSet, TokenInfo};
pub use transaction::{AmountPair, ReceiveAddress, Transaction, TransactionQuery};

/// Currency ticker such as `BTC` or a token code such as `USDC`.
pub type CurrencyCode = compact_str::CompactString;
