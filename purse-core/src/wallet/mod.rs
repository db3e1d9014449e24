//! Per-wallet services built on top of the engine.

pub mod gateway;
pub mod registry;
pub mod spend_info;
pub mod tokens;

pub use gateway::{RECEIVE_ONLY_SEED, WalletGateway};
pub use registry::{WalletLookupError, WalletRegistry};
pub use spend_info::{SendForm, SpendInfoBuilder};
pub use tokens::{
    ENABLED_TOKENS_FILENAME, ReadEnabledTokens, ReconcileEnabledTokens, TokenEnablementStore,
    TokenStoreError, WriteEnabledTokens,
};
