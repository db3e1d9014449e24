//! purse CLI
//!
//! Drives the wallet send/request core against in-memory wallets: parse a
//! payment URI and send it, convert request amounts, manage enabled tokens.
//! UI events produced by the controllers are rendered to the log.

mod config;
mod state;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use config::ConfigLoader;
use purse_core::events::{UiEvent, UiEventReceiver, UiEventSender, ui_event_channel};
use purse_core::processors::{RequestAmount, SendConfirmation, SendOutcome};
use purse_core::wallet::TokenEnablementStore;
use purse_sdk::amount::exchange_to_native;
use purse_sdk::objects::{EnabledTokenSet, NetworkFeeOption, UriParseResult};
use std::path::PathBuf;
use std::sync::Arc;
use state::AppState;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// purse - wallet send/request core driver
#[derive(Parser, Debug)]
#[command(name = "purse")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "PURSE_CONFIG", default_value = "./purse.toml")]
    config: PathBuf,

    /// Wallet to operate on (defaults to the first configured wallet)
    #[arg(short, long, env = "PURSE_WALLET")]
    wallet: Option<String>,

    /// Override the per-step engine timeout in seconds
    #[arg(long)]
    step_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter config file if none exists
    Init,
    /// List configured wallets
    Wallets,
    /// Show the balance of the selected wallet
    Balance {
        /// Currency or token code (defaults to the wallet's currency)
        currency: Option<String>,
    },
    /// Pay a payment URI or bare address
    Send {
        uri: String,
        /// Amount in display units, overriding the URI amount
        #[arg(long, conflicts_with = "max")]
        amount: Option<String>,
        /// Spend the whole balance
        #[arg(long)]
        max: bool,
        #[arg(long, value_enum, default_value_t = FeeArg::Standard)]
        fee: FeeArg,
        /// Fee in smallest units, used with `--fee custom`
        #[arg(long)]
        custom_fee: Option<String>,
        /// Memo or destination tag
        #[arg(long)]
        unique_identifier: Option<String>,
        #[arg(long)]
        label: Option<String>,
        /// Build the transaction but do not sign or broadcast it
        #[arg(long)]
        dry_run: bool,
    },
    /// Convert a request amount and show the receive address
    Request {
        #[arg(long, conflicts_with = "fiat", required_unless_present = "fiat")]
        crypto: Option<String>,
        #[arg(long)]
        fiat: Option<String>,
    },
    /// Manage the enabled-token set
    Tokens {
        #[command(subcommand)]
        action: TokensCommand,
    },
    /// Rename the selected wallet
    Rename { name: String },
    /// Resync the selected wallet
    Resync,
    /// Show the display private seed
    Seed,
}

#[derive(Subcommand, Debug)]
enum TokensCommand {
    /// Show the enabled tokens
    List,
    /// Replace the enabled set
    Set { tokens: Vec<String> },
    /// Enable tokens in addition to the current set
    Enable { tokens: Vec<String> },
    /// Disable tokens
    Disable { tokens: Vec<String> },
    /// Add a custom token from a token URI
    Add { uri: String },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FeeArg {
    Low,
    Standard,
    High,
    Custom,
}

impl From<FeeArg> for NetworkFeeOption {
    fn from(fee: FeeArg) -> Self {
        match fee {
            FeeArg::Low => NetworkFeeOption::Low,
            FeeArg::Standard => NetworkFeeOption::Standard,
            FeeArg::High => NetworkFeeOption::High,
            FeeArg::Custom => NetworkFeeOption::Custom,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    let config_loader = ConfigLoader::new(&args.config, args.step_timeout_secs);
    if matches!(args.command, Command::Init) {
        if config_loader.write_default()? {
            println!("wrote {}", args.config.display());
        } else {
            println!("{} already exists", args.config.display());
        }
        return Ok(());
    }

    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::debug!("Configuration loaded from {:?}", args.config);

    let (shared_config, wallet_configs) = loaded_config.into_shared();
    let state = AppState::new(shared_config, wallet_configs).await;
    if let Some(wallet_id) = &args.wallet {
        state.wallets.select(wallet_id).await?;
    }

    let (events_tx, events_rx) = ui_event_channel();
    let renderer = tokio::spawn(render_events(events_rx));

    let result = run(args.command, &state, events_tx).await;

    // All senders are gone once `run` returns; drain what is left.
    renderer.await.context("event renderer panicked")?;
    result
}

async fn run(command: Command, state: &AppState, events: UiEventSender) -> anyhow::Result<()> {
    match command {
        Command::Init => Ok(()),
        Command::Wallets => {
            let selected = state.wallets.selected_id().await;
            for id in state.wallets.ids().await {
                let Some(settings) = state.settings(&id) else {
                    continue;
                };
                let gateway = state.wallets.get(&id).await?;
                let transactions = gateway
                    .get_num_transactions(&settings.currency_code)
                    .await?;
                let marker = if selected.as_deref() == Some(id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {id}  {} [{}] {transactions} transactions",
                    settings.name, settings.currency_code
                );
            }
            Ok(())
        }
        Command::Balance { currency } => {
            let (gateway, settings) = state.selected().await?;
            let currency = currency.unwrap_or_else(|| settings.currency_code.clone());
            let balance = gateway.get_balance(&currency).await?;
            println!("{balance} {currency} (smallest units)");
            Ok(())
        }
        Command::Send {
            uri,
            amount,
            max,
            fee,
            custom_fee,
            unique_identifier,
            label,
            dry_run,
        } => {
            let request = SendRequest {
                uri,
                amount,
                max,
                fee,
                custom_fee,
                unique_identifier,
                label,
                dry_run,
            };
            send(state, Arc::new(events), request).await
        }
        Command::Request { crypto, fiat } => {
            let (gateway, settings) = state.selected().await?;
            let config = state.config.request().await.clone();
            let controller = RequestAmount::new(gateway, Arc::new(events), config);

            let address = controller
                .refresh_receive_address(&settings.currency_code)
                .await?;
            let amounts = match (crypto, fiat) {
                (Some(crypto), _) => controller.on_crypto_input(&crypto).await?,
                (None, Some(fiat)) => controller.on_fiat_input(&fiat).await?,
                (None, None) => bail!("either --crypto or --fiat is required"),
            };
            println!(
                "request {} {} ({} fiat) at {}",
                amounts.crypto, settings.currency_code, amounts.fiat, address.public_address
            );
            Ok(())
        }
        Command::Tokens { action } => {
            let (gateway, _) = state.selected().await?;
            let store = TokenEnablementStore::new(gateway.clone());
            let enabled = match action {
                TokensCommand::List => store.read().await,
                TokensCommand::Set { tokens } => store.write(tokens.into(), None).await?,
                TokensCommand::Enable { tokens } => {
                    store
                        .try_reconcile(&tokens.into(), &EnabledTokenSet::default())
                        .await?
                }
                TokensCommand::Disable { tokens } => {
                    store
                        .try_reconcile(&EnabledTokenSet::default(), &tokens.into())
                        .await?
                }
                TokensCommand::Add { uri } => match gateway.parse_uri(&uri)? {
                    UriParseResult::Token(token) => store.add_custom_token(&token).await?,
                    UriParseResult::Payment(_) => bail!("{uri} is a payment URI, not a token"),
                },
            };
            println!("enabled tokens: {}", enabled.as_slice().join(", "));
            Ok(())
        }
        Command::Rename { name } => {
            let (gateway, _) = state.selected().await?;
            gateway.rename_wallet(&name).await?;
            println!("renamed {} to {name}", gateway.wallet_id());
            Ok(())
        }
        Command::Resync => {
            let (gateway, _) = state.selected().await?;
            gateway.resync().await?;
            println!("resync requested for {}", gateway.wallet_id());
            Ok(())
        }
        Command::Seed => {
            let (gateway, _) = state.selected().await?;
            println!("{}", gateway.get_display_private_seed().await?);
            Ok(())
        }
    }
}

/// Arguments of the `send` command.
struct SendRequest {
    uri: String,
    amount: Option<String>,
    max: bool,
    fee: FeeArg,
    custom_fee: Option<String>,
    unique_identifier: Option<String>,
    label: Option<String>,
    dry_run: bool,
}

impl SendRequest {
    /// Flags that would rebuild the form; an invoice fixes amount, fee and targets.
    fn invoice_overrides(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.amount.is_some() {
            flags.push("--amount");
        }
        if self.max {
            flags.push("--max");
        }
        if self.fee != FeeArg::Standard || self.custom_fee.is_some() {
            flags.push("--fee");
        }
        if self.unique_identifier.is_some() {
            flags.push("--unique-identifier");
        }
        flags
    }
}

async fn send(state: &AppState, events: Arc<UiEventSender>, request: SendRequest) -> anyhow::Result<()> {
    let (gateway, settings) = state.selected().await?;
    let send_config = state.config.send().await.clone();
    let fiat_per_crypto = state.config.request().await.fiat_per_crypto;
    let controller = SendConfirmation::new(gateway.clone(), events, send_config);

    let intent = match gateway.parse_uri(&request.uri)? {
        UriParseResult::Payment(intent) => intent,
        UriParseResult::Token(token) => bail!(
            "{} describes token {}; use `purse tokens add`",
            request.uri,
            token.currency_code
        ),
    };

    if intent.payment_protocol_uri.is_some() {
        let overrides = request.invoice_overrides();
        if !overrides.is_empty() {
            bail!(
                "{} is a payment request; {} cannot be combined with it",
                request.uri,
                overrides.join(", ")
            );
        }
    }

    if let Some(label) = request.label {
        controller.update_label(label).await;
    }

    let mut outcome = if intent.payment_protocol_uri.is_some() {
        controller.payment_protocol_received(intent).await
    } else {
        controller.update_parsed_intent(intent).await
    };

    let fee = NetworkFeeOption::from(request.fee);
    if fee != NetworkFeeOption::Standard {
        let mut custom = serde_json::Map::new();
        if let Some(native_fee) = request.custom_fee {
            custom.insert("nativeFee".to_string(), native_fee.into());
        }
        outcome = controller.update_network_fee(fee, custom).await;
    }
    if let Some(amount) = request.amount {
        let native_amount = exchange_to_native(&amount, &settings.multiplier)?;
        outcome = controller
            .update_amount(&native_amount, &amount, &fiat_per_crypto.to_string())
            .await?;
    }
    if request.max {
        outcome = controller.update_max_spend().await;
    }
    if let Some(unique_identifier) = request.unique_identifier {
        outcome = controller.unique_identifier_updated(&unique_identifier).await;
    }

    match outcome {
        SendOutcome::Built(transaction) if request.dry_run => {
            println!(
                "built {} (amount {}, fee {})",
                transaction.txid, transaction.native_amount, transaction.network_fee
            );
            return Ok(());
        }
        SendOutcome::Built(_) => {}
        SendOutcome::BuildFailed(e) | SendOutcome::QueryFailed(e) => {
            bail!("cannot build transaction: {e}")
        }
        other => bail!("transaction not ready: {other:?}"),
    }

    match controller.sign_broadcast_and_save().await {
        SendOutcome::Sent(transaction) => {
            println!("sent {}", transaction.txid);
            Ok(())
        }
        SendOutcome::Failed(e) => bail!("send failed: {}", e.user_message()),
        other => bail!("send not attempted: {other:?}"),
    }
}

/// Log every UI event until all senders are dropped.
async fn render_events(mut events: UiEventReceiver) {
    while let Some(event) = events.recv().await {
        match &event {
            UiEvent::Notify(notification) if notification.success => {
                tracing::info!(title = %notification.title, "{}", notification.message);
            }
            UiEvent::Notify(notification) => {
                tracing::error!(title = %notification.title, "{}", notification.message);
            }
            UiEvent::UpdateTransaction {
                transaction,
                error,
                ..
            } => {
                tracing::debug!(
                    txid = transaction.as_ref().map(|tx| tx.txid.as_str()),
                    error = error.as_ref().map(tracing::field::display),
                    "Transaction updated"
                );
            }
            other => tracing::debug!(event = other.kind(), ?other, "UI event"),
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,purse_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(uri: &str) -> SendRequest {
        SendRequest {
            uri: uri.to_string(),
            amount: None,
            max: false,
            fee: FeeArg::Standard,
            custom_fee: None,
            unique_identifier: None,
            label: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_plain_send_has_no_invoice_overrides() {
        let mut request = plain("bitcoin:?r=https://merchant.example/i/1");
        request.label = Some("Lunch".to_string());
        request.dry_run = true;
        assert!(request.invoice_overrides().is_empty());
    }

    #[test]
    fn test_invoice_overrides_lists_rebuilding_flags() {
        let mut request = plain("bitcoin:?r=https://merchant.example/i/1");
        request.amount = Some("0.5".to_string());
        request.fee = FeeArg::High;
        request.unique_identifier = Some("1234".to_string());
        assert_eq!(
            request.invoice_overrides(),
            vec!["--amount", "--fee", "--unique-identifier"]
        );

        let mut request = plain("bitcoin:?r=https://merchant.example/i/1");
        request.max = true;
        assert_eq!(request.invoice_overrides(), vec!["--max"]);
    }
}
