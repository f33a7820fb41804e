//! ario - read the ar.io registry from the shell
//!
//! Every subcommand prints pretty JSON on stdout. Lookups of unknown
//! entities print `null`.
//!
//! ## Commands
//!
//! - `state`, `balances`, `gateways`, `records`, `reserved`, `auctions`,
//!   `observations`, `distributions`: whole mappings
//! - `balance`, `gateway`, `record`, `auction`: single entities
//! - `epoch`, `current-epoch`, `observers`: derived epoch queries

use anyhow::{Context, Result};
use ario_core::{
    init_tracing, ArIo, ArIoConfig, EvalTo, EvaluationOptions, LogFormat, Logger,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[command(name = "ario")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read-only queries against the ar.io registry contract", long_about = None)]
struct Cli {
    /// State cache base URL
    #[arg(long, global = true, env = "ARIO_REMOTE_CACHE_URL")]
    url: Option<String>,

    /// Registry contract transaction id
    #[arg(long, global = true, env = "ARIO_CONTRACT_TX_ID")]
    contract: Option<String>,

    /// Evaluate state as of this block height
    #[arg(long, global = true)]
    block_height: Option<u64>,

    /// Evaluate state as of this sort key
    #[arg(long, global = true)]
    sort_key: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Raw options; conflicts are reported by the query itself.
    fn evaluation_options(&self) -> EvaluationOptions {
        if self.block_height.is_none() && self.sort_key.is_none() {
            return EvaluationOptions::latest();
        }
        EvaluationOptions {
            eval_to: Some(EvalTo {
                block_height: self.block_height,
                sort_key: self.sort_key.clone(),
            }),
        }
    }

    fn config(&self) -> ArIoConfig {
        let mut config = ArIoConfig::from_env();
        if let Some(url) = &self.url {
            config.cache.url = url.clone();
        }
        if let Some(contract) = &self.contract {
            config.cache = config.cache.with_contract(contract);
        }
        if self.json {
            config = config.with_log_format(LogFormat::Json);
        }
        if self.verbose {
            config = config.with_log_level("debug");
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the whole registry state
    State,

    /// Balance of one wallet
    Balance {
        /// Wallet address
        address: String,
    },

    /// All balances
    Balances,

    /// One gateway by operator wallet
    Gateway {
        /// Gateway operator wallet address
        address: String,
    },

    /// All gateways
    Gateways,

    /// One ArNS record
    Record {
        /// ArNS name, e.g. `ar-io`
        domain: String,
    },

    /// All ArNS records
    Records,

    /// Reserved ArNS names
    Reserved,

    /// One auction by name
    Auction {
        /// ArNS name under auction
        domain: String,
    },

    /// All auctions
    Auctions,

    /// Epoch containing a block height
    Epoch {
        /// Block height inside the epoch
        height: u64,
    },

    /// Epoch at the evaluation point
    CurrentEpoch,

    /// Prescribed observers for the current epoch, or the epoch containing HEIGHT
    Observers {
        #[arg(long)]
        height: Option<u64>,
    },

    /// Observations for all epochs, or one epoch by start height
    Observations {
        #[arg(long)]
        epoch_start: Option<u64>,
    },

    /// Distribution bookkeeping
    Distributions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    let logger = init_tracing(config.log_format, Level::INFO);
    if std::env::var_os("RUST_LOG").is_none() {
        logger
            .set_log_level(&config.log_level)
            .context("Invalid log level")?;
    }

    let ario = ArIo::from_config(&config).context("Failed to configure registry client")?;
    let options = cli.evaluation_options();
    debug!(contract = %ario.contract_tx_id(), url = %config.cache.url, "querying registry");

    match &cli.command {
        Commands::State => print_json(&ario.get_state(&options).await?),
        Commands::Balance { address } => print_json(&ario.get_balance(address, &options).await?),
        Commands::Balances => print_json(&ario.get_balances(&options).await?),
        Commands::Gateway { address } => print_json(&ario.get_gateway(address, &options).await?),
        Commands::Gateways => print_json(&ario.get_gateways(&options).await?),
        Commands::Record { domain } => print_json(&ario.get_arns_record(domain, &options).await?),
        Commands::Records => print_json(&ario.get_arns_records(&options).await?),
        Commands::Reserved => print_json(&ario.get_reserved_names(&options).await?),
        Commands::Auction { domain } => print_json(&ario.get_auction(domain, &options).await?),
        Commands::Auctions => print_json(&ario.get_auctions(&options).await?),
        Commands::Epoch { height } => print_json(&ario.get_epoch(*height, &options).await?),
        Commands::CurrentEpoch => print_json(&ario.get_current_epoch(&options).await?),
        Commands::Observers { height: None } => {
            print_json(&ario.get_prescribed_observers(&options).await?)
        }
        Commands::Observers {
            height: Some(height),
        } => print_json(
            &ario
                .get_prescribed_observers_for_epoch(*height, &options)
                .await?,
        ),
        Commands::Observations { epoch_start: None } => {
            print_json(&ario.get_observations(&options).await?)
        }
        Commands::Observations {
            epoch_start: Some(start),
        } => print_json(&ario.get_epoch_observations(*start, &options).await?),
        Commands::Distributions => print_json(&ario.get_distributions(&options).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ario_core::EvaluationPoint;

    #[test]
    fn test_no_pin_is_latest() {
        let cli = Cli::try_parse_from(["ario", "gateways"]).unwrap();
        assert_eq!(cli.evaluation_options().resolve().unwrap(), EvaluationPoint::Latest);
    }

    #[test]
    fn test_block_height_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ario",
            "gateway",
            "1H7WZIWhzwTH9FIcnuMqYkTsoyv1OTfGa_amvuYwrgo",
            "--block-height",
            "1377100",
        ])
        .unwrap();
        assert_eq!(
            cli.evaluation_options().resolve().unwrap(),
            EvaluationPoint::AtBlockHeight(1_377_100)
        );
        assert!(matches!(cli.command, Commands::Gateway { .. }));
    }

    #[test]
    fn test_both_pins_surface_validation_error() {
        let cli = Cli::try_parse_from([
            "ario",
            "--block-height",
            "1377100",
            "--sort-key",
            "000001376946,0000000000000,18d52956",
            "current-epoch",
        ])
        .unwrap();
        assert!(cli.evaluation_options().resolve().is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "ario",
            "--url",
            "http://localhost:3000",
            "--contract",
            "_NctcA2sRy1-J4OmIQZbYFPM17piNcbdBPH2ncX2RL8",
            "--json",
            "-v",
            "distributions",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.cache.url, "http://localhost:3000");
        assert_eq!(config.cache.contract_tx_id, "_NctcA2sRy1-J4OmIQZbYFPM17piNcbdBPH2ncX2RL8");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_observations_by_epoch_start() {
        let cli = Cli::try_parse_from(["ario", "observations", "--epoch-start", "1376620"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Observations {
                epoch_start: Some(1_376_620)
            }
        ));
    }
}
