use chainscan_core::{
    config::AppConfig,
    types::{ModeFilter, NetworkMode},
    upstream::SelectionAlgorithm,
};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;

mod commands;
mod logging;

use commands::{
    balance, bench, gas, handle_config_command, list_chains, select, utils::CliError,
    AppContext, ConfigCommands, Interaction, ScanOptions,
};

#[derive(Parser)]
#[command(name = "chainscan")]
#[command(about = "chainscan - multi-chain balances, gas prices and RPC benchmarks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $CHAINSCAN_CONFIG or config/chainscan.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Args, Clone)]
struct ScanArgs {
    /// Networks to scan: mainnet, testnet or both
    #[arg(short, long)]
    mode: Option<ModeFilter>,

    /// Restrict to a chain by key, name or chain id (can be specified multiple times)
    #[arg(short, long)]
    chain: Vec<String>,

    /// Endpoint selection: fastest, round-robin or failover
    #[arg(short, long)]
    algorithm: Option<SelectionAlgorithm>,

    /// Print the final table and exit instead of waiting for r/o/q (implied when stdin is
    /// not a terminal)
    #[arg(long)]
    no_interactive: bool,
}

impl From<ScanArgs> for ScanOptions {
    fn from(args: ScanArgs) -> Self {
        Self {
            mode: args.mode,
            chains: args.chain,
            algorithm: args.algorithm,
            interaction: if args.no_interactive || !std::io::stdin().is_terminal() {
                Interaction::Once
            } else {
                Interaction::Interactive
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Native balance of an address on every chain
    Balance {
        /// 0x-prefixed address
        address: String,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Current gas price on every chain
    Gas {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Benchmark every candidate RPC
    Bench {
        /// Only this chain
        chain: Option<String>,

        #[arg(short, long)]
        mode: Option<ModeFilter>,

        /// Per-probe timeout in milliseconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Run endpoint selection repeatedly for one chain
    Select {
        chain: String,

        #[arg(short, long, default_value = "mainnet")]
        mode: NetworkMode,

        #[arg(short, long)]
        algorithm: Option<SelectionAlgorithm>,

        /// Number of selections to run
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,
    },

    /// List known chains
    Chains {
        #[arg(short, long, default_value = "both")]
        mode: ModeFilter,
    },

    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn load_config(path: Option<&str>) -> Result<AppConfig, CliError> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };
    config.validate().map_err(CliError::Config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Config(config_command) => {
            logging::init_logging(&AppConfig::default().logging, cli.verbose);
            handle_config_command(config_command).await?;
            return Ok(());
        }
        command => command,
    };

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.logging, cli.verbose);
    tracing::debug!(
        algorithm = %config.selection.algorithm,
        mode = %config.scan.mode,
        "config loaded"
    );

    let ctx = AppContext::new(config)?;

    match command {
        Commands::Balance { address, scan } => balance(&ctx, &address, scan.into()).await?,
        Commands::Gas { scan } => gas(&ctx, scan.into()).await?,
        Commands::Bench { chain, mode, timeout } => bench(&ctx, chain, mode, timeout).await?,
        Commands::Select { chain, mode, algorithm, count } => {
            select(&ctx, &chain, mode, algorithm, count).await?;
        }
        Commands::Chains { mode } => list_chains(&ctx, mode)?,
        Commands::Config(_) => {}
    }

    Ok(())
}
