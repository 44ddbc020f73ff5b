use chainscan_core::{config::AppConfig, registry::RpcSource};
use clap::Subcommand;
use std::{path::Path, time::Duration};

use super::{
    context::AppContext,
    utils::{print_error, print_info, print_success, short_host, CliError, CliResult},
};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = "config/chainscan.toml")]
        file: String,
    },

    /// Show the effective configuration (file plus environment overrides)
    Show {
        /// Path to config file
        #[arg(short, long, default_value = "config/chainscan.toml")]
        file: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/chainscan.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Probe the custom RPCs listed in a configuration file
    TestRpcs {
        /// Path to config file
        #[arg(short, long, default_value = "config/chainscan.toml")]
        file: String,

        /// Timeout in milliseconds for each probe
        #[arg(short, long, default_value = "5000")]
        timeout: u64,
    },
}

pub async fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file, json } => show_config(&file, json),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
        ConfigCommands::TestRpcs { file, timeout } => test_rpcs(&file, timeout).await,
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = AppConfig::from_file(file)?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Algorithm: {}", config.selection.algorithm);
    println!("  Scan mode: {}", config.scan.mode);
    println!("  Target timeout: {}ms", config.timeouts.target_timeout_ms);
    println!("  Custom RPC groups: {}", config.rpcs.len());
    println!("  Prices: {} currencies", config.prices.len());

    Ok(())
}

fn show_config(file: &str, json: bool) -> CliResult<()> {
    let config = AppConfig::from_file(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Configuration from {file}:");

    println!("\n[Selection]");
    println!("  Algorithm: {}", config.selection.algorithm);
    println!("  Failover Cooldown: {}s", config.selection.failover_cooldown_seconds);

    println!("\n[Timeouts]");
    println!("  Target: {}ms", config.timeouts.target_timeout_ms);
    println!("  Benchmark: {}ms", config.timeouts.benchmark_timeout_ms);
    println!("  Failover Probe: {}ms", config.timeouts.failover_probe_timeout_ms);
    println!("  Request: {}ms", config.timeouts.request_timeout_ms);

    println!("\n[Scan]");
    println!("  Mode: {}", config.scan.mode);
    println!("  Error Width: {}", config.scan.error_max_len);

    println!("\n[Custom RPCs] ({} groups)", config.rpcs.len());
    for custom in &config.rpcs {
        println!("  {} {}:", custom.chain, custom.mode);
        for url in &custom.urls {
            println!("    {url}");
        }
    }

    println!("\n[Prices]");
    for (symbol, price) in &config.prices {
        println!("  {symbol}: ${price}");
    }

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# chainscan configuration
# Every value below is optional; omitted keys fall back to these defaults.

[selection]
# fastest | round-robin | failover
algorithm = "fastest"
failover_cooldown_seconds = 60

[timeouts]
target_timeout_ms = 8000
benchmark_timeout_ms = 5000
failover_probe_timeout_ms = 2000
request_timeout_ms = 10000

[scan]
# mainnet | testnet | both
mode = "mainnet"
error_max_len = 48

# Custom RPCs are tried ahead of the built-in list
[[rpcs]]
chain = "ethereum"
mode = "mainnet"
urls = ["https://eth-mainnet.g.alchemy.com/v2/YOUR_API_KEY"]

# USD price per native unit, used for balance conversion on mainnets
[prices]
ETH = 3000.0
POL = 0.5
BNB = 550.0
AVAX = 30.0

[logging]
level = "warn"
format = "pretty"
"#;

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Remember to:");
    print_info("  1. Replace the YOUR_API_KEY placeholder or drop the [[rpcs]] entry");
    print_info("  2. Update [prices] before trusting USD totals");

    Ok(())
}

async fn test_rpcs(file: &str, timeout_ms: u64) -> CliResult<()> {
    let config = AppConfig::from_file(file)?;
    config.validate().map_err(CliError::Config)?;
    let custom = config.rpcs.clone();
    let ctx = AppContext::new(config)?;

    if custom.is_empty() {
        print_info("No custom RPCs configured");
        return Ok(());
    }

    let timeout = Duration::from_millis(timeout_ms);
    let mut successful = 0;
    let mut failed = 0;

    for group in &custom {
        let Some(chain) = ctx.registry.resolve(&group.chain) else { continue };
        let urls: Vec<String> = ctx
            .registry
            .rpcs(&chain.key, group.mode)
            .into_iter()
            .filter(|url| group.urls.contains(url))
            .collect();

        for result in ctx.benchmarker().benchmark(&urls, timeout).await {
            match &result.outcome {
                Ok(block) => {
                    println!(
                        "{} {} {}: [OK] block {block} ({}ms)",
                        chain.key,
                        group.mode,
                        short_host(&result.url),
                        result.latency.as_millis()
                    );
                    successful += 1;
                }
                Err(e) => {
                    let host = short_host(&result.url);
                    println!("{} {} {host}: [ERROR] {e}", chain.key, group.mode);
                    failed += 1;
                }
            }
        }
    }

    println!("\nTest Results:");
    println!("  [SUCCESS] Successful: {successful}");
    println!("  [ERROR] Failed: {failed}");

    if failed > 0 {
        print_error("Some custom RPCs are not responding correctly");
    } else {
        print_success("All custom RPCs are working correctly!");
    }

    Ok(())
}
