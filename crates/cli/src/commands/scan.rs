use chainscan_core::{
    scan::{
        validate_address, BalanceFetcher, BalanceOrdering, BalancePayload, GasPriceFetcher,
        GasPriceOrdering, GasPricePayload, ResultAggregator, RowOrdering, ScanCommand, ScanFetcher,
        ScanOutcome, ScanSession,
    },
    types::{ModeFilter, NetworkMode, ScanTarget},
    upstream::SelectionAlgorithm,
};
use std::{collections::HashMap, io::BufRead, sync::Arc};
use tokio::sync::mpsc;

use super::{
    context::AppContext,
    utils::{print_info, CliError, CliResult},
    view::{BalanceColumn, GasColumn, PayloadColumn, TableSink},
};

const PORTFOLIO_URL: &str = "https://debank.com/profile";
const GAS_TRACKER_URL: &str = "https://etherscan.io/gastracker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Read r/o/q from stdin until quit
    Interactive,
    /// Print the table once every target has reported
    Once,
}

/// Options shared by the balance and gas scans.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub mode: Option<ModeFilter>,
    pub chains: Vec<String>,
    pub algorithm: Option<SelectionAlgorithm>,
    pub interaction: Interaction,
}

/// Maps one line of user input to a command.
pub fn parse_command(line: &str) -> Option<ScanCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "retry" => Some(ScanCommand::Retry),
        "o" | "open" => Some(ScanCommand::Open),
        "q" | "quit" | "exit" => Some(ScanCommand::Quit),
        _ => None,
    }
}

/// Feeds stdin lines into the session's command channel.
///
/// Runs on a plain thread: a blocking read inside the runtime would keep it alive after quit.
fn spawn_stdin_reader(tx: mpsc::Sender<ScanCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(command) = parse_command(&line) else { continue };
            if tx.blocking_send(command).is_err() || command == ScanCommand::Quit {
                break;
            }
        }
    });
}

/// Scan targets for `options`, failing when nothing matches.
fn resolve_targets(
    ctx: &AppContext,
    options: &ScanOptions,
) -> CliResult<(ModeFilter, Vec<ScanTarget>)> {
    let filter = options.mode.unwrap_or(ctx.config.scan.mode);

    for name in &options.chains {
        if ctx.registry.resolve(name).is_none() {
            return Err(CliError::Scan(format!("unknown chain: {name}")));
        }
    }

    let targets = ctx.registry.targets(filter, &options.chains);
    if targets.is_empty() {
        return Err(CliError::Scan(format!("no chains support {filter} mode")));
    }
    Ok((filter, targets))
}

fn build_aggregator<P>(ctx: &AppContext, targets: &[ScanTarget]) -> ResultAggregator<P> {
    let mut aggregator = ResultAggregator::new(ctx.config.scan.error_max_len);
    for target in targets {
        let (name, currency) = ctx
            .registry
            .get(&target.chain)
            .map(|chain| (chain.name.clone(), chain.currency().to_string()))
            .unwrap_or_else(|| (target.chain.to_string(), String::new()));
        aggregator.register(target, &name, &currency);
    }
    aggregator
}

/// USD prices per target. Testnet coins have no market value, so only mainnet targets are priced.
fn mainnet_prices(ctx: &AppContext, targets: &[ScanTarget]) -> HashMap<ScanTarget, f64> {
    targets
        .iter()
        .filter(|target| target.mode == NetworkMode::Mainnet)
        .filter_map(|target| {
            let currency = ctx.registry.get(&target.chain)?.currency().to_string();
            ctx.config.price_for(&currency).map(|price| (target.clone(), price))
        })
        .collect()
}

/// How one scan is presented.
struct ScanView<C> {
    column: C,
    title: String,
    open_url: String,
}

async fn run_session<P, C>(
    ctx: &AppContext,
    options: &ScanOptions,
    aggregator: ResultAggregator<P>,
    fetcher: Arc<dyn ScanFetcher<P>>,
    ordering: Box<dyn RowOrdering<P>>,
    view: ScanView<C>,
) -> ScanOutcome
where
    P: Send + 'static,
    C: PayloadColumn<P>,
{
    let orchestrator = Arc::new(ctx.orchestrator(options.algorithm));
    let interactive = options.interaction == Interaction::Interactive;

    let (tx, rx) = mpsc::channel(16);
    if interactive {
        spawn_stdin_reader(tx);
    } else {
        drop(tx);
    }

    let mut sink = TableSink::new(view.column, view.title, interactive);
    let outcome = ScanSession::new(aggregator, orchestrator, fetcher, ordering)
        .with_open_url(view.open_url)
        .exit_on_complete(!interactive)
        .run(rx, &mut sink)
        .await;
    sink.finish();

    tracing::info!(
        done = outcome.done,
        errors = outcome.errors,
        completed = outcome.completed,
        stale_dropped = outcome.stale_dropped,
        "scan finished"
    );
    outcome
}

/// Native balance of `address` across every selected chain.
///
/// # Errors
///
/// Returns [`CliError::Scan`] for a malformed address or when no chain matches.
pub async fn balance(ctx: &AppContext, address: &str, options: ScanOptions) -> CliResult<()> {
    let address = validate_address(address).map_err(CliError::Scan)?;
    let (filter, targets) = resolve_targets(ctx, &options)?;

    let prices = mainnet_prices(ctx, &targets);
    let fetcher: Arc<dyn ScanFetcher<BalancePayload>> =
        Arc::new(BalanceFetcher::new(Arc::clone(&ctx.client), address.clone()).with_prices(prices));
    let aggregator = build_aggregator(ctx, &targets);

    let view = ScanView {
        column: BalanceColumn,
        title: format!("Balances of {address} ({filter})"),
        open_url: format!("{PORTFOLIO_URL}/{address}"),
    };
    let outcome =
        run_session(ctx, &options, aggregator, fetcher, Box::new(BalanceOrdering), view).await;

    report(&outcome);
    Ok(())
}

/// Current gas price across every selected chain.
///
/// # Errors
///
/// Returns [`CliError::Scan`] when no chain matches.
pub async fn gas(ctx: &AppContext, options: ScanOptions) -> CliResult<()> {
    let (filter, targets) = resolve_targets(ctx, &options)?;

    let fetcher: Arc<dyn ScanFetcher<GasPricePayload>> =
        Arc::new(GasPriceFetcher::new(Arc::clone(&ctx.client)));
    let aggregator = build_aggregator(ctx, &targets);

    let view = ScanView {
        column: GasColumn,
        title: format!("Gas prices ({filter})"),
        open_url: GAS_TRACKER_URL.to_string(),
    };
    let outcome =
        run_session(ctx, &options, aggregator, fetcher, Box::new(GasPriceOrdering), view).await;

    report(&outcome);
    Ok(())
}

fn report(outcome: &ScanOutcome) {
    if !outcome.completed {
        print_info(&format!(
            "left with {} done, {} failed, rest in flight",
            outcome.done, outcome.errors
        ));
    } else if outcome.errors > 0 {
        print_info(&format!("{} targets failed; run again or press r to retry", outcome.errors));
    }
}
