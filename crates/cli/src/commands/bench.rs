use chainscan_core::{
    registry::RpcSource,
    types::{ModeFilter, ScanTarget},
    upstream::{sort_fastest_first, BenchmarkResult},
    utils::clean_error,
};
use futures::future::join_all;
use prettytable::{row, Table};
use std::time::Duration;

use super::{
    context::AppContext,
    utils::{print_info, print_success, short_host, CliError, CliResult},
};

/// Benchmarks every candidate RPC of the selected chains.
///
/// # Errors
///
/// Returns [`CliError::Scan`] when no chain matches the filter.
pub async fn bench(
    ctx: &AppContext,
    chain: Option<String>,
    mode: Option<ModeFilter>,
    timeout_ms: Option<u64>,
) -> CliResult<()> {
    let filter = mode.unwrap_or(ctx.config.scan.mode);
    let names: Vec<String> = chain.into_iter().collect();
    if let Some(name) = names.first() {
        if ctx.registry.resolve(name).is_none() {
            return Err(CliError::Scan(format!("unknown chain: {name}")));
        }
    }

    let targets = ctx.registry.targets(filter, &names);
    if targets.is_empty() {
        return Err(CliError::Scan(format!("no chains support {filter} mode")));
    }

    let timeout = timeout_ms.map_or_else(|| ctx.config.benchmark_timeout(), Duration::from_millis);
    print_info(&format!(
        "Benchmarking {} targets (timeout {}ms)...",
        targets.len(),
        timeout.as_millis()
    ));

    let benchmarker = ctx.benchmarker();
    let runs = targets.iter().map(|target| async move {
        let candidates = ctx.registry.rpcs(&target.chain, target.mode);
        let mut results = benchmarker.benchmark(&candidates, timeout).await;
        sort_fastest_first(&mut results);
        (target, results)
    });
    let reports = join_all(runs).await;

    let mut healthy = 0;
    let mut total = 0;
    for (target, results) in &reports {
        healthy += results.iter().filter(|r| r.is_healthy()).count();
        total += results.len();
        print_target(ctx, target, results);
    }

    print_success(&format!("{healthy}/{total} endpoints healthy"));
    Ok(())
}

fn print_target(ctx: &AppContext, target: &ScanTarget, results: &[BenchmarkResult]) {
    let name = ctx
        .registry
        .get(&target.chain)
        .map_or_else(|| target.chain.to_string(), |chain| chain.name.clone());
    println!("\n{name} ({})", target.mode);

    if results.is_empty() {
        println!("  no endpoints configured");
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["#", "RPC", "Status", "Latency", "Block"]);
    for (rank, result) in results.iter().enumerate() {
        let (status, block) = match &result.outcome {
            Ok(block) => ("✓".to_string(), block.to_string()),
            Err(e) => (
                format!("✗ {}", clean_error(&e.to_string(), ctx.config.scan.error_max_len)),
                String::new(),
            ),
        };
        table.add_row(row![
            rank + 1,
            short_host(&result.url),
            status,
            format!("{}ms", result.latency.as_millis()),
            block
        ]);
    }
    table.printstd();
}
