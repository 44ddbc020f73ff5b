use chainscan_core::{
    registry::RpcSource,
    types::NetworkMode,
    upstream::SelectionAlgorithm,
    utils::clean_error,
};
use prettytable::{row, Table};
use tokio::time::Instant;

use super::{
    context::AppContext,
    utils::{print_info, short_host, CliError, CliResult},
};

/// Runs endpoint selection `count` times for one chain and shows what each call picked.
///
/// Useful to watch round-robin rotation and failover memory in action.
///
/// # Errors
///
/// Returns [`CliError::Scan`] for an unknown chain or a network the chain lacks.
pub async fn select(
    ctx: &AppContext,
    chain: &str,
    mode: NetworkMode,
    algorithm: Option<SelectionAlgorithm>,
    count: usize,
) -> CliResult<()> {
    let info = ctx
        .registry
        .resolve(chain)
        .ok_or_else(|| CliError::Scan(format!("unknown chain: {chain}")))?;
    if info.network(mode).is_none() {
        return Err(CliError::Scan(format!("{} has no {mode} network", info.name)));
    }

    let algorithm = algorithm.unwrap_or(ctx.config.selection.algorithm);
    let candidates = ctx.registry.rpcs(&info.key, mode);
    print_info(&format!(
        "Selecting {count}x on {} {mode} with {algorithm} over {} candidates",
        info.name,
        candidates.len()
    ));

    let mut table = Table::new();
    table.add_row(row!["Call", "Selected", "Took", "Cooling down"]);

    for call in 1..=count {
        let started = Instant::now();
        let outcome = ctx
            .selector
            .select(&info.key, &candidates, algorithm, ctx.config.benchmark_timeout())
            .await;
        let took = format!("{}ms", started.elapsed().as_millis());

        let cooling = candidates.iter().filter(|url| ctx.selector.is_cooling_down(url)).count();
        match outcome {
            Ok(url) => table.add_row(row![call, short_host(&url), took, cooling]),
            Err(e) => table.add_row(row![
                call,
                format!("✗ {}", clean_error(&e.to_string(), ctx.config.scan.error_max_len)),
                took,
                cooling
            ]),
        };
    }

    table.printstd();
    Ok(())
}
