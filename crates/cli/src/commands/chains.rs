use chainscan_core::{registry::RpcSource, types::ModeFilter};
use prettytable::{row, Table};

use super::{context::AppContext, utils::CliResult};

/// Lists the known chains with their chain ids and candidate counts.
pub fn list_chains(ctx: &AppContext, mode: ModeFilter) -> CliResult<()> {
    let mut table = Table::new();
    table.add_row(row!["Key", "Name", "Network", "Chain ID", "Currency", "RPCs", "Explorer"]);

    for chain in ctx.registry.chains(mode, &[]) {
        for network_mode in mode.modes() {
            let Some(network) = chain.network(*network_mode) else { continue };
            let rpcs = ctx.registry.rpcs(&chain.key, *network_mode).len();
            table.add_row(row![
                chain.key,
                network.name,
                network_mode.as_str(),
                network.chain_id,
                network.currency,
                rpcs,
                network.explorer_url
            ]);
        }
    }

    table.printstd();
    Ok(())
}

