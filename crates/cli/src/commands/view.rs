//! Live table rendering for scan sessions.

use chainscan_core::scan::{
    BalancePayload, GasPricePayload, PresentationSink, ResultAggregator, RowStatus, ScanRow, SubRow,
};
use prettytable::{row, Table};
use std::{
    io::{IsTerminal, Write},
    process::Command,
};

use super::utils::short_host;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Formats the value column of a scan table.
pub trait PayloadColumn<P> {
    fn header(&self) -> &'static str;
    fn value(&self, payload: &P, currency: &str) -> String;
}

pub struct BalanceColumn;

impl PayloadColumn<BalancePayload> for BalanceColumn {
    fn header(&self) -> &'static str {
        "Balance"
    }

    fn value(&self, payload: &BalancePayload, currency: &str) -> String {
        match payload.usd {
            Some(usd) => format!("{} {currency} (${usd:.2})", payload.native()),
            None => format!("{} {currency}", payload.native()),
        }
    }
}

pub struct GasColumn;

impl PayloadColumn<GasPricePayload> for GasColumn {
    fn header(&self) -> &'static str {
        "Gas Price"
    }

    fn value(&self, payload: &GasPricePayload, _currency: &str) -> String {
        format!("{} gwei", payload.gwei())
    }
}

fn status_glyph(status: RowStatus) -> &'static str {
    match status {
        RowStatus::Fetching => "…",
        RowStatus::Done => "✓",
        RowStatus::Error => "✗",
    }
}

fn cell<P>(column: &dyn PayloadColumn<P>, row: &ScanRow<P>, sub: &SubRow<P>) -> String {
    match sub.status {
        RowStatus::Fetching => "fetching…".to_string(),
        RowStatus::Done => sub
            .payload
            .as_ref()
            .map(|payload| column.value(payload, &row.currency))
            .unwrap_or_default(),
        RowStatus::Error => sub.error.clone().unwrap_or_default(),
    }
}

/// Builds the table for the current aggregator state.
pub fn build_table<P>(column: &dyn PayloadColumn<P>, view: &ResultAggregator<P>) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Chain", "Status", "Network", column.header(), "Latency", "RPC"]);

    for scan_row in view.rows() {
        let combined = scan_row.combined_status().label(scan_row.is_dual());
        for (index, (mode, sub)) in scan_row.sub_rows().enumerate() {
            let (name, status) = if index == 0 {
                (scan_row.display_name.as_str(), combined)
            } else {
                ("", "")
            };
            let latency = match (sub.status, sub.latency) {
                (RowStatus::Fetching, _) | (_, None) => String::new(),
                (_, Some(latency)) => format!("{}ms", latency.as_millis()),
            };
            let rpc = sub.endpoint.as_deref().map(short_host).unwrap_or_default();

            table.add_row(row![
                name,
                status,
                format!("{} {mode}", status_glyph(sub.status)),
                cell(column, scan_row, sub),
                latency,
                rpc
            ]);
        }
    }

    table
}

/// Presentation sink drawing a prettytable view.
///
/// On a terminal the table is redrawn in place after every change; otherwise only the final
/// frame is kept and printed once the session ends.
pub struct TableSink<C> {
    column: C,
    title: String,
    interactive: bool,
    live: bool,
    status: Option<String>,
    last_frame: String,
}

impl<C> TableSink<C> {
    pub fn new(column: C, title: impl Into<String>, interactive: bool) -> Self {
        Self {
            column,
            title: title.into(),
            interactive,
            live: std::io::stdout().is_terminal(),
            status: None,
            last_frame: String::new(),
        }
    }

    /// Prints the last frame when the table was not drawn live.
    pub fn finish(&self) {
        if !self.live {
            print!("{}", self.last_frame);
        }
    }

    fn frame<P>(&self, table: &Table, view: &ResultAggregator<P>) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{}  [{}/{} done, {} errors]  updated {}\n",
            self.title,
            view.done_count(),
            view.total_expected(),
            view.error_count(),
            chrono::Local::now().format("%H:%M:%S"),
        ));
        out.push_str(&table.to_string());
        if let Some(status) = &self.status {
            out.push_str(&format!("{status}\n"));
        }
        if self.interactive {
            out.push_str("[r] retry failed  [o] open explorer  [q] quit  (press Enter)\n");
        }
        out
    }
}

impl<P, C> PresentationSink<P> for TableSink<C>
where
    C: PayloadColumn<P>,
{
    fn render(&mut self, view: &ResultAggregator<P>) {
        let table = build_table(&self.column, view);
        self.last_frame = self.frame(&table, view);

        if self.live {
            let mut stdout = std::io::stdout().lock();
            let _ = write!(stdout, "{CLEAR_SCREEN}{}", self.last_frame);
            let _ = stdout.flush();
        }
    }

    fn status(&mut self, message: &str) {
        tracing::debug!(status = message, "scan status");
        self.status = Some(message.to_string());
    }

    fn open(&mut self, url: &str) {
        match open_in_browser(url) {
            Ok(()) => self.status = Some(format!("opened {url}")),
            Err(e) => self.status = Some(format!("could not open {url}: {e}")),
        }
    }
}

/// Opens a URL with the platform's default handler.
fn open_in_browser(url: &str) -> std::io::Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };

    command.arg(url).spawn().map(|_| ())
}
