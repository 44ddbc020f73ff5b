pub mod bench;
pub mod chains;
pub mod config;
pub mod context;
pub mod scan;
pub mod select;
pub mod utils;
pub mod view;

pub use bench::bench;
pub use chains::list_chains;
pub use config::{handle_config_command, ConfigCommands};
pub use context::AppContext;
pub use scan::{balance, gas, Interaction, ScanOptions};
pub use select::select;
