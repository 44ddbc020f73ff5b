//! Small helpers shared by the client, fetchers and aggregator.
//!
//! - [`quantity`]: `0x` quantity parsing and wei/gwei/ether formatting
//! - [`error_text`]: cleaning and truncating error strings for a live multi-row table

pub mod error_text;
pub mod quantity;

pub use error_text::clean_error;
pub use quantity::{
    format_ether, format_gwei, parse_quantity_u128, parse_quantity_u64, wei_to_ether_f64,
};
