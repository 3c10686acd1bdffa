//! Utility functions for display formatting.

pub mod format;

pub use format::{format_price, format_rating, format_stock, page_summary, truncate_string};
