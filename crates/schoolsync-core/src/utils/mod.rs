//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{format_date, format_datetime, truncate_string};
