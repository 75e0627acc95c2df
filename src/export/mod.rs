//! Flat delimited export of summary and daily tables, and the batch manifest.

pub mod error;
pub mod table;
