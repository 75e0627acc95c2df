//! Aggregator: reduces enriched daily records to one summary row per interval.

pub mod aggregator;
pub mod shannon;
