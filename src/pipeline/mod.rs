//! Pipeline Driver: fetch, derive, cut into intervals and aggregate, per site and per batch.

pub mod config;
pub mod driver;
