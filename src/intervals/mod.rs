//! Interval generator: partitions a site's timeline into named windows.

pub mod strategy;
