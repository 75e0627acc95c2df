//! Provider Adapter: raw fetch capabilities and normalization onto [`crate::DailyRecord`].

pub mod adapter;
pub mod cached;
pub mod chirps;
pub mod daymet;
pub mod error;
pub mod file;
pub mod http;
pub mod mapping;
pub mod nasa_power;
pub mod payload;

use crate::providers::error::ProviderFetchError;
use crate::types::provider::Provider;
use crate::types::site::LatLon;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::future::Future;

/// A raw request for one site, already widened to whole calendar years.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub provider: Provider,
    pub site_id: String,
    pub location: LatLon,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Anything able to produce a provider-native table for a site and date range.
///
/// Implementations return the provider's own columns; mapping onto canonical fields
/// happens in [`adapter::ProviderAdapter`].
pub trait RawFetch: Send + Sync {
    fn raw_fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<DataFrame, ProviderFetchError>> + Send;
}

impl<T: RawFetch> RawFetch for std::sync::Arc<T> {
    fn raw_fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<DataFrame, ProviderFetchError>> + Send {
        (**self).raw_fetch(request)
    }
}
