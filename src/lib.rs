//! Daily agro-climate retrieval and interval summaries for georeferenced field sites.
//!
//! Provider payloads are normalized into canonical [`DailyRecord`]s, enriched with
//! agronomic indices, cut into [`Interval`]s and reduced to one [`SummaryRow`] per
//! interval.

mod aggregate;
mod derive;
mod error;
mod export;
mod intervals;
mod pipeline;
mod providers;
mod registry;
mod types;
mod utils;

pub use error::{AgroClimError, DataValidityError};

pub use types::daily_record::{DailyRecord, DerivedFields};
pub use types::interval::Interval;
pub use types::period::{year_span, Month, Year};
pub use types::provider::Provider;
pub use types::site::{LatLon, Milestone, Site};
pub use types::summary::SummaryRow;

pub use registry::error::RegistryError;
pub use registry::site_registry::SiteRegistry;

pub use providers::adapter::{finalize_series, normalize, ProviderAdapter};
pub use providers::cached::CachedFetcher;
pub use providers::error::ProviderFetchError;
pub use providers::file::FileFetcher;
pub use providers::http::HttpFetcher;
pub use providers::mapping::{
    schema_for, CanonicalField, Conversion, DateKey, FieldMapping, Preamble, ProviderSchema,
};
pub use providers::payload::{csv_to_dataframe, parse_payload, strip_preamble};
pub use providers::{FetchRequest, RawFetch};

pub use derive::engine::{check_temperature_order, derive_fields, enrich, Enrichment};
pub use derive::indices::*;
pub use derive::solar::*;

pub use intervals::strategy::{even_breakpoints, ordinal_label, IntervalStrategy};

pub use aggregate::aggregator::{aggregate, summarize, Aggregation, Reduction};
pub use aggregate::shannon::{evenness, shannon_index};

pub use export::error::ExportError;
pub use export::table::{
    daily_frame, read_summary_csv, summary_frame, write_daily_csv, write_manifest,
    write_summary_csv,
};

pub use pipeline::config::{PipelineConfig, StrategyKind};
pub use pipeline::driver::{BatchResult, Manifest, Pipeline, SiteOutput, SiteStatus};

pub use utils::get_cache_dir;
