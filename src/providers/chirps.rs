//! CHIRPS satellite-derived daily precipitation, read from point extracts with
//! columns `date,precip` (mm/day).

use crate::providers::mapping::{
    CanonicalField, Conversion, DateKey, FieldMapping, Preamble, ProviderSchema,
};
use crate::types::daily_record::DailyRecord;
use crate::types::provider::Provider;

/// Length of the trailing precipitation index window, in days.
pub const INDEX_WINDOW_DAYS: usize = 30;

const FIELDS: &[FieldMapping] = &[FieldMapping::new(
    "precip",
    CanonicalField::Precipitation,
    Conversion::Identity,
)];

pub(crate) const SCHEMA: ProviderSchema = ProviderSchema {
    provider: Provider::Chirps,
    preamble: Preamble::None,
    date_key: DateKey::Iso { column: "date" },
    fields: FIELDS,
    fill_value: Some(-9999.0),
};

/// Fills `precipitation_30d` with the sum of the current and preceding days.
///
/// `records` must be dense and sorted by date. The index stays absent until a full
/// window is available and whenever a day inside the window is missing.
pub fn trailing_precipitation(records: &mut [DailyRecord], window: usize) {
    if window == 0 {
        return;
    }
    for i in 0..records.len() {
        if i + 1 < window {
            records[i].precipitation_30d = None;
            continue;
        }
        let total = records[i + 1 - window..=i]
            .iter()
            .map(|r| r.precipitation)
            .sum::<Option<f64>>();
        records[i].precipitation_30d = total;
    }
}
