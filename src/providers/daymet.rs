//! Daymet single-pixel extraction: daily surface weather interpolated on a 1 km grid.
//!
//! Native CSV columns: `year,yday,dayl (s),prcp (mm/day),srad (W/m^2),swe (kg/m^2),
//! tmax (deg c),tmin (deg c),vp (Pa)`, preceded by a free-text metadata block.
//! Daymet years have 365 days; Dec 31 of leap years is never served.

use crate::providers::mapping::{
    CanonicalField, Conversion, DateKey, FieldMapping, Preamble, ProviderSchema,
};
use crate::providers::FetchRequest;
use crate::types::provider::Provider;
use chrono::Datelike;

pub const DEFAULT_URL: &str = "https://daymet.ornl.gov/single-pixel/api/data";

const VARIABLES: &str = "dayl,prcp,srad,swe,tmax,tmin,vp";

const FIELDS: &[FieldMapping] = &[
    FieldMapping::new(
        "dayl (s)",
        CanonicalField::DayLength,
        Conversion::Scale(1.0 / 3600.0),
    ),
    FieldMapping::new(
        "prcp (mm/day)",
        CanonicalField::Precipitation,
        Conversion::Identity,
    ),
    // daylight-average W/m² over the daylight seconds
    FieldMapping::new(
        "srad (W/m^2)",
        CanonicalField::Radiation,
        Conversion::ProductWith {
            column: "dayl (s)",
            factor: 1e-6,
        },
    ),
    FieldMapping::new(
        "tmax (deg c)",
        CanonicalField::TempMax,
        Conversion::Identity,
    ),
    FieldMapping::new(
        "tmin (deg c)",
        CanonicalField::TempMin,
        Conversion::Identity,
    ),
    FieldMapping::new(
        "vp (Pa)",
        CanonicalField::VaporPressure,
        Conversion::Scale(1e-3),
    ),
    FieldMapping::new(
        "swe (kg/m^2)",
        CanonicalField::SnowWaterEquivalent,
        Conversion::Identity,
    ),
];

pub(crate) const SCHEMA: ProviderSchema = ProviderSchema {
    provider: Provider::Daymet,
    preamble: Preamble::HeaderStartsWith("year,"),
    date_key: DateKey::YearDay {
        year: "year",
        day: "yday",
    },
    fields: FIELDS,
    fill_value: None,
};

/// Daymet is queried by whole years only.
pub(crate) fn query_params(request: &FetchRequest) -> Vec<(&'static str, String)> {
    let years = (request.start.year()..=request.end.year())
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(",");
    vec![
        ("lat", format!("{:.5}", request.location.0)),
        ("lon", format!("{:.5}", request.location.1)),
        ("vars", VARIABLES.to_string()),
        ("years", years),
    ]
}
