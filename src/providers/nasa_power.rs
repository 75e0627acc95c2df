//! NASA POWER daily point API (agroclimatology community).
//!
//! Native CSV columns: `YEAR,DOY,T2M,T2M_MAX,T2M_MIN,PRECTOTCORR,ALLSKY_SFC_SW_DWN,RH2M`
//! after a `-BEGIN HEADER-` ... `-END HEADER-` block. Radiation is already MJ/m²/day for
//! the AG community; missing values are `-999`.

use crate::providers::mapping::{
    CanonicalField, Conversion, DateKey, FieldMapping, Preamble, ProviderSchema,
};
use crate::providers::FetchRequest;
use crate::types::provider::Provider;

pub const DEFAULT_URL: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";

const PARAMETERS: &str = "T2M,T2M_MAX,T2M_MIN,PRECTOTCORR,ALLSKY_SFC_SW_DWN,RH2M";

const FIELDS: &[FieldMapping] = &[
    FieldMapping::new("T2M", CanonicalField::TempMean, Conversion::Identity),
    FieldMapping::new("T2M_MAX", CanonicalField::TempMax, Conversion::Identity),
    FieldMapping::new("T2M_MIN", CanonicalField::TempMin, Conversion::Identity),
    FieldMapping::new(
        "PRECTOTCORR",
        CanonicalField::Precipitation,
        Conversion::Identity,
    ),
    FieldMapping::new(
        "ALLSKY_SFC_SW_DWN",
        CanonicalField::Radiation,
        Conversion::Identity,
    ),
    FieldMapping::new(
        "RH2M",
        CanonicalField::RelativeHumidity,
        Conversion::Identity,
    ),
];

pub(crate) const SCHEMA: ProviderSchema = ProviderSchema {
    provider: Provider::NasaPower,
    preamble: Preamble::AfterLine("-END HEADER-"),
    date_key: DateKey::YearDay {
        year: "YEAR",
        day: "DOY",
    },
    fields: FIELDS,
    fill_value: Some(-999.0),
};

pub(crate) fn query_params(request: &FetchRequest) -> Vec<(&'static str, String)> {
    vec![
        ("parameters", PARAMETERS.to_string()),
        ("community", "AG".to_string()),
        ("longitude", format!("{:.4}", request.location.1)),
        ("latitude", format!("{:.4}", request.location.0)),
        ("start", request.start.format("%Y%m%d").to_string()),
        ("end", request.end.format("%Y%m%d").to_string()),
        ("format", "CSV".to_string()),
    ]
}
