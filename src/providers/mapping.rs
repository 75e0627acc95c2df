//! Declarative mapping from a provider's native columns onto canonical fields.
//!
//! Each provider owns one [`ProviderSchema`]: how to find the header, how dates are
//! keyed, and a table of `{native column -> canonical field, conversion}` entries.
//! The table is turned into a single polars `select`, so no positional column
//! assumptions survive past parsing.

use crate::types::provider::Provider;
use polars::prelude::{col, lit, DataType, Expr};

/// Canonical columns produced by a mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    DayLength,
    Precipitation,
    Radiation,
    TempMax,
    TempMin,
    TempMean,
    /// Actual vapour pressure [kPa]; only an input to the deficit estimate.
    VaporPressure,
    VaporPressureDeficit,
    RelativeHumidity,
    SnowWaterEquivalent,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::DayLength,
        CanonicalField::Precipitation,
        CanonicalField::Radiation,
        CanonicalField::TempMax,
        CanonicalField::TempMin,
        CanonicalField::TempMean,
        CanonicalField::VaporPressure,
        CanonicalField::VaporPressureDeficit,
        CanonicalField::RelativeHumidity,
        CanonicalField::SnowWaterEquivalent,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            CanonicalField::DayLength => "day_length",
            CanonicalField::Precipitation => "precipitation",
            CanonicalField::Radiation => "radiation",
            CanonicalField::TempMax => "temp_max",
            CanonicalField::TempMin => "temp_min",
            CanonicalField::TempMean => "temp_mean",
            CanonicalField::VaporPressure => "vapor_pressure",
            CanonicalField::VaporPressureDeficit => "vapor_pressure_deficit",
            CanonicalField::RelativeHumidity => "relative_humidity",
            CanonicalField::SnowWaterEquivalent => "snow_water_equivalent",
        }
    }
}

/// Unit conversion applied to a native column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    Identity,
    /// `value * factor`
    Scale(f64),
    /// `value * other_column * factor`, e.g. W/m² × seconds of daylight → MJ/m².
    ProductWith { column: &'static str, factor: f64 },
}

impl Conversion {
    pub fn expr(&self, source: &str) -> Expr {
        let value = col(source).cast(DataType::Float64);
        match *self {
            Conversion::Identity => value,
            Conversion::Scale(factor) => value * lit(factor),
            Conversion::ProductWith { column, factor } => {
                value * col(column).cast(DataType::Float64) * lit(factor)
            }
        }
    }

    fn extra_column(&self) -> Option<&'static str> {
        match *self {
            Conversion::ProductWith { column, .. } => Some(column),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMapping {
    pub source: &'static str,
    pub target: CanonicalField,
    pub conversion: Conversion,
}

impl FieldMapping {
    pub const fn new(source: &'static str, target: CanonicalField, conversion: Conversion) -> Self {
        Self {
            source,
            target,
            conversion,
        }
    }

    /// Native columns that must all be present for this mapping to apply.
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![self.source];
        columns.extend(self.conversion.extra_column());
        columns
    }

    pub fn expr(&self) -> Expr {
        self.conversion
            .expr(self.source)
            .alias(self.target.column_name())
    }
}

/// How the calendar date of a row is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKey {
    /// Year and day-of-year integer columns.
    YearDay {
        year: &'static str,
        day: &'static str,
    },
    /// A single `YYYY-MM-DD` text column.
    Iso { column: &'static str },
}

impl DateKey {
    pub fn columns(&self) -> Vec<&'static str> {
        match *self {
            DateKey::YearDay { year, day } => vec![year, day],
            DateKey::Iso { column } => vec![column],
        }
    }
}

/// Metadata block in front of the CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preamble {
    None,
    /// The header is the first line starting with this text.
    HeaderStartsWith(&'static str),
    /// The header follows the line equal to this text.
    AfterLine(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct ProviderSchema {
    pub provider: Provider,
    pub preamble: Preamble,
    pub date_key: DateKey,
    pub fields: &'static [FieldMapping],
    /// Sentinel for missing values in the provider's own (identity-mapped) units.
    pub fill_value: Option<f64>,
}

impl ProviderSchema {
    pub fn is_fill(&self, value: f64) -> bool {
        value.is_nan()
            || self
                .fill_value
                .is_some_and(|fill| (value - fill).abs() < 1e-9)
    }
}

pub fn schema_for(provider: Provider) -> &'static ProviderSchema {
    match provider {
        Provider::Daymet => &crate::providers::daymet::SCHEMA,
        Provider::NasaPower => &crate::providers::nasa_power::SCHEMA,
        Provider::Chirps => &crate::providers::chirps::SCHEMA,
    }
}
