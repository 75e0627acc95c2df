use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One day of canonical weather for one site.
///
/// Every weather field is optional: a value the provider cannot supply stays `None`
/// and is never replaced by zero.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DailyRecord {
    pub site_id: String,
    pub date: NaiveDate,
    pub day_length: Option<f64>,             // hours
    pub precipitation: Option<f64>,          // mm
    pub radiation: Option<f64>,              // MJ/m²/day
    pub temp_max: Option<f64>,               // °C
    pub temp_min: Option<f64>,               // °C
    pub temp_mean: Option<f64>,              // °C
    pub vapor_pressure_deficit: Option<f64>, // kPa
    pub relative_humidity: Option<f64>,      // %
    pub snow_water_equivalent: Option<f64>,  // kg/m²
    pub precipitation_30d: Option<f64>,      // mm, trailing 30-day sum
    pub derived: Option<DerivedFields>,
}

/// Quantities attached by the derived-variable engine.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct DerivedFields {
    pub et0: Option<f64>,                  // mm/day
    pub extreme_precipitation: Option<u8>, // 0/1
    pub extreme_temperature: Option<u8>,   // 0/1
    pub crop_heat_units: Option<f64>,
    pub growing_degree_units: Option<f64>,
}

impl DailyRecord {
    /// A record for `date` with every measurement absent.
    pub fn empty(site_id: &str, date: NaiveDate) -> Self {
        Self {
            site_id: site_id.to_string(),
            date,
            day_length: None,
            precipitation: None,
            radiation: None,
            temp_max: None,
            temp_min: None,
            temp_mean: None,
            vapor_pressure_deficit: None,
            relative_humidity: None,
            snow_water_equivalent: None,
            precipitation_30d: None,
            derived: None,
        }
    }

    /// Whether the provider supplied any measured quantity for this day.
    pub fn has_observations(&self) -> bool {
        [
            self.precipitation,
            self.radiation,
            self.temp_max,
            self.temp_min,
            self.temp_mean,
            self.relative_humidity,
            self.snow_water_equivalent,
        ]
        .iter()
        .any(Option::is_some)
    }

    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn et0(&self) -> Option<f64> {
        self.derived.as_ref().and_then(|d| d.et0)
    }

    pub fn extreme_precipitation(&self) -> Option<u8> {
        self.derived.as_ref().and_then(|d| d.extreme_precipitation)
    }

    pub fn extreme_temperature(&self) -> Option<u8> {
        self.derived.as_ref().and_then(|d| d.extreme_temperature)
    }

    pub fn crop_heat_units(&self) -> Option<f64> {
        self.derived.as_ref().and_then(|d| d.crop_heat_units)
    }

    pub fn growing_degree_units(&self) -> Option<f64> {
        self.derived.as_ref().and_then(|d| d.growing_degree_units)
    }
}
