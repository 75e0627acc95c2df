use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reduction of one interval's daily records.
///
/// Temperature and radiation based fields are `None` for precipitation-only
/// providers. `sdi` and `awdr` are `None` when the evenness index is undefined
/// (one day or fewer); the aggregator reports that case separately.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub site_id: String,
    pub label: String,
    pub name: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate, // exclusive
    pub duration: u32,
    pub precipitation: Option<f64>,
    pub temp_mean: Option<f64>,
    pub radiation: Option<f64>,
    pub vapor_pressure_deficit: Option<f64>,
    pub et0: Option<f64>,
    pub extreme_precipitation_days: Option<u32>,
    pub extreme_temperature_days: Option<u32>,
    pub crop_heat_units: Option<f64>,
    pub growing_degree_days: Option<f64>,
    pub sdi: Option<f64>,
    pub awdr: Option<f64>,
    pub q_chu: Option<f64>, // radiation per crop heat unit
    pub q_gdd: Option<f64>, // radiation per growing degree day
}
