use chrono::NaiveDate;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Site {site} has invalid coordinates (lat {lat}, lon {lon})")]
    InvalidCoordinates { site: String, lat: f64, lon: f64 },

    #[error("Site {site} starts on {start}, after its end date {end}")]
    InvalidSeason {
        site: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Milestone '{milestone}' ({date}) of site {site} precedes the milestone before it")]
    UnorderedMilestones {
        site: String,
        milestone: String,
        date: NaiveDate,
    },

    #[error("Milestone '{milestone}' ({date}) of site {site} lies outside its season {start} to {end}")]
    MilestoneOutsideSeason {
        site: String,
        milestone: String,
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Site id '{0}' appears more than once")]
    DuplicateSite(String),

    #[error("Unknown site '{0}'")]
    UnknownSite(String),

    #[error("Site registry '{path}' needs at least {expected} columns, found {found}")]
    MissingColumns {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Row {row}: cannot parse '{value}' as {what}")]
    InvalidValue {
        row: usize,
        value: String,
        what: &'static str,
    },

    #[error("Failed to read site registry '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse site registry CSV '{0}'")]
    Csv(PathBuf, #[source] PolarsError),

    #[error("Failed to parse site registry JSON '{0}'")]
    Json(PathBuf, #[source] serde_json::Error),
}
