use crate::export::error::ExportError;
use crate::providers::error::ProviderFetchError;
use crate::registry::error::RegistryError;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgroClimError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Fetch(#[from] ProviderFetchError),

    #[error(transparent)]
    Validity(#[from] DataValidityError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Failed to read configuration '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration '{0}'")]
    ConfigParse(PathBuf, #[source] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,
}

/// A record or interval that cannot produce a physically meaningful value.
///
/// Raised where the computation happens and always carries the site and the
/// offending date or interval label.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataValidityError {
    #[error("Tmax ({tmax} °C) is below Tmin ({tmin} °C) for site {site} on {date}; evapotranspiration is undefined")]
    TemperatureInversion {
        site: String,
        date: NaiveDate,
        tmax: f64,
        tmin: f64,
    },

    #[error("Temperatures out of order for site {site} on {date}: expected Tmin ({tmin}) <= Tmean ({tmean}) <= Tmax ({tmax})")]
    TemperatureOrder {
        site: String,
        date: NaiveDate,
        tmin: f64,
        tmean: f64,
        tmax: f64,
    },

    #[error("Precipitation evenness is undefined for interval '{label}' of site {site}: {days} day(s), at least 2 required")]
    UndefinedEvenness {
        site: String,
        label: String,
        days: usize,
    },
}

impl DataValidityError {
    pub fn site(&self) -> &str {
        match self {
            DataValidityError::TemperatureInversion { site, .. }
            | DataValidityError::TemperatureOrder { site, .. }
            | DataValidityError::UndefinedEvenness { site, .. } => site,
        }
    }
}
