//! Defines the upstream climate-data providers and the capabilities that decide
//! how their data flows through derivation and aggregation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An upstream source of daily weather.
///
/// Each provider has its own native schema. The adapter maps it onto the canonical
/// [`crate::DailyRecord`] and the aggregator picks a [`crate::Reduction`] from
/// [`Provider::reduction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    /// Grid-interpolated daily surface weather (1 km tiles), served per calendar year.
    Daymet,
    /// Reanalysis-based daily point weather from the agroclimatology community.
    NasaPower,
    /// Satellite-derived daily precipitation. No temperature or radiation.
    Chirps,
}

impl Provider {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Provider::Daymet => "daymet",
            Provider::NasaPower => "nasa-power",
            Provider::Chirps => "chirps",
        }
    }

    pub(crate) fn cache_file_prefix(&self) -> String {
        format!("{}-", self.path_segment())
    }

    /// Whether the provider supplies temperature and radiation.
    pub fn has_temperature(&self) -> bool {
        !matches!(self, Provider::Chirps)
    }

    /// The aggregation variant that matches the fields this provider supplies.
    pub fn reduction(&self) -> crate::Reduction {
        if self.has_temperature() {
            crate::Reduction::Full
        } else {
            crate::Reduction::PrecipitationOnly
        }
    }

    /// Whether the adapter computes the trailing 30-day precipitation index.
    pub(crate) fn computes_precipitation_index(&self) -> bool {
        matches!(self, Provider::Chirps)
    }
}

/// Allows formatting a `Provider` variant using its `path_segment`.
///
/// # Examples
///
/// ```
/// use agroclim::Provider;
///
/// assert_eq!(Provider::NasaPower.to_string(), "nasa-power");
/// assert_eq!(format!("{}", Provider::Daymet), "daymet");
/// ```
impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "daymet" => Ok(Provider::Daymet),
            "nasa-power" | "power" => Ok(Provider::NasaPower),
            "chirps" => Ok(Provider::Chirps),
            other => Err(format!(
                "unknown provider '{other}' (expected daymet, nasa-power or chirps)"
            )),
        }
    }
}
