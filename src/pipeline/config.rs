use crate::derive::indices::Thresholds;
use crate::error::AgroClimError;
use crate::intervals::strategy::IntervalStrategy;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Interval strategy selector as it appears in configuration and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    FullSeason,
    Even,
    Milestones,
    CalendarYear,
    CalendarMonth,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::FullSeason => "full_season",
            StrategyKind::Even => "even",
            StrategyKind::Milestones => "milestones",
            StrategyKind::CalendarYear => "calendar_year",
            StrategyKind::CalendarMonth => "calendar_month",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "full_season" | "season" => Ok(StrategyKind::FullSeason),
            "even" => Ok(StrategyKind::Even),
            "milestones" | "custom" => Ok(StrategyKind::Milestones),
            "calendar_year" | "year" => Ok(StrategyKind::CalendarYear),
            "calendar_month" | "month" => Ok(StrategyKind::CalendarMonth),
            other => Err(format!(
                "unknown interval strategy '{other}' (expected full_season, even, milestones, calendar_year or calendar_month)"
            )),
        }
    }
}

/// Run configuration of the pipeline driver.
///
/// Every field has a default, so a JSON file only needs the values it changes.
///
/// ```
/// use agroclim::{PipelineConfig, StrategyKind};
///
/// let config = PipelineConfig::builder()
///     .strategy(StrategyKind::Even)
///     .even_intervals(6)
///     .lookback_days(30)
///     .build();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct PipelineConfig {
    /// Days before planting fetched and summarized as the lookback interval.
    #[builder(default)]
    pub lookback_days: u32,
    #[builder(default)]
    pub strategy: StrategyKind,
    #[builder(default = 4)]
    pub even_intervals: usize,
    /// Sites fetched at the same time.
    #[builder(default = 4)]
    pub concurrency: usize,
    #[builder(default = 120)]
    pub fetch_timeout_secs: u64,
    /// Fail a site on its first validity issue instead of collecting issues.
    #[builder(default)]
    pub strict: bool,
    #[builder(default)]
    pub thresholds: Thresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PipelineConfig {
    /// Loads and validates a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, AgroClimError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AgroClimError::ConfigRead(path.to_path_buf(), e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| AgroClimError::ConfigParse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects counts that cannot drive a run.
    pub fn validate(&self) -> Result<(), AgroClimError> {
        if self.even_intervals == 0 {
            return Err(AgroClimError::InvalidConfig(
                "even_intervals must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(AgroClimError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval_strategy(&self) -> IntervalStrategy {
        match self.strategy {
            StrategyKind::FullSeason => IntervalStrategy::FullSeason,
            StrategyKind::Even => IntervalStrategy::Even {
                count: self.even_intervals,
            },
            StrategyKind::Milestones => IntervalStrategy::Milestones,
            StrategyKind::CalendarYear => IntervalStrategy::CalendarYear,
            StrategyKind::CalendarMonth => IntervalStrategy::CalendarMonth,
        }
    }
}
