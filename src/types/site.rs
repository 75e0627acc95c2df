//! Defines the monitored field sites: identity, location, season bounds and
//! the ordered crop milestones used by the milestone interval strategy.

use crate::registry::error::RegistryError;
use bon::bon;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use agroclim::LatLon;
///
/// let arlington = LatLon(43.3091, -89.3473);
/// assert_eq!(arlington.0, 43.3091); // Latitude
/// assert_eq!(arlington.1, -89.3473); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.0) && (-180.0..=180.0).contains(&self.1)
    }
}

/// A named crop development stage (e.g. "V6", "R1") observed at a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub date: NaiveDate,
}

impl Milestone {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }
}

/// A monitored location and the season of interest.
///
/// Sites are validated on construction and immutable afterwards. The season is
/// the inclusive range `[start, end]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    id: String,
    crop: String,
    name: String,
    location: LatLon,
    start: NaiveDate,
    end: NaiveDate,
    milestones: Vec<Milestone>,
}

#[bon]
impl Site {
    /// Builds a validated site.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::InvalidCoordinates`] if latitude is outside `[-90, 90]` or
    ///   longitude outside `[-180, 180]`.
    /// * [`RegistryError::InvalidSeason`] if `start` is after `end`.
    /// * [`RegistryError::UnorderedMilestones`] if a milestone precedes the one before it.
    ///
    /// # Example
    ///
    /// ```
    /// use agroclim::{LatLon, Milestone, Site};
    /// use chrono::NaiveDate;
    ///
    /// let site = Site::builder()
    ///     .id("ARL-2018")
    ///     .crop("maize")
    ///     .name("Arlington")
    ///     .location(LatLon(43.3091, -89.3473))
    ///     .start(NaiveDate::from_ymd_opt(2018, 5, 1).unwrap())
    ///     .end(NaiveDate::from_ymd_opt(2018, 10, 30).unwrap())
    ///     .milestones(vec![Milestone::new("V6", NaiveDate::from_ymd_opt(2018, 6, 15).unwrap())])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(site.milestones().len(), 1);
    /// ```
    #[builder]
    pub fn new(
        #[builder(into)] id: String,
        #[builder(into, default)] crop: String,
        #[builder(into, default)] name: String,
        location: LatLon,
        start: NaiveDate,
        end: NaiveDate,
        #[builder(default)] milestones: Vec<Milestone>,
    ) -> Result<Self, RegistryError> {
        if !location.is_valid() {
            return Err(RegistryError::InvalidCoordinates {
                site: id,
                lat: location.0,
                lon: location.1,
            });
        }
        if start > end {
            return Err(RegistryError::InvalidSeason {
                site: id,
                start,
                end,
            });
        }
        if let Some(m) = milestones.iter().find(|m| m.date < start || m.date > end) {
            return Err(RegistryError::MilestoneOutsideSeason {
                site: id,
                milestone: m.name.clone(),
                date: m.date,
                start,
                end,
            });
        }
        if let Some(pair) = milestones.windows(2).find(|w| w[1].date < w[0].date) {
            return Err(RegistryError::UnorderedMilestones {
                site: id,
                milestone: pair[1].name.clone(),
                date: pair[1].date,
            });
        }
        Ok(Self {
            id,
            crop,
            name,
            location,
            start,
            end,
            milestones,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn crop(&self) -> &str {
        &self.crop
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> LatLon {
        self.location
    }

    pub fn latitude(&self) -> f64 {
        self.location.0
    }

    pub fn longitude(&self) -> f64 {
        self.location.1
    }

    pub fn latitude_radians(&self) -> f64 {
        self.location.0.to_radians()
    }

    /// First day of the season (inclusive).
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the season (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Exclusive upper bound of the season, i.e. the day after [`Site::end`].
    pub fn season_end_exclusive(&self) -> NaiveDate {
        self.end.checked_add_days(Days::new(1)).unwrap_or(self.end)
    }

    /// First day to fetch when `lookback_days` of history before planting are wanted.
    pub fn lookback_start(&self, lookback_days: u32) -> NaiveDate {
        self.start
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .unwrap_or(self.start)
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }
}
