use crate::registry::error::RegistryError;
use crate::types::site::{LatLon, Milestone, Site};
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Leading CSV columns, by position: id, crop, name, latitude, longitude, start, end.
/// Every further column is a milestone named by its header.
pub const FIXED_COLUMNS: usize = 7;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// The set of monitored sites, in load order, with unique ids.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct SiteEntry {
    #[serde(default)]
    crop: String,
    #[serde(default)]
    name: String,
    latitude: f64,
    longitude: f64,
    start: NaiveDate,
    end: NaiveDate,
    #[serde(default)]
    milestones: Vec<Milestone>,
}

fn parse_date(value: &str, row: usize) -> Result<NaiveDate, RegistryError> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| RegistryError::InvalidValue {
            row,
            value: value.to_string(),
            what: "date",
        })
}

fn parse_coordinate(value: &str, row: usize) -> Result<f64, RegistryError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| RegistryError::InvalidValue {
            row,
            value: value.to_string(),
            what: "coordinate",
        })
}

impl SiteRegistry {
    /// Builds a registry from already validated sites.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateSite`] if two sites share an id.
    pub fn from_sites(sites: Vec<Site>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(sites.len());
        for (i, site) in sites.iter().enumerate() {
            if index.insert(site.id().to_string(), i).is_some() {
                return Err(RegistryError::DuplicateSite(site.id().to_string()));
            }
        }
        Ok(Self { sites, index })
    }

    /// Loads sites from a delimited file with a header row.
    ///
    /// Columns are positional: the first seven hold the fixed site attributes and
    /// every following column is an ordered milestone whose header is its name.
    /// Empty milestone cells are skipped.
    pub fn from_csv(path: &Path) -> Result<Self, RegistryError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| RegistryError::Csv(path.to_path_buf(), e))?;

        if df.width() < FIXED_COLUMNS {
            return Err(RegistryError::MissingColumns {
                path: path.to_path_buf(),
                expected: FIXED_COLUMNS,
                found: df.width(),
            });
        }

        let columns = df
            .get_columns()
            .iter()
            .map(|c| c.str().map(|s| (c.name().to_string(), s)))
            .collect::<PolarsResult<Vec<_>>>()
            .map_err(|e| RegistryError::Csv(path.to_path_buf(), e))?;

        let mut sites = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            // rows are reported 1-based after the header
            let line = row + 2;
            let cell = |i: usize| columns[i].1.get(row).map(str::trim).unwrap_or("");

            let id = cell(0);
            if id.is_empty() {
                return Err(RegistryError::InvalidValue {
                    row: line,
                    value: String::new(),
                    what: "site id",
                });
            }

            let mut milestones = Vec::new();
            for (i, (name, _)) in columns.iter().enumerate().skip(FIXED_COLUMNS) {
                let value = cell(i);
                if !value.is_empty() {
                    milestones.push(Milestone::new(name.as_str(), parse_date(value, line)?));
                }
            }

            sites.push(
                Site::builder()
                    .id(id)
                    .crop(cell(1))
                    .name(cell(2))
                    .location(LatLon(
                        parse_coordinate(cell(3), line)?,
                        parse_coordinate(cell(4), line)?,
                    ))
                    .start(parse_date(cell(5), line)?)
                    .end(parse_date(cell(6), line)?)
                    .milestones(milestones)
                    .build()?,
            );
        }

        info!("Loaded {} site(s) from {}", sites.len(), path.display());
        Self::from_sites(sites)
    }

    /// Loads sites from a JSON object keyed by site id.
    pub fn from_json(path: &Path) -> Result<Self, RegistryError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| RegistryError::Read(path.to_path_buf(), e))?;
        let entries: BTreeMap<String, SiteEntry> = serde_json::from_str(&text)
            .map_err(|e| RegistryError::Json(path.to_path_buf(), e))?;

        let sites = entries
            .into_iter()
            .map(|(id, entry)| {
                Site::builder()
                    .id(id)
                    .crop(entry.crop)
                    .name(entry.name)
                    .location(LatLon(entry.latitude, entry.longitude))
                    .start(entry.start)
                    .end(entry.end)
                    .milestones(entry.milestones)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("Loaded {} site(s) from {}", sites.len(), path.display());
        Self::from_sites(sites)
    }

    /// Picks the loader from the file extension (`.json`, anything else is CSV).
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(path),
            _ => Self::from_csv(path),
        }
    }

    pub fn get(&self, id: &str) -> Result<&Site, RegistryError> {
        self.index
            .get(id)
            .map(|&i| &self.sites[i])
            .ok_or_else(|| RegistryError::UnknownSite(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl<'a> IntoIterator for &'a SiteRegistry {
    type Item = &'a Site;
    type IntoIter = std::slice::Iter<'a, Site>;

    fn into_iter(self) -> Self::IntoIter {
        self.sites.iter()
    }
}
