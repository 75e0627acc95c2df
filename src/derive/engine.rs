use crate::derive::indices::{
    crop_heat_units, extreme_precipitation, extreme_temperature, growing_degree_units,
    hargreaves_et0, Thresholds,
};
use crate::derive::solar::extraterrestrial_radiation;
use crate::error::DataValidityError;
use crate::types::daily_record::{DailyRecord, DerivedFields};
use crate::types::site::Site;
use log::{debug, warn};

/// Enriched records plus every validity problem met while deriving them.
#[derive(Debug, Default)]
pub struct Enrichment {
    pub records: Vec<DailyRecord>,
    pub issues: Vec<DataValidityError>,
}

/// Derives every field that the record's inputs allow.
///
/// Fields whose inputs are absent stay `None`. When `Tmax < Tmin` the evapotranspiration
/// is left empty and the inversion is returned next to the other fields.
pub fn derive_fields_lenient(
    record: &DailyRecord,
    latitude_rad: f64,
    thresholds: &Thresholds,
) -> (DerivedFields, Option<DataValidityError>) {
    let mut issue = None;

    let et0 = match (record.temp_max, record.temp_min, record.temp_mean) {
        (Some(tmax), Some(tmin), Some(tmean)) => {
            let ra = extraterrestrial_radiation(latitude_rad, record.day_of_year());
            let et0 = hargreaves_et0(ra, tmax, tmin, tmean, thresholds.krs);
            if et0.is_none() {
                issue = Some(DataValidityError::TemperatureInversion {
                    site: record.site_id.clone(),
                    date: record.date,
                    tmax,
                    tmin,
                });
            }
            et0
        }
        _ => None,
    };

    let (chu, gdu) = match (record.temp_max, record.temp_min) {
        (Some(tmax), Some(tmin)) => (
            Some(crop_heat_units(tmax, tmin, thresholds)),
            Some(growing_degree_units(tmax, tmin, thresholds)),
        ),
        _ => (None, None),
    };

    let derived = DerivedFields {
        et0,
        extreme_precipitation: record
            .precipitation
            .map(|pp| extreme_precipitation(pp, thresholds)),
        extreme_temperature: record
            .temp_max
            .map(|tmax| extreme_temperature(tmax, thresholds)),
        crop_heat_units: chu,
        growing_degree_units: gdu,
    };
    (derived, issue)
}

/// Derives every field of a single record, failing on impossible temperatures.
///
/// # Errors
///
/// Returns [`DataValidityError::TemperatureInversion`] when Tmax is below Tmin.
pub fn derive_fields(
    record: &DailyRecord,
    latitude_rad: f64,
    thresholds: &Thresholds,
) -> Result<DerivedFields, DataValidityError> {
    match derive_fields_lenient(record, latitude_rad, thresholds) {
        (_, Some(issue)) => Err(issue),
        (derived, None) => Ok(derived),
    }
}

/// Flags a record whose temperatures violate `Tmin <= Tmean <= Tmax`.
pub fn check_temperature_order(record: &DailyRecord) -> Option<DataValidityError> {
    let (Some(tmin), Some(tmean), Some(tmax)) =
        (record.temp_min, record.temp_mean, record.temp_max)
    else {
        return None;
    };
    if tmin <= tmean && tmean <= tmax {
        return None;
    }
    Some(DataValidityError::TemperatureOrder {
        site: record.site_id.clone(),
        date: record.date,
        tmin,
        tmean,
        tmax,
    })
}

/// Attaches derived fields to every record of one site.
///
/// Records keep their order; failures are collected per date and never drop a record.
pub fn enrich(site: &Site, records: Vec<DailyRecord>, thresholds: &Thresholds) -> Enrichment {
    let latitude_rad = site.latitude_radians();
    let mut issues = Vec::new();

    let records = records
        .into_iter()
        .map(|mut record| {
            if let Some(issue) = check_temperature_order(&record) {
                issues.push(issue);
            }
            let (derived, issue) = derive_fields_lenient(&record, latitude_rad, thresholds);
            if let Some(issue) = issue {
                issues.push(issue);
            }
            record.derived = Some(derived);
            record
        })
        .collect::<Vec<_>>();

    if issues.is_empty() {
        debug!("Derived fields for {} records of site {}", records.len(), site.id());
    } else {
        warn!(
            "Derived fields for {} records of site {} with {} validity issue(s)",
            records.len(),
            site.id(),
            issues.len()
        );
    }
    Enrichment { records, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::site::LatLon;
    use chrono::NaiveDate;

    fn arlington() -> Site {
        Site::builder()
            .id("ARL")
            .crop("maize")
            .location(LatLon(43.3091, -89.3473))
            .start(NaiveDate::from_ymd_opt(2018, 5, 1).unwrap())
            .end(NaiveDate::from_ymd_opt(2018, 10, 30).unwrap())
            .build()
            .unwrap()
    }

    fn record(date: NaiveDate, tmax: f64, tmin: f64, pp: f64) -> DailyRecord {
        DailyRecord {
            temp_max: Some(tmax),
            temp_min: Some(tmin),
            temp_mean: Some((tmax + tmin) / 2.0),
            precipitation: Some(pp),
            ..DailyRecord::empty("ARL", date)
        }
    }

    #[test]
    fn midsummer_day_at_arlington() {
        let site = arlington();
        // DOY 172
        let day = record(NaiveDate::from_ymd_opt(2018, 6, 21).unwrap(), 28.0, 16.0, 0.0);
        assert_eq!(day.day_of_year(), 172);

        let derived = derive_fields(&day, site.latitude_radians(), &Thresholds::default()).unwrap();
        let et0 = derived.et0.unwrap();
        assert!(et0 > 0.0);
        assert!((et0 - 5.671).abs() < 1e-3, "got {et0}");
        assert_eq!(derived.growing_degree_units, Some(12.0));
        assert_eq!(derived.extreme_temperature, Some(0));
        assert_eq!(derived.extreme_precipitation, Some(0));
    }

    #[test]
    fn inverted_temperatures_fail_for_single_record() {
        let site = arlington();
        let day = record(NaiveDate::from_ymd_opt(2018, 6, 21).unwrap(), 10.0, 15.0, 0.0);
        let err = derive_fields(&day, site.latitude_radians(), &Thresholds::default()).unwrap_err();
        assert!(matches!(err, DataValidityError::TemperatureInversion { .. }));
    }

    #[test]
    fn enrich_collects_issues_and_keeps_records() {
        let site = arlington();
        let d1 = NaiveDate::from_ymd_opt(2018, 7, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2018, 7, 2).unwrap();
        let good = record(d1, 31.0, 18.0, 30.0);
        let bad = record(d2, 10.0, 15.0, 0.0);

        let out = enrich(&site, vec![good, bad], &Thresholds::default());
        assert_eq!(out.records.len(), 2);
        // inversion also breaks Tmin <= Tmean <= Tmax
        assert_eq!(out.issues.len(), 2);
        assert!(out.issues.iter().all(|e| e.site() == "ARL"));

        let first = &out.records[0];
        assert_eq!(first.extreme_precipitation(), Some(1));
        assert_eq!(first.extreme_temperature(), Some(1));
        assert!(first.et0().is_some());

        let second = &out.records[1];
        assert_eq!(second.et0(), None);
        assert!(second.crop_heat_units().is_some());
    }

    #[test]
    fn absent_inputs_leave_derived_fields_absent() {
        let site = arlington();
        let day = DailyRecord {
            precipitation: Some(3.0),
            ..DailyRecord::empty("ARL", NaiveDate::from_ymd_opt(2018, 7, 1).unwrap())
        };
        let out = enrich(&site, vec![day], &Thresholds::default());
        let derived = out.records[0].derived.clone().unwrap();
        assert_eq!(derived.et0, None);
        assert_eq!(derived.crop_heat_units, None);
        assert_eq!(derived.growing_degree_units, None);
        assert_eq!(derived.extreme_temperature, None);
        assert_eq!(derived.extreme_precipitation, Some(0));
        assert!(out.issues.is_empty());
    }

    #[test]
    fn temperature_order_property_holds_for_consistent_records() {
        let start = NaiveDate::from_ymd_opt(2018, 5, 1).unwrap();
        let records: Vec<DailyRecord> = (0..60)
            .map(|i| {
                let tmin = 5.0 + f64::from(i % 17);
                record(start + chrono::Days::new(i as u64), tmin + 9.0, tmin, 0.0)
            })
            .collect();
        assert!(records.iter().all(|r| check_temperature_order(r).is_none()));

        let broken = DailyRecord {
            temp_mean: Some(40.0),
            ..records[0].clone()
        };
        assert!(matches!(
            check_temperature_order(&broken),
            Some(DataValidityError::TemperatureOrder { .. })
        ));
    }
}
