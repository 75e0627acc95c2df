use crate::aggregate::shannon::evenness;
use crate::error::DataValidityError;
use crate::types::daily_record::DailyRecord;
use crate::types::interval::Interval;
use crate::types::summary::SummaryRow;
use log::debug;
use std::collections::HashMap;

/// Which reductions an interval summary carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    /// Every accumulation, mean, index and ratio.
    Full,
    /// Duration, precipitation, extreme-precipitation days, SDI and AWDR only.
    PrecipitationOnly,
}

/// Summary rows plus the intervals whose evenness index was undefined.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub rows: Vec<SummaryRow>,
    pub issues: Vec<DataValidityError>,
}

/// Sum of the present values; `None` only when records exist and none carries the field.
fn sum_present<I: Iterator<Item = Option<f64>>>(values: I, days: usize) -> Option<f64> {
    let mut seen = false;
    let total = values.flatten().inspect(|_| seen = true).sum::<f64>();
    (seen || days == 0).then_some(total)
}

fn count_present<I: Iterator<Item = Option<u8>>>(flags: I, days: usize) -> Option<u32> {
    sum_present(flags.map(|f| f.map(f64::from)), days).map(|n| n as u32)
}

fn mean_present<I: Iterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// `numerator / denominator`, absent when either side is absent or the denominator is zero.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Reduces the records of one interval.
///
/// `records` must already be the interval's records, sorted by date. An undefined
/// evenness index leaves `sdi`/`awdr` empty and is returned as the second value.
pub fn summarize(
    interval: &Interval,
    records: &[&DailyRecord],
    reduction: Reduction,
) -> (SummaryRow, Option<DataValidityError>) {
    let days = records.len();
    let precipitation = sum_present(records.iter().map(|r| r.precipitation), days);

    let daily_pp: Vec<f64> = records.iter().filter_map(|r| r.precipitation).collect();
    let sdi = if precipitation.is_some() {
        evenness(&daily_pp, days)
    } else {
        None
    };
    let issue = (precipitation.is_some() && sdi.is_none()).then(|| {
        DataValidityError::UndefinedEvenness {
            site: interval.site_id.clone(),
            label: interval.label.clone(),
            days,
        }
    });

    let mut row = SummaryRow {
        site_id: interval.site_id.clone(),
        label: interval.label.clone(),
        name: interval.name.clone(),
        start: interval.start,
        end: interval.end,
        duration: days as u32,
        precipitation,
        temp_mean: None,
        radiation: None,
        vapor_pressure_deficit: None,
        et0: None,
        extreme_precipitation_days: count_present(
            records.iter().map(|r| r.extreme_precipitation()),
            days,
        ),
        extreme_temperature_days: None,
        crop_heat_units: None,
        growing_degree_days: None,
        sdi,
        awdr: precipitation.zip(sdi).map(|(pp, sdi)| pp * sdi),
        q_chu: None,
        q_gdd: None,
    };

    if reduction == Reduction::Full {
        row.temp_mean = mean_present(records.iter().map(|r| r.temp_mean));
        row.radiation = sum_present(records.iter().map(|r| r.radiation), days);
        row.vapor_pressure_deficit =
            sum_present(records.iter().map(|r| r.vapor_pressure_deficit), days);
        row.et0 = sum_present(records.iter().map(|r| r.et0()), days);
        row.extreme_temperature_days =
            count_present(records.iter().map(|r| r.extreme_temperature()), days);
        row.crop_heat_units = sum_present(records.iter().map(|r| r.crop_heat_units()), days);
        row.growing_degree_days =
            sum_present(records.iter().map(|r| r.growing_degree_units()), days);
        row.q_chu = ratio(row.radiation, row.crop_heat_units);
        row.q_gdd = ratio(row.radiation, row.growing_degree_days);
    }

    (row, issue)
}

/// Joins intervals to enriched daily records and reduces each interval.
///
/// Records are grouped per site and sorted by date; an interval takes the records of its
/// site with `start <= date < end`. Rows follow the order of `intervals`.
pub fn aggregate(
    intervals: &[Interval],
    records: &[DailyRecord],
    reduction: Reduction,
) -> Aggregation {
    let mut by_site: HashMap<&str, Vec<&DailyRecord>> = HashMap::new();
    for record in records {
        by_site.entry(record.site_id.as_str()).or_default().push(record);
    }
    for site_records in by_site.values_mut() {
        site_records.sort_by_key(|r| r.date);
    }

    let mut out = Aggregation::default();
    for interval in intervals {
        let matched: &[&DailyRecord] = match by_site.get(interval.site_id.as_str()) {
            Some(site_records) if !interval.is_empty() => {
                let lo = site_records.partition_point(|r| r.date < interval.start);
                let hi = site_records.partition_point(|r| r.date < interval.end);
                &site_records[lo..hi]
            }
            _ => &[],
        };
        let (row, issue) = summarize(interval, matched, reduction);
        if let Some(issue) = issue {
            debug!("{}", issue);
            out.issues.push(issue);
        }
        out.rows.push(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::engine::enrich;
    use crate::derive::indices::Thresholds;
    use crate::types::site::{LatLon, Site};
    use chrono::{Days, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn site() -> Site {
        Site::builder()
            .id("ARL")
            .location(LatLon(43.3091, -89.3473))
            .start(date(2018, 5, 1))
            .end(date(2018, 10, 30))
            .build()
            .unwrap()
    }

    fn series(start: NaiveDate, pp: &[f64]) -> Vec<DailyRecord> {
        pp.iter()
            .enumerate()
            .map(|(i, &pp)| DailyRecord {
                precipitation: Some(pp),
                radiation: Some(20.0),
                temp_max: Some(28.0),
                temp_min: Some(16.0),
                temp_mean: Some(22.0),
                vapor_pressure_deficit: Some(1.0),
                ..DailyRecord::empty("ARL", start + Days::new(i as u64))
            })
            .collect()
    }

    fn enriched(pp: &[f64]) -> Vec<DailyRecord> {
        enrich(&site(), series(date(2018, 7, 1), pp), &Thresholds::default()).records
    }

    #[test]
    fn single_storm_interval() {
        let records = enriched(&[0.0, 0.0, 0.0, 30.0, 0.0]);
        let interval = Interval::new("ARL", "A", None, date(2018, 7, 1), date(2018, 7, 6));
        let out = aggregate(&[interval], &records, Reduction::Full);

        assert!(out.issues.is_empty());
        let row = &out.rows[0];
        assert_eq!(row.duration, 5);
        assert_eq!(row.precipitation, Some(30.0));
        assert_eq!(row.extreme_precipitation_days, Some(1));
        assert_eq!(row.extreme_temperature_days, Some(0));
        assert_eq!(row.sdi, Some(0.0));
        assert_eq!(row.awdr, Some(0.0));
        assert_eq!(row.temp_mean, Some(22.0));
        assert_eq!(row.radiation, Some(100.0));
        assert_eq!(row.vapor_pressure_deficit, Some(5.0));
        assert_eq!(row.growing_degree_days, Some(60.0));
        assert!((row.q_gdd.unwrap() - 100.0 / 60.0).abs() < 1e-12);
        assert!((row.crop_heat_units.unwrap() - 5.0 * 39.618).abs() < 1e-9);
        assert!(row.et0.unwrap() > 0.0);
    }

    #[test]
    fn evenness_and_awdr_for_spread_rain() {
        let records = enriched(&[5.0, 0.0, 15.0]);
        let interval = Interval::new("ARL", "A", None, date(2018, 7, 1), date(2018, 7, 4));
        let row = &aggregate(&[interval], &records, Reduction::Full).rows[0];
        let expected = -(0.25_f64 * 0.25_f64.ln() + 0.75 * 0.75_f64.ln()) / 3.0_f64.ln();
        assert!((row.sdi.unwrap() - expected).abs() < 1e-12);
        assert!((row.awdr.unwrap() - 20.0 * expected).abs() < 1e-12);
    }

    #[test]
    fn right_bound_is_exclusive() {
        let records = enriched(&[1.0, 2.0, 4.0, 8.0]);
        let first = Interval::new("ARL", "A", None, date(2018, 7, 1), date(2018, 7, 3));
        let second = Interval::new("ARL", "B", None, date(2018, 7, 3), date(2018, 7, 5));
        let out = aggregate(&[first, second], &records, Reduction::Full);
        assert_eq!(out.rows[0].precipitation, Some(3.0));
        assert_eq!(out.rows[1].precipitation, Some(12.0));
        assert_eq!(out.rows[0].duration + out.rows[1].duration, 4);
    }

    #[test]
    fn zero_length_interval_sums_to_zero_and_reports_evenness() {
        let records = enriched(&[1.0, 2.0]);
        let empty = Interval::new("ARL", "A", None, date(2018, 7, 1), date(2018, 7, 1));
        let out = aggregate(&[empty], &records, Reduction::Full);

        let row = &out.rows[0];
        assert_eq!(row.duration, 0);
        assert_eq!(row.precipitation, Some(0.0));
        assert_eq!(row.radiation, Some(0.0));
        assert_eq!(row.et0, Some(0.0));
        assert_eq!(row.crop_heat_units, Some(0.0));
        assert_eq!(row.growing_degree_days, Some(0.0));
        assert_eq!(row.extreme_precipitation_days, Some(0));
        assert_eq!(row.sdi, None);
        assert_eq!(row.awdr, None);
        assert_eq!(row.q_chu, None);
        assert_eq!(
            out.issues,
            vec![DataValidityError::UndefinedEvenness {
                site: "ARL".into(),
                label: "A".into(),
                days: 0
            }]
        );
    }

    #[test]
    fn single_day_interval_reports_evenness() {
        let records = enriched(&[1.0, 2.0]);
        let one = Interval::new("ARL", "A", None, date(2018, 7, 1), date(2018, 7, 2));
        let out = aggregate(&[one], &records, Reduction::Full);
        assert_eq!(out.rows[0].duration, 1);
        assert_eq!(out.rows[0].sdi, None);
        assert_eq!(out.issues.len(), 1);
    }

    #[test]
    fn zero_heat_units_leave_ratios_absent() {
        let cold: Vec<DailyRecord> = series(date(2018, 3, 1), &[0.0, 1.0, 0.0])
            .into_iter()
            .map(|r| DailyRecord {
                temp_max: Some(5.0),
                temp_min: Some(-2.0),
                temp_mean: Some(1.5),
                ..r
            })
            .collect();
        let records = enrich(&site(), cold, &Thresholds::default()).records;
        let interval = Interval::new("ARL", "A", None, date(2018, 3, 1), date(2018, 3, 4));
        let row = &aggregate(&[interval], &records, Reduction::Full).rows[0];
        assert_eq!(row.crop_heat_units, Some(0.0));
        assert_eq!(row.q_chu, None);
        // GDU floor lifts Tmin to 10 while Tmax stays 5
        assert_eq!(row.growing_degree_days, Some(-7.5));
        assert!(row.q_gdd.is_some());
    }

    #[test]
    fn precipitation_only_reduction() {
        let records = enriched(&[0.0, 26.0, 4.0]);
        let interval = Interval::new("ARL", "A", None, date(2018, 7, 1), date(2018, 7, 4));
        let row = &aggregate(&[interval], &records, Reduction::PrecipitationOnly).rows[0];
        assert_eq!(row.duration, 3);
        assert_eq!(row.precipitation, Some(30.0));
        assert_eq!(row.extreme_precipitation_days, Some(1));
        assert!(row.sdi.is_some());
        assert!(row.awdr.is_some());
        assert_eq!(row.temp_mean, None);
        assert_eq!(row.radiation, None);
        assert_eq!(row.et0, None);
        assert_eq!(row.crop_heat_units, None);
        assert_eq!(row.extreme_temperature_days, None);
        assert_eq!(row.q_chu, None);
    }

    #[test]
    fn absent_fields_are_not_zero() {
        let records: Vec<DailyRecord> = (0..3)
            .map(|i| DailyRecord {
                precipitation: Some(2.0),
                ..DailyRecord::empty("ARL", date(2018, 7, 1) + Days::new(i))
            })
            .collect();
        let records = enrich(&site(), records, &Thresholds::default()).records;
        let interval = Interval::new("ARL", "A", None, date(2018, 7, 1), date(2018, 7, 4));
        let row = &aggregate(&[interval], &records, Reduction::Full).rows[0];
        assert_eq!(row.precipitation, Some(6.0));
        assert_eq!(row.radiation, None);
        assert_eq!(row.temp_mean, None);
        assert_eq!(row.et0, None);
        assert_eq!(row.q_gdd, None);
    }

    #[test]
    fn records_of_other_sites_and_unsorted_input_are_handled() {
        let mut records = enriched(&[1.0, 2.0, 3.0]);
        records.reverse();
        let mut other = records[0].clone();
        other.site_id = "OTHER".into();
        other.precipitation = Some(100.0);
        records.push(other);

        let interval = Interval::new("ARL", "A", None, date(2018, 7, 1), date(2018, 7, 4));
        let row = &aggregate(&[interval], &records, Reduction::Full).rows[0];
        assert_eq!(row.precipitation, Some(6.0));
        assert_eq!(row.duration, 3);
    }
}
