use crate::derive::solar::{day_length, saturation_vapor_pressure};
use crate::providers::chirps::{trailing_precipitation, INDEX_WINDOW_DAYS};
use crate::providers::error::ProviderFetchError;
use crate::providers::mapping::{schema_for, CanonicalField, Conversion, DateKey};
use crate::providers::{FetchRequest, RawFetch};
use crate::types::daily_record::DailyRecord;
use crate::types::period::year_span;
use crate::types::provider::Provider;
use crate::types::site::Site;
use chrono::{Days, NaiveDate};
use log::{debug, info};
use polars::prelude::*;

const YEAR_KEY: &str = "__year";
const DAY_KEY: &str = "__doy";
const DATE_KEY: &str = "__date";

/// Fetches one provider's data for a site and maps it onto canonical daily records.
pub struct ProviderAdapter<F> {
    provider: Provider,
    fetcher: F,
}

impl<F: RawFetch> ProviderAdapter<F> {
    pub fn new(provider: Provider, fetcher: F) -> Self {
        Self { provider, fetcher }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Returns exactly one record per date in `[range_start, range_end]` (both inclusive).
    ///
    /// The provider is queried for every calendar year touched by the range and the
    /// result is cut back to the requested bounds.
    ///
    /// # Errors
    ///
    /// Fails when the range is inverted, the fetch fails, or the payload lacks its
    /// date columns or repeats a date.
    pub async fn fetch_and_normalize(
        &self,
        site: &Site,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Vec<DailyRecord>, ProviderFetchError> {
        let (start, end) =
            year_span(range_start, range_end).ok_or_else(|| ProviderFetchError::InvalidRange {
                site: site.id().to_string(),
                start: range_start,
                end: range_end,
            })?;

        let request = FetchRequest {
            provider: self.provider,
            site_id: site.id().to_string(),
            location: site.location(),
            start,
            end,
        };
        info!(
            "Fetching {} data for site {} ({} to {})",
            self.provider, request.site_id, start, end
        );
        let frame = self.fetcher.raw_fetch(&request).await?;

        let records = normalize(
            self.provider,
            site.id(),
            site.latitude_radians(),
            &frame,
        )?;
        let records = finalize_series(self.provider, site.id(), records, range_start, range_end)?;
        info!(
            "Normalized {} {} records for site {}",
            records.len(),
            self.provider,
            site.id()
        );
        Ok(records)
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Maps a provider-native frame onto canonical records, one per row, in row order.
///
/// Columns the payload lacks leave their canonical field `None`; only the date
/// columns are required.
pub fn normalize(
    provider: Provider,
    site_id: &str,
    latitude_rad: f64,
    frame: &DataFrame,
) -> Result<Vec<DailyRecord>, ProviderFetchError> {
    let schema = schema_for(provider);
    let polars_error = |e: PolarsError| ProviderFetchError::Polars {
        site: site_id.to_string(),
        source: e,
    };

    for column in schema.date_key.columns() {
        if !has_column(frame, column) {
            return Err(ProviderFetchError::MissingColumn {
                provider,
                site: site_id.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut exprs = match schema.date_key {
        DateKey::YearDay { year, day } => vec![
            col(year).cast(DataType::Int64).alias(YEAR_KEY),
            col(day).cast(DataType::Int64).alias(DAY_KEY),
        ],
        DateKey::Iso { column } => vec![col(column).cast(DataType::String).alias(DATE_KEY)],
    };
    let applied: Vec<_> = schema
        .fields
        .iter()
        .filter(|m| m.required_columns().iter().all(|c| has_column(frame, c)))
        .collect();
    exprs.extend(applied.iter().map(|m| m.expr()));

    let out = frame
        .clone()
        .lazy()
        .select(exprs)
        .collect()
        .map_err(polars_error)?;

    let mut values = Vec::with_capacity(applied.len());
    for mapping in &applied {
        let series = out
            .column(mapping.target.column_name())
            .and_then(|c| c.f64())
            .map_err(polars_error)?;
        let identity = mapping.conversion == Conversion::Identity;
        values.push((mapping.target, series, identity));
    }

    let mut records = Vec::with_capacity(out.height());
    for row in 0..out.height() {
        let date = row_date(&out, schema.date_key, row)
            .map_err(polars_error)?
            .ok_or_else(|| ProviderFetchError::InvalidDate {
                provider,
                site: site_id.to_string(),
                row,
            })?;

        let field = |target: CanonicalField| {
            values
                .iter()
                .find(|(t, _, _)| *t == target)
                .and_then(|(_, series, identity)| {
                    series
                        .get(row)
                        .filter(|v| !v.is_nan() && !(*identity && schema.is_fill(*v)))
                })
        };

        let mut record = DailyRecord {
            day_length: field(CanonicalField::DayLength),
            precipitation: field(CanonicalField::Precipitation),
            radiation: field(CanonicalField::Radiation),
            temp_max: field(CanonicalField::TempMax),
            temp_min: field(CanonicalField::TempMin),
            temp_mean: field(CanonicalField::TempMean),
            vapor_pressure_deficit: field(CanonicalField::VaporPressureDeficit),
            relative_humidity: field(CanonicalField::RelativeHumidity),
            snow_water_equivalent: field(CanonicalField::SnowWaterEquivalent),
            ..DailyRecord::empty(site_id, date)
        };
        fill_implied_fields(
            &mut record,
            provider,
            latitude_rad,
            field(CanonicalField::VaporPressure),
        );
        records.push(record);
    }
    debug!(
        "Mapped {} {} rows for site {} ({} of {} fields present)",
        records.len(),
        provider,
        site_id,
        applied.len(),
        schema.fields.len()
    );
    Ok(records)
}

fn row_date(out: &DataFrame, key: DateKey, row: usize) -> PolarsResult<Option<NaiveDate>> {
    Ok(match key {
        DateKey::YearDay { .. } => {
            let year = out.column(YEAR_KEY)?.i64()?.get(row);
            let day = out.column(DAY_KEY)?.i64()?.get(row);
            match (year, day) {
                (Some(y), Some(d)) => i32::try_from(y)
                    .ok()
                    .zip(u32::try_from(d).ok())
                    .and_then(|(y, d)| NaiveDate::from_yo_opt(y, d)),
                _ => None,
            }
        }
        DateKey::Iso { .. } => out
            .column(DATE_KEY)?
            .str()?
            .get(row)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()),
    })
}

/// FAO-56 mean saturation vapour pressure [kPa].
fn mean_saturation_vapor_pressure(record: &DailyRecord) -> Option<f64> {
    match (record.temp_max, record.temp_min, record.temp_mean) {
        (Some(tmax), Some(tmin), _) => {
            Some((saturation_vapor_pressure(tmax) + saturation_vapor_pressure(tmin)) / 2.0)
        }
        (_, _, Some(tmean)) => Some(saturation_vapor_pressure(tmean)),
        _ => None,
    }
}

/// Fills the canonical fields a provider does not serve but its other fields imply.
fn fill_implied_fields(
    record: &mut DailyRecord,
    provider: Provider,
    latitude_rad: f64,
    vapor_pressure: Option<f64>,
) {
    if record.temp_mean.is_none() {
        if let (Some(tmax), Some(tmin)) = (record.temp_max, record.temp_min) {
            record.temp_mean = Some((tmax + tmin) / 2.0);
        }
    }
    if record.day_length.is_none() && provider.has_temperature() {
        record.day_length = Some(day_length(latitude_rad, record.day_of_year()));
    }
    if record.vapor_pressure_deficit.is_none() {
        let es = mean_saturation_vapor_pressure(record);
        record.vapor_pressure_deficit = match (es, vapor_pressure, record.relative_humidity) {
            (Some(es), Some(ea), _) => Some((es - ea).max(0.0)),
            (Some(es), None, Some(rh)) => Some((es * (1.0 - rh / 100.0)).max(0.0)),
            _ => None,
        };
    }
}

/// Sorts, rejects duplicates, fills calendar gaps, attaches the precipitation index
/// where the provider needs one and cuts the series to `[range_start, range_end]`.
pub fn finalize_series(
    provider: Provider,
    site_id: &str,
    mut records: Vec<DailyRecord>,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Vec<DailyRecord>, ProviderFetchError> {
    records.sort_by_key(|r| r.date);
    if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(ProviderFetchError::DuplicateDate {
            provider,
            site: site_id.to_string(),
            date: pair[0].date,
        });
    }

    let mut records = densify(site_id, records, range_start, range_end);
    if provider.computes_precipitation_index() {
        trailing_precipitation(&mut records, INDEX_WINDOW_DAYS);
    }
    records.retain(|r| r.date >= range_start && r.date <= range_end);
    Ok(records)
}

/// Inserts an all-absent record for every missing date, covering at least
/// `[range_start, range_end]` plus whatever earlier or later days were served.
fn densify(
    site_id: &str,
    records: Vec<DailyRecord>,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Vec<DailyRecord> {
    let first = records.first().map_or(range_start, |r| r.date.min(range_start));
    let last = records.last().map_or(range_end, |r| r.date.max(range_end));
    let mut dense: Vec<DailyRecord> = Vec::with_capacity(records.len());
    let mut next = first;
    for record in records {
        while next < record.date {
            dense.push(DailyRecord::empty(site_id, next));
            next = next + Days::new(1);
        }
        next = record.date + Days::new(1);
        dense.push(record);
    }
    while next <= last {
        dense.push(DailyRecord::empty(site_id, next));
        next = next + Days::new(1);
    }
    let gaps = dense.len().saturating_sub(dense.iter().filter(|r| r.has_observations()).count());
    if gaps > 0 {
        debug!("Site {} has {} day(s) without observations", site_id, gaps);
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::site::LatLon;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn site() -> Site {
        Site::builder()
            .id("ARL")
            .location(LatLon(43.3091, -89.3473))
            .start(date(2016, 5, 1))
            .end(date(2016, 10, 30))
            .build()
            .unwrap()
    }

    /// Serves a fixed frame and remembers the last request.
    struct FixedFrame {
        frame: DataFrame,
        seen: Mutex<Option<FetchRequest>>,
    }

    impl RawFetch for FixedFrame {
        async fn raw_fetch(&self, request: &FetchRequest) -> Result<DataFrame, ProviderFetchError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(self.frame.clone())
        }
    }

    fn daymet_frame(year: i64, days: std::ops::RangeInclusive<i64>) -> DataFrame {
        let yday: Vec<i64> = days.collect();
        let n = yday.len();
        df!(
            "year" => vec![year; n],
            "yday" => yday,
            "dayl (s)" => vec![54000.0; n],
            "prcp (mm/day)" => vec![2.0; n],
            "srad (W/m^2)" => vec![400.0; n],
            "swe (kg/m^2)" => vec![0.0; n],
            "tmax (deg c)" => vec![28.0; n],
            "tmin (deg c)" => vec![16.0; n],
            "vp (Pa)" => vec![1500.0; n],
        )
        .unwrap()
    }

    #[test]
    fn daymet_units_are_converted() {
        let frame = daymet_frame(2018, 172..=172);
        let records = normalize(Provider::Daymet, "ARL", 0.7559, &frame).unwrap();
        let r = &records[0];
        assert_eq!(r.date, date(2018, 6, 21));
        assert!((r.day_length.unwrap() - 15.0).abs() < 1e-9);
        // 400 W/m² over 15 h of daylight
        assert!((r.radiation.unwrap() - 21.6).abs() < 1e-9);
        assert_eq!(r.temp_mean, Some(22.0));
        let es = (saturation_vapor_pressure(28.0) + saturation_vapor_pressure(16.0)) / 2.0;
        assert!((r.vapor_pressure_deficit.unwrap() - (es - 1.5)).abs() < 1e-9);
        assert_eq!(r.relative_humidity, None);
        assert_eq!(r.snow_water_equivalent, Some(0.0));
    }

    #[test]
    fn power_fill_values_become_absent() {
        let frame = df!(
            "YEAR" => [2018i64, 2018],
            "DOY" => [1i64, 2],
            "T2M" => [-15.2, -999.0],
            "T2M_MAX" => [-9.8, -999.0],
            "T2M_MIN" => [-21.3, -999.0],
            "PRECTOTCORR" => [0.0, 1.5],
            "ALLSKY_SFC_SW_DWN" => [7.42, -999.0],
            "RH2M" => [71.3, 80.0],
        )
        .unwrap();
        let records = normalize(Provider::NasaPower, "ARL", 0.7559, &frame).unwrap();
        assert_eq!(records[0].radiation, Some(7.42));
        assert_eq!(records[0].temp_mean, Some(-15.2));
        assert!(records[0].vapor_pressure_deficit.unwrap() > 0.0);
        assert!(records[0].day_length.unwrap() > 8.0);

        let missing = &records[1];
        assert_eq!(missing.precipitation, Some(1.5));
        assert_eq!(missing.temp_max, None);
        assert_eq!(missing.temp_mean, None);
        assert_eq!(missing.radiation, None);
        assert_eq!(missing.vapor_pressure_deficit, None);
    }

    #[test]
    fn absent_columns_stay_absent() {
        let frame = df!(
            "year" => [2018i64],
            "yday" => [10i64],
            "prcp (mm/day)" => [4.0],
        )
        .unwrap();
        let records = normalize(Provider::Daymet, "ARL", 0.7559, &frame).unwrap();
        let r = &records[0];
        assert_eq!(r.precipitation, Some(4.0));
        assert_eq!(r.radiation, None);
        assert_eq!(r.temp_max, None);
        assert_eq!(r.vapor_pressure_deficit, None);
        // day length is still derived from latitude
        assert!(r.day_length.is_some());
    }

    #[test]
    fn missing_date_column_is_an_error() {
        let frame = df!("yday" => [1i64], "prcp (mm/day)" => [0.0]).unwrap();
        let err = normalize(Provider::Daymet, "ARL", 0.7559, &frame).unwrap_err();
        assert!(matches!(err, ProviderFetchError::MissingColumn { column, .. } if column == "year"));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let records = vec![
            DailyRecord::empty("ARL", date(2018, 1, 1)),
            DailyRecord::empty("ARL", date(2018, 1, 1)),
        ];
        let err = finalize_series(
            Provider::Daymet,
            "ARL",
            records,
            date(2018, 1, 1),
            date(2018, 1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderFetchError::DuplicateDate { .. }));
    }

    #[tokio::test]
    async fn leap_year_gap_is_densified_and_range_is_exact() {
        // Daymet serves 365 days, dropping Dec 31 of leap years
        let fetcher = FixedFrame {
            frame: daymet_frame(2016, 1..=365),
            seen: Mutex::new(None),
        };
        let adapter = ProviderAdapter::new(Provider::Daymet, fetcher);
        let records = adapter
            .fetch_and_normalize(&site(), date(2016, 12, 1), date(2016, 12, 31))
            .await
            .unwrap();

        assert_eq!(records.len(), 31);
        assert_eq!(records.first().unwrap().date, date(2016, 12, 1));
        let last = records.last().unwrap();
        assert_eq!(last.date, date(2016, 12, 31));
        assert_eq!(last.precipitation, None);
        assert!(records.windows(2).all(|w| w[1].date == w[0].date + Days::new(1)));

        let seen = adapter.fetcher.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.start, date(2016, 1, 1));
        assert_eq!(seen.end, date(2016, 12, 31));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let fetcher = FixedFrame {
            frame: daymet_frame(2016, 1..=2),
            seen: Mutex::new(None),
        };
        let adapter = ProviderAdapter::new(Provider::Daymet, fetcher);
        let err = adapter
            .fetch_and_normalize(&site(), date(2016, 5, 2), date(2016, 5, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderFetchError::InvalidRange { .. }));
        assert!(adapter.fetcher.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn chirps_index_uses_days_before_the_range() {
        let dates: Vec<String> = (0..366)
            .map(|i| (date(2016, 1, 1) + Days::new(i)).format("%Y-%m-%d").to_string())
            .collect();
        let frame = df!(
            "date" => dates,
            "precip" => vec![1.0; 366],
        )
        .unwrap();
        let fetcher = FixedFrame {
            frame,
            seen: Mutex::new(None),
        };
        let adapter = ProviderAdapter::new(Provider::Chirps, fetcher);
        let records = adapter
            .fetch_and_normalize(&site(), date(2016, 1, 20), date(2016, 2, 10))
            .await
            .unwrap();
        assert_eq!(records.first().unwrap().precipitation_30d, None);
        assert_eq!(records.last().unwrap().precipitation_30d, Some(30.0));
        assert!(records.iter().all(|r| r.temp_max.is_none() && r.day_length.is_none()));
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let fetcher = FixedFrame {
            frame: daymet_frame(2018, 100..=200),
            seen: Mutex::new(None),
        };
        let adapter = ProviderAdapter::new(Provider::Daymet, fetcher);
        let a = adapter
            .fetch_and_normalize(&site(), date(2018, 5, 1), date(2018, 6, 1))
            .await
            .unwrap();
        let b = adapter
            .fetch_and_normalize(&site(), date(2018, 5, 1), date(2018, 6, 1))
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }
}
