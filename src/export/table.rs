use crate::export::error::ExportError;
use crate::pipeline::driver::Manifest;
use crate::types::daily_record::DailyRecord;
use crate::types::summary::SummaryRow;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn write_frame(path: &Path, mut df: DataFrame) -> Result<(), ExportError> {
    let mut file = File::create(path).map_err(|e| ExportError::Create(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| ExportError::Write(path.to_path_buf(), e))?;
    info!("Wrote {} row(s) to {}", df.height(), path.display());
    Ok(())
}

/// Builds the summary table; the exclusive `end` is kept next to the inclusive `last_day`.
pub fn summary_frame(rows: &[SummaryRow]) -> PolarsResult<DataFrame> {
    let f = |get: fn(&SummaryRow) -> Option<f64>| rows.iter().map(get).collect::<Vec<_>>();
    let u = |get: fn(&SummaryRow) -> Option<u32>| rows.iter().map(get).collect::<Vec<_>>();

    DataFrame::new(vec![
        Column::new(
            "site_id".into(),
            rows.iter().map(|r| r.site_id.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "label".into(),
            rows.iter().map(|r| r.label.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "name".into(),
            rows.iter().map(|r| r.name.as_deref()).collect::<Vec<_>>(),
        ),
        Column::new(
            "start".into(),
            rows.iter().map(|r| fmt_date(r.start)).collect::<Vec<_>>(),
        ),
        Column::new(
            "end".into(),
            rows.iter().map(|r| fmt_date(r.end)).collect::<Vec<_>>(),
        ),
        Column::new(
            "last_day".into(),
            rows.iter()
                .map(|r| r.end.pred_opt().filter(|d| *d >= r.start).map(fmt_date))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "duration".into(),
            rows.iter().map(|r| r.duration).collect::<Vec<_>>(),
        ),
        Column::new("precipitation".into(), f(|r| r.precipitation)),
        Column::new("temp_mean".into(), f(|r| r.temp_mean)),
        Column::new("radiation".into(), f(|r| r.radiation)),
        Column::new(
            "vapor_pressure_deficit".into(),
            f(|r| r.vapor_pressure_deficit),
        ),
        Column::new("et0".into(), f(|r| r.et0)),
        Column::new(
            "extreme_precipitation_days".into(),
            u(|r| r.extreme_precipitation_days),
        ),
        Column::new(
            "extreme_temperature_days".into(),
            u(|r| r.extreme_temperature_days),
        ),
        Column::new("crop_heat_units".into(), f(|r| r.crop_heat_units)),
        Column::new("growing_degree_days".into(), f(|r| r.growing_degree_days)),
        Column::new("sdi".into(), f(|r| r.sdi)),
        Column::new("awdr".into(), f(|r| r.awdr)),
        Column::new("q_chu".into(), f(|r| r.q_chu)),
        Column::new("q_gdd".into(), f(|r| r.q_gdd)),
    ])
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<(), ExportError> {
    let df = summary_frame(rows).map_err(|e| ExportError::Frame(path.to_path_buf(), e))?;
    write_frame(path, df)
}

/// Builds the daily table, one row per record with its derived fields.
pub fn daily_frame(records: &[DailyRecord]) -> PolarsResult<DataFrame> {
    let f = |get: fn(&DailyRecord) -> Option<f64>| records.iter().map(get).collect::<Vec<_>>();
    let flag = |get: fn(&DailyRecord) -> Option<u8>| {
        records
            .iter()
            .map(|r| get(r).map(u32::from))
            .collect::<Vec<_>>()
    };

    DataFrame::new(vec![
        Column::new(
            "site_id".into(),
            records.iter().map(|r| r.site_id.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "date".into(),
            records.iter().map(|r| fmt_date(r.date)).collect::<Vec<_>>(),
        ),
        Column::new(
            "year".into(),
            records.iter().map(DailyRecord::year).collect::<Vec<_>>(),
        ),
        Column::new(
            "month".into(),
            records.iter().map(DailyRecord::month).collect::<Vec<_>>(),
        ),
        Column::new(
            "day".into(),
            records.iter().map(DailyRecord::day).collect::<Vec<_>>(),
        ),
        Column::new(
            "doy".into(),
            records.iter().map(DailyRecord::day_of_year).collect::<Vec<_>>(),
        ),
        Column::new("day_length".into(), f(|r| r.day_length)),
        Column::new("precipitation".into(), f(|r| r.precipitation)),
        Column::new("radiation".into(), f(|r| r.radiation)),
        Column::new("temp_max".into(), f(|r| r.temp_max)),
        Column::new("temp_min".into(), f(|r| r.temp_min)),
        Column::new("temp_mean".into(), f(|r| r.temp_mean)),
        Column::new(
            "vapor_pressure_deficit".into(),
            f(|r| r.vapor_pressure_deficit),
        ),
        Column::new("relative_humidity".into(), f(|r| r.relative_humidity)),
        Column::new(
            "snow_water_equivalent".into(),
            f(|r| r.snow_water_equivalent),
        ),
        Column::new("precipitation_30d".into(), f(|r| r.precipitation_30d)),
        Column::new("et0".into(), f(DailyRecord::et0)),
        Column::new(
            "extreme_precipitation".into(),
            flag(DailyRecord::extreme_precipitation),
        ),
        Column::new(
            "extreme_temperature".into(),
            flag(DailyRecord::extreme_temperature),
        ),
        Column::new("crop_heat_units".into(), f(DailyRecord::crop_heat_units)),
        Column::new(
            "growing_degree_units".into(),
            f(DailyRecord::growing_degree_units),
        ),
    ])
}

pub fn write_daily_csv(path: &Path, records: &[DailyRecord]) -> Result<(), ExportError> {
    let df = daily_frame(records).map_err(|e| ExportError::Frame(path.to_path_buf(), e))?;
    write_frame(path, df)
}

/// Text cells of a table read without type inference.
struct TextTable<'a> {
    path: &'a Path,
    df: DataFrame,
}

impl<'a> TextTable<'a> {
    fn read(path: &'a Path) -> Result<Self, ExportError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| ExportError::Read(path.to_path_buf(), e))?;
        Ok(Self { path, df })
    }

    fn text(&self, column: &str, row: usize) -> Result<Option<&str>, ExportError> {
        let values = self
            .df
            .column(column)
            .and_then(|c| c.str())
            .map_err(|_| ExportError::MissingColumn {
                path: self.path.to_path_buf(),
                column: column.to_string(),
            })?;
        Ok(values.get(row).map(str::trim).filter(|s| !s.is_empty()))
    }

    fn required(&self, column: &str, row: usize) -> Result<&str, ExportError> {
        self.text(column, row)?.ok_or_else(|| self.invalid(column, row, ""))
    }

    fn parsed<T: FromStr>(&self, column: &str, row: usize) -> Result<Option<T>, ExportError> {
        self.text(column, row)?
            .map(|s| s.parse::<T>().map_err(|_| self.invalid(column, row, s)))
            .transpose()
    }

    fn date(&self, column: &str, row: usize) -> Result<NaiveDate, ExportError> {
        let s = self.required(column, row)?;
        NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| self.invalid(column, row, s))
    }

    fn invalid(&self, column: &str, row: usize, value: &str) -> ExportError {
        ExportError::InvalidValue {
            path: self.path.to_path_buf(),
            row,
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Reads a table written by [`write_summary_csv`]; empty cells become `None`.
pub fn read_summary_csv(path: &Path) -> Result<Vec<SummaryRow>, ExportError> {
    let table = TextTable::read(path)?;
    (0..table.df.height())
        .map(|row| -> Result<SummaryRow, ExportError> {
            Ok(SummaryRow {
                site_id: table.required("site_id", row)?.to_string(),
                label: table.required("label", row)?.to_string(),
                name: table.text("name", row)?.map(str::to_string),
                start: table.date("start", row)?,
                end: table.date("end", row)?,
                duration: table
                    .parsed("duration", row)?
                    .ok_or_else(|| table.invalid("duration", row, ""))?,
                precipitation: table.parsed("precipitation", row)?,
                temp_mean: table.parsed("temp_mean", row)?,
                radiation: table.parsed("radiation", row)?,
                vapor_pressure_deficit: table.parsed("vapor_pressure_deficit", row)?,
                et0: table.parsed("et0", row)?,
                extreme_precipitation_days: table.parsed("extreme_precipitation_days", row)?,
                extreme_temperature_days: table.parsed("extreme_temperature_days", row)?,
                crop_heat_units: table.parsed("crop_heat_units", row)?,
                growing_degree_days: table.parsed("growing_degree_days", row)?,
                sdi: table.parsed("sdi", row)?,
                awdr: table.parsed("awdr", row)?,
                q_chu: table.parsed("q_chu", row)?,
                q_gdd: table.parsed("q_gdd", row)?,
            })
        })
        .collect()
}

pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(path, json).map_err(|e| ExportError::Manifest(path.to_path_buf(), e))?;
    info!(
        "Wrote manifest for {} site(s) to {}",
        manifest.sites.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::daily_record::DerivedFields;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn full_row() -> SummaryRow {
        SummaryRow {
            site_id: "ARL".into(),
            label: "B".into(),
            name: Some("start".into()),
            start: date(2018, 5, 1),
            end: date(2018, 5, 12),
            duration: 11,
            precipitation: Some(42.7),
            temp_mean: Some(17.254545454545454),
            radiation: Some(231.9),
            vapor_pressure_deficit: Some(8.31),
            et0: Some(47.112),
            extreme_precipitation_days: Some(1),
            extreme_temperature_days: Some(0),
            crop_heat_units: Some(154.2),
            growing_degree_days: Some(81.5),
            sdi: Some(0.6124),
            awdr: Some(26.149),
            q_chu: Some(1.5038910505836576),
            q_gdd: Some(2.845398773006135),
        }
    }

    fn precipitation_row() -> SummaryRow {
        SummaryRow {
            site_id: "KGL".into(),
            label: "2019".into(),
            name: None,
            start: date(2019, 1, 1),
            end: date(2020, 1, 1),
            duration: 365,
            precipitation: Some(1021.5),
            temp_mean: None,
            radiation: None,
            vapor_pressure_deficit: None,
            et0: None,
            extreme_precipitation_days: Some(6),
            extreme_temperature_days: None,
            crop_heat_units: None,
            growing_degree_days: None,
            sdi: Some(0.71),
            awdr: Some(725.265),
            q_chu: None,
            q_gdd: None,
        }
    }

    fn close(a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => (a - b).abs() < 1e-6,
            (None, None) => true,
            _ => false,
        }
    }

    #[test]
    fn summary_table_survives_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let rows = vec![full_row(), precipitation_row()];
        write_summary_csv(&path, &rows).unwrap();

        let back = read_summary_csv(&path).unwrap();
        assert_eq!(back.len(), 2);
        for (a, b) in rows.iter().zip(&back) {
            assert_eq!(a.site_id, b.site_id);
            assert_eq!(a.label, b.label);
            assert_eq!(a.name, b.name);
            assert_eq!((a.start, a.end, a.duration), (b.start, b.end, b.duration));
            assert_eq!(a.extreme_precipitation_days, b.extreme_precipitation_days);
            assert_eq!(a.extreme_temperature_days, b.extreme_temperature_days);
            for (x, y) in [
                (a.precipitation, b.precipitation),
                (a.temp_mean, b.temp_mean),
                (a.radiation, b.radiation),
                (a.vapor_pressure_deficit, b.vapor_pressure_deficit),
                (a.et0, b.et0),
                (a.crop_heat_units, b.crop_heat_units),
                (a.growing_degree_days, b.growing_degree_days),
                (a.sdi, b.sdi),
                (a.awdr, b.awdr),
                (a.q_chu, b.q_chu),
                (a.q_gdd, b.q_gdd),
            ] {
                assert!(close(x, y), "{x:?} != {y:?}");
            }
        }
    }

    #[test]
    fn absent_values_are_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        write_summary_csv(&path, &[precipitation_row()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("site_id,label,name,start,end,last_day,duration"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("KGL,2019,,2019-01-01,2020-01-01,2019-12-31,365,1021.5,,"));
    }

    #[test]
    fn unparsable_cells_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        write_summary_csv(&path, &[full_row()]).unwrap();
        let text = std::fs::read_to_string(&path)
            .unwrap()
            .replace("42.7", "lots");
        std::fs::write(&path, text).unwrap();
        assert!(matches!(
            read_summary_csv(&path),
            Err(ExportError::InvalidValue { column, row: 0, .. }) if column == "precipitation"
        ));
    }

    #[test]
    fn daily_table_carries_calendar_and_derived_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.csv");
        let record = DailyRecord {
            precipitation: Some(30.0),
            temp_max: Some(31.0),
            temp_min: Some(18.0),
            derived: Some(DerivedFields {
                extreme_precipitation: Some(1),
                growing_degree_units: Some(14.0),
                ..DerivedFields::default()
            }),
            ..DailyRecord::empty("ARL", date(2018, 6, 21))
        };
        write_daily_csv(&path, &[record]).unwrap();

        let table = TextTable::read(&path).unwrap();
        assert_eq!(table.df.height(), 1);
        assert_eq!(table.text("doy", 0).unwrap(), Some("172"));
        assert_eq!(table.text("month", 0).unwrap(), Some("6"));
        assert_eq!(table.text("extreme_precipitation", 0).unwrap(), Some("1"));
        assert_eq!(table.text("extreme_temperature", 0).unwrap(), None);
        assert_eq!(table.text("radiation", 0).unwrap(), None);
    }
}
