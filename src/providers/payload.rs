//! Raw provider payloads: preamble stripping and CSV decoding into polars.

use crate::providers::error::ProviderFetchError;
use crate::providers::mapping::Preamble;
use crate::types::provider::Provider;
use polars::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio::task;

/// Returns the payload starting at its CSV header line.
pub fn strip_preamble<'a>(
    text: &'a str,
    preamble: Preamble,
    provider: Provider,
    site: &str,
) -> Result<&'a str, ProviderFetchError> {
    let missing = |marker: &'static str| ProviderFetchError::MissingHeader {
        provider,
        site: site.to_string(),
        marker,
    };
    match preamble {
        Preamble::None => Ok(text.trim_start_matches('\u{feff}')),
        Preamble::HeaderStartsWith(marker) => {
            let mut offset = 0;
            for line in text.split_inclusive('\n') {
                if line.trim_start_matches('\u{feff}').starts_with(marker) {
                    return Ok(&text[offset..]);
                }
                offset += line.len();
            }
            Err(missing(marker))
        }
        Preamble::AfterLine(marker) => {
            let mut offset = 0;
            for line in text.split_inclusive('\n') {
                offset += line.len();
                if line.trim() == marker {
                    return Ok(&text[offset..]);
                }
            }
            Err(missing(marker))
        }
    }
}

/// Parses CSV bytes (header included) into a DataFrame using a blocking task.
pub async fn csv_to_dataframe(
    bytes: Vec<u8>,
    provider: Provider,
    site: &str,
) -> Result<DataFrame, ProviderFetchError> {
    let site_owned = site.to_string();

    task::spawn_blocking(move || {
        let io_error = |e: std::io::Error| ProviderFetchError::CsvReadIo {
            provider,
            site: site_owned.clone(),
            source: e,
        };
        let mut temp_file = NamedTempFile::new().map_err(io_error)?;
        temp_file.write_all(&bytes).map_err(io_error)?;
        temp_file.flush().map_err(io_error)?;

        let polars_error = |e: PolarsError| ProviderFetchError::CsvReadPolars {
            provider,
            site: site_owned.clone(),
            source: e,
        };
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(temp_file.path().to_path_buf()))
            .map_err(polars_error)?
            .finish()
            .map_err(polars_error)
    })
    .await?
}

/// Strips the provider's preamble and decodes the remaining CSV.
pub async fn parse_payload(
    text: &str,
    preamble: Preamble,
    provider: Provider,
    site: &str,
) -> Result<DataFrame, ProviderFetchError> {
    let body = strip_preamble(text, preamble, provider, site)?;
    csv_to_dataframe(body.as_bytes().to_vec(), provider, site).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAYMET: &str = "Latitude: 43.3091  Longitude: -89.3473\n\
X & Y on Lambert Conformal Conic: 623520.61 -13947.43\n\
How to cite: Thornton et al.\n\
\n\
year,yday,dayl (s),prcp (mm/day),srad (W/m^2),swe (kg/m^2),tmax (deg c),tmin (deg c),vp (Pa)\n\
2018,1,31795.20,0.00,227.20,12.00,-12.50,-24.00,80.00\n\
2018,2,31864.70,1.20,196.80,12.00,-8.00,-18.50,130.00\n";

    const POWER: &str = "-BEGIN HEADER-\n\
NASA/POWER CERES/MERRA2 Native Resolution Daily Data\n\
-END HEADER-\n\
YEAR,DOY,T2M,T2M_MAX,T2M_MIN,PRECTOTCORR,ALLSKY_SFC_SW_DWN,RH2M\n\
2018,1,-15.2,-9.8,-21.3,0.0,7.42,71.3\n";

    #[test]
    fn header_found_after_metadata() {
        let body = strip_preamble(
            DAYMET,
            Preamble::HeaderStartsWith("year,"),
            Provider::Daymet,
            "ARL",
        )
        .unwrap();
        assert!(body.starts_with("year,yday"));
        assert_eq!(body.lines().count(), 3);
    }

    #[test]
    fn body_follows_end_marker() {
        let body = strip_preamble(
            POWER,
            Preamble::AfterLine("-END HEADER-"),
            Provider::NasaPower,
            "ARL",
        )
        .unwrap();
        assert!(body.starts_with("YEAR,DOY"));
    }

    #[test]
    fn missing_marker_is_reported() {
        let err = strip_preamble(
            "just,some\n1,2\n",
            Preamble::AfterLine("-END HEADER-"),
            Provider::NasaPower,
            "ARL",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProviderFetchError::MissingHeader {
                marker: "-END HEADER-",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn decodes_daymet_payload() {
        let df = parse_payload(
            DAYMET,
            Preamble::HeaderStartsWith("year,"),
            Provider::Daymet,
            "ARL",
        )
        .await
        .unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 9);
        assert!(df.column("prcp (mm/day)").is_ok());
    }
}
