use crate::providers::error::ProviderFetchError;
use crate::providers::mapping::schema_for;
use crate::providers::payload::parse_payload;
use crate::providers::{FetchRequest, RawFetch};
use crate::utils::sanitize_file_component;
use log::debug;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// Reads provider-native extracts named `<dir>/<site_id>.csv`.
///
/// The site id is sanitized the same way as cache file names, so it can never
/// leave `dir`.
///
/// The extract may cover more than the requested years; the adapter trims it.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    dir: PathBuf,
}

impl FileFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extract_path(&self, site_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.csv", sanitize_file_component(site_id)))
    }
}

impl RawFetch for FileFetcher {
    async fn raw_fetch(&self, request: &FetchRequest) -> Result<DataFrame, ProviderFetchError> {
        let path = self.extract_path(&request.site_id);
        debug!("Reading {} extract {}", request.provider, path.display());
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ProviderFetchError::ExtractRead(path.clone(), e))?;
        let schema = schema_for(request.provider);
        parse_payload(&text, schema.preamble, request.provider, &request.site_id).await
    }
}
