use crate::error::AgroClimError;
use crate::providers::error::ProviderFetchError;
use crate::providers::{FetchRequest, RawFetch};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir, sanitize_file_component};
use log::{info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Wraps a fetcher and keeps every raw payload as a parquet file.
///
/// Entries are keyed by provider, site, coordinates and the requested year span,
/// so a changed site location never reuses a stale payload.
pub struct CachedFetcher<F> {
    inner: F,
    cache_dir: PathBuf,
}

impl<F: RawFetch> CachedFetcher<F> {
    pub fn new(inner: F, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    /// Caches under the platform cache directory.
    pub fn in_system_cache(inner: F) -> Result<Self, AgroClimError> {
        let dir = get_cache_dir().ok_or(AgroClimError::CacheDirResolution)?;
        Ok(Self::new(inner, dir))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_path(&self, request: &FetchRequest) -> PathBuf {
        let file_name = format!(
            "{}{}_{:.4}_{:.4}_{}_{}.parquet",
            request.provider.cache_file_prefix(),
            sanitize_file_component(&request.site_id),
            request.location.0,
            request.location.1,
            request.start.format("%Y%m%d"),
            request.end.format("%Y%m%d"),
        );
        self.cache_dir.join(file_name)
    }

    /// Writes `df` next to `path` and renames it into place, so readers never see a
    /// partial file.
    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), ProviderFetchError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let dir = path_buf.parent().unwrap_or_else(|| Path::new("."));
            let mut staged = NamedTempFile::new_in(dir)
                .map_err(|e| ProviderFetchError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(staged.as_file_mut())
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| ProviderFetchError::ParquetWritePolars(path_buf.clone(), e))?;
            staged
                .persist(&path_buf)
                .map_err(|e| ProviderFetchError::ParquetWriteIo(path_buf, e.error))?;
            Ok::<(), ProviderFetchError>(())
        })
        .await??;
        Ok(())
    }

    async fn read_cached(path: &Path) -> Result<DataFrame, ProviderFetchError> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || {
            LazyFrame::scan_parquet(&path, Default::default())
                .and_then(|lf| lf.collect())
                .map_err(|e| ProviderFetchError::ParquetScan(path, e))
        })
        .await?
    }

    async fn store(&self, df: &DataFrame, path: &Path) -> Result<(), ProviderFetchError> {
        ensure_cache_dir_exists(&self.cache_dir)
            .await
            .map_err(|e| ProviderFetchError::CacheDirCreation(self.cache_dir.clone(), e))?;
        Self::cache_dataframe(df.clone(), path).await
    }
}

impl<F: RawFetch> RawFetch for CachedFetcher<F> {
    /// Serves the cached payload when it can be read; otherwise fetches from the inner
    /// fetcher. A failed cache write is logged and never fails the fetch.
    async fn raw_fetch(&self, request: &FetchRequest) -> Result<DataFrame, ProviderFetchError> {
        let parquet_path = self.cache_path(request);

        if fs::metadata(&parquet_path).await.is_ok() {
            match Self::read_cached(&parquet_path).await {
                Ok(df) => {
                    info!(
                        "Cache hit for {} data of site {} at {:?}",
                        request.provider, request.site_id, parquet_path
                    );
                    return Ok(df);
                }
                Err(e) => warn!("Ignoring unreadable cache entry: {}", e),
            }
        } else {
            warn!(
                "Cache miss for {} data of site {}. Fetching.",
                request.provider, request.site_id
            );
        }

        let df = self.inner.raw_fetch(request).await?;
        match self.store(&df, &parquet_path).await {
            Ok(()) => info!(
                "Cached {} data for site {} to {:?}",
                request.provider, request.site_id, parquet_path
            ),
            Err(e) => warn!(
                "Could not cache {} data for site {}: {}",
                request.provider, request.site_id, e
            ),
        }
        Ok(df)
    }
}
