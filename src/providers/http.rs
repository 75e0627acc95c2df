//! HTTP transport for providers that expose a point API.

use crate::providers::error::ProviderFetchError;
use crate::providers::mapping::schema_for;
use crate::providers::payload::parse_payload;
use crate::providers::{daymet, nasa_power, FetchRequest, RawFetch};
use crate::types::provider::Provider;
use log::{info, warn};
use polars::prelude::DataFrame;
use reqwest::Client;
use std::time::Duration;

pub struct HttpFetcher {
    client: Client,
    daymet_url: String,
    nasa_power_url: String,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ProviderFetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(ProviderFetchError::ClientBuild)?;
        Ok(Self {
            client,
            daymet_url: daymet::DEFAULT_URL.to_string(),
            nasa_power_url: nasa_power::DEFAULT_URL.to_string(),
        })
    }

    /// Points the fetcher at other endpoints, e.g. a mirror or a test server.
    pub fn with_base_urls(
        mut self,
        daymet_url: impl Into<String>,
        nasa_power_url: impl Into<String>,
    ) -> Self {
        self.daymet_url = daymet_url.into();
        self.nasa_power_url = nasa_power_url.into();
        self
    }

    async fn download(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<String, ProviderFetchError> {
        info!("Downloading data from {}", url);

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderFetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    ProviderFetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    ProviderFetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let text = response
            .text()
            .await
            .map_err(|e| ProviderFetchError::NetworkRequest(url.to_string(), e))?;
        info!("Downloaded {} bytes from {}", text.len(), url);
        Ok(text)
    }
}

impl RawFetch for HttpFetcher {
    async fn raw_fetch(&self, request: &FetchRequest) -> Result<DataFrame, ProviderFetchError> {
        let (url, params) = match request.provider {
            Provider::Daymet => (&self.daymet_url, daymet::query_params(request)),
            Provider::NasaPower => (&self.nasa_power_url, nasa_power::query_params(request)),
            Provider::Chirps => return Err(ProviderFetchError::Unsupported(request.provider)),
        };
        let text = self.download(url, &params).await?;
        let schema = schema_for(request.provider);
        parse_payload(&text, schema.preamble, request.provider, &request.site_id).await
    }
}
