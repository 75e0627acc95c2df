use crate::aggregate::aggregator::aggregate;
use crate::derive::engine::enrich;
use crate::error::{AgroClimError, DataValidityError};
use crate::pipeline::config::PipelineConfig;
use crate::providers::adapter::ProviderAdapter;
use crate::providers::error::ProviderFetchError;
use crate::providers::RawFetch;
use crate::registry::site_registry::SiteRegistry;
use crate::types::daily_record::DailyRecord;
use crate::types::provider::Provider;
use crate::types::site::Site;
use crate::types::summary::SummaryRow;
use bon::bon;
use futures_util::{stream, StreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Everything produced for one site.
#[derive(Debug, Clone)]
pub struct SiteOutput {
    pub site_id: String,
    pub records: Vec<DailyRecord>,
    pub summaries: Vec<SummaryRow>,
    pub issues: Vec<DataValidityError>,
}

/// Outcome of one site in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SiteStatus {
    Succeeded {
        records: usize,
        intervals: usize,
        issues: Vec<String>,
    },
    Failed {
        reason: String,
    },
}

impl SiteStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SiteStatus::Succeeded { .. })
    }
}

/// Per-site status of a batch run, keyed by site id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub provider: Option<Provider>,
    pub sites: BTreeMap<String, SiteStatus>,
}

impl Manifest {
    pub fn succeeded(&self) -> usize {
        self.sites.values().filter(|s| s.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sites.iter().filter_map(|(id, status)| match status {
            SiteStatus::Failed { reason } => Some((id.as_str(), reason.as_str())),
            SiteStatus::Succeeded { .. } => None,
        })
    }
}

/// Partial results of a batch: whatever succeeded, plus the manifest.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub summaries: Vec<SummaryRow>,
    pub records: Vec<DailyRecord>,
    pub manifest: Manifest,
}

/// Drives one provider through normalization, derivation, interval generation and
/// aggregation.
pub struct Pipeline<F> {
    adapter: ProviderAdapter<F>,
    config: PipelineConfig,
}

#[bon]
impl<F: RawFetch> Pipeline<F> {
    #[builder]
    pub fn new(fetcher: F, provider: Provider, #[builder(default)] config: PipelineConfig) -> Self {
        Self {
            adapter: ProviderAdapter::new(provider, fetcher),
            config,
        }
    }

    pub fn provider(&self) -> Provider {
        self.adapter.provider()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetches `[site.start - lookback, site.end]` and summarizes it.
    ///
    /// # Errors
    ///
    /// An invalid configuration, a fetch failure or a timeout always fails the site.
    /// Validity issues fail it only in strict mode; otherwise they are returned in
    /// [`SiteOutput::issues`].
    pub async fn run_site(&self, site: &Site) -> Result<SiteOutput, AgroClimError> {
        self.config.validate()?;
        let range_start = site.lookback_start(self.config.lookback_days);
        let seconds = self.config.fetch_timeout_secs;

        let records = tokio::time::timeout(
            Duration::from_secs(seconds),
            self.adapter.fetch_and_normalize(site, range_start, site.end()),
        )
        .await
        .map_err(|_| ProviderFetchError::Timeout {
            provider: self.provider(),
            site: site.id().to_string(),
            seconds,
        })??;

        self.process(site, records)
    }

    /// Derives, cuts and aggregates records already normalized for `site`.
    pub fn process(
        &self,
        site: &Site,
        records: Vec<DailyRecord>,
    ) -> Result<SiteOutput, AgroClimError> {
        self.config.validate()?;
        let enrichment = enrich(site, records, &self.config.thresholds);
        let mut issues = enrichment.issues;
        let records = enrichment.records;
        if self.config.strict {
            if let Some(issue) = issues.first() {
                return Err(issue.clone().into());
            }
        }

        let dates: Vec<_> = records.iter().map(|r| r.date).collect();
        let intervals =
            self.config
                .interval_strategy()
                .generate(site, self.config.lookback_days, &dates);
        let aggregation = aggregate(&intervals, &records, self.provider().reduction());
        if self.config.strict {
            if let Some(issue) = aggregation.issues.first() {
                return Err(issue.clone().into());
            }
        }
        issues.extend(aggregation.issues);

        info!(
            "Site {}: {} records, {} intervals, {} issue(s)",
            site.id(),
            records.len(),
            aggregation.rows.len(),
            issues.len()
        );
        Ok(SiteOutput {
            site_id: site.id().to_string(),
            records,
            summaries: aggregation.rows,
            issues,
        })
    }

    /// Runs every site of the registry, at most `concurrency` at a time.
    ///
    /// A failing site never stops the others; its reason is recorded in the manifest.
    /// An invalid configuration fails every site with the same reason.
    /// Output rows follow registry order.
    pub async fn run_batch(&self, registry: &SiteRegistry) -> BatchResult {
        let concurrency = self.config.concurrency.max(1);
        info!(
            "Running {} site(s) against {} with concurrency {}",
            registry.len(),
            self.provider(),
            concurrency
        );

        let mut outcomes: Vec<(usize, &Site, Result<SiteOutput, AgroClimError>)> =
            stream::iter(registry.iter().enumerate())
                .map(|(i, site)| async move { (i, site, self.run_site(site).await) })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(i, _, _)| *i);

        let mut result = BatchResult {
            manifest: Manifest {
                provider: Some(self.provider()),
                sites: BTreeMap::new(),
            },
            ..BatchResult::default()
        };
        for (_, site, outcome) in outcomes {
            let status = match outcome {
                Ok(output) => {
                    for issue in &output.issues {
                        warn!("{}", issue);
                    }
                    let status = SiteStatus::Succeeded {
                        records: output.records.len(),
                        intervals: output.summaries.len(),
                        issues: output.issues.iter().map(ToString::to_string).collect(),
                    };
                    result.summaries.extend(output.summaries);
                    result.records.extend(output.records);
                    status
                }
                Err(e) => {
                    error!("Site {} failed: {}", site.id(), e);
                    SiteStatus::Failed {
                        reason: failure_reason(&e),
                    }
                }
            };
            result.manifest.sites.insert(site.id().to_string(), status);
        }

        info!(
            "Batch finished: {} of {} site(s) succeeded",
            result.manifest.succeeded(),
            registry.len()
        );
        result
    }
}

/// The error message followed by its source chain.
fn failure_reason(e: &AgroClimError) -> String {
    let mut reason = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    reason
}
