use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::{Config, ProductSpec, ScanConfig};
use crate::engine::calculator::{OpportunityCalculator, RiskThresholds};
use crate::engine::cost::CostModel;
use crate::engine::opportunity::Opportunity;
use crate::market::cache::ObservationCache;
use crate::market::producer::{FetchError, ObservationProducer};
use crate::market::rates::CurrencyTable;
use crate::market::types::Observation;
use crate::report::{summarize, ScanReport};

/// Drives one pass over the configured product list: fetch observations for
/// every platform, hand each product's complete set to the calculator, then
/// summarize. The only component here that performs I/O.
pub struct ScanOrchestrator {
    scan: ScanConfig,
    platform_ids: Vec<String>,
    calculator: OpportunityCalculator,
    producer: Arc<dyn ObservationProducer>,
    cache: ObservationCache,
    fetch_slots: Arc<Semaphore>,
}

impl ScanOrchestrator {
    pub fn new(config: &Config, producer: Arc<dyn ObservationProducer>) -> Self {
        // Stable platform order keeps scans reproducible run to run.
        let mut platform_ids: Vec<String> = config.platforms.keys().cloned().collect();
        platform_ids.sort();

        let cost_model = CostModel::new(
            CurrencyTable::new(config.rates.clone()),
            config.platforms.clone(),
            config.scan.duty_rate,
        );
        let thresholds = RiskThresholds {
            high_roi: config.risk.high_roi_threshold,
            medium_roi: config.risk.medium_roi_threshold,
        };

        Self {
            scan: config.scan.clone(),
            platform_ids,
            calculator: OpportunityCalculator::new(cost_model, thresholds),
            producer,
            cache: ObservationCache::new(Duration::from_secs(config.scan.cache_ttl_secs)),
            fetch_slots: Arc::new(Semaphore::new(config.scan.max_concurrent_fetches.max(1))),
        }
    }

    /// Run one scan over the configured products.
    pub async fn run(&self) -> ScanReport {
        self.run_detailed().await.0
    }

    /// Like [`run`](Self::run), but also hands back the full opportunity
    /// list for sinks that consume individual records (CSV log, purchase
    /// planner).
    pub async fn run_detailed(&self) -> (ScanReport, Vec<Opportunity>) {
        let products = self.scan.products.clone();
        self.run_products(&products, self.scan.min_roi).await
    }

    pub async fn run_products(
        &self,
        products: &[ProductSpec],
        min_roi: f64,
    ) -> (ScanReport, Vec<Opportunity>) {
        let scan_started = Utc::now();
        let mut all_opportunities: Vec<Opportunity> = Vec::new();
        let mut total_observations = 0u32;
        let mut unknown_currency_skips = 0u32;
        let mut invalid_input_skips = 0u32;
        let mut fetch_failures = 0u32;

        for (i, product) in products.iter().enumerate() {
            if i > 0 && self.scan.fetch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.scan.fetch_delay_ms)).await;
            }
            info!("scanning '{}'", product.name);

            let (observations, failures) = self.collect_observations(&product.name).await;
            fetch_failures += failures;
            total_observations += observations.len() as u32;
            if observations.is_empty() {
                info!("'{}': no observations, nothing to rank", product.name);
                continue;
            }

            let mut batch =
                self.calculator
                    .compute(&product.name, &observations, min_roi, scan_started);
            unknown_currency_skips += batch.unknown_currency_skips;
            invalid_input_skips += batch.invalid_input_skips;

            for opportunity in &mut batch.opportunities {
                opportunity.category = product.category.clone();
                opportunity.confidence_score = self
                    .calculator
                    .cost_model()
                    .profile(&opportunity.source_platform)
                    .map(|p| p.reliability_score);
                opportunity.insight = crate::insight::annotate(opportunity);
            }
            info!(
                "'{}': {} opportunities above {}% ROI",
                product.name,
                batch.opportunities.len(),
                min_roi
            );
            all_opportunities.extend(batch.opportunities);
        }

        let mut report = summarize(&all_opportunities);
        report.generated_at = scan_started;
        report.products_scanned = products.len() as u32;
        report.total_observations = total_observations;
        report.unknown_currency_skips += unknown_currency_skips;
        report.invalid_input_skips += invalid_input_skips;
        report.fetch_failures = fetch_failures;

        (report, all_opportunities)
    }

    /// Fetch one product across every configured platform concurrently.
    ///
    /// Each fetch gets its own timeout; a timed-out or failed platform is a
    /// zero-result failure and never cancels its siblings. Results drain
    /// back into this task only, and the product's set is complete before
    /// the caller ranks it.
    async fn collect_observations(&self, product: &str) -> (Vec<Observation>, u32) {
        let timeout = Duration::from_secs(self.scan.fetch_timeout_secs);
        let use_cache = self.scan.cache_ttl_secs > 0;

        let mut handles = Vec::new();
        let mut observations: Vec<Observation> = Vec::new();
        let mut failures = 0u32;

        for platform in &self.platform_ids {
            if use_cache {
                if let Some(cached) = self.cache.get(product, platform) {
                    observations.extend(cached);
                    continue;
                }
            }

            let producer = Arc::clone(&self.producer);
            let slots = Arc::clone(&self.fetch_slots);
            let product = product.to_string();
            let platform = platform.clone();
            handles.push(tokio::spawn(async move {
                let _permit = slots.acquire_owned().await.ok();
                let outcome =
                    match tokio::time::timeout(timeout, producer.fetch(&product, &platform)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(FetchError::Timeout(platform.clone())),
                    };
                (platform, outcome)
            }));
        }

        for handle in futures::future::join_all(handles).await {
            match handle {
                Ok((platform, Ok(batch))) => {
                    if use_cache {
                        self.cache.insert(product, &platform, batch.clone());
                    }
                    observations.extend(batch);
                }
                Ok((platform, Err(e))) => {
                    warn!("'{}' on {}: {}", product, platform, e);
                    failures += 1;
                }
                Err(e) => {
                    warn!("fetch task for '{}' aborted: {}", product, e);
                    failures += 1;
                }
            }
        }

        (observations, failures)
    }
}
