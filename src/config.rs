use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::market::rates::CurrencyTable;
use crate::market::types::PlatformProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scan: ScanConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Currency conversion table keyed "FROM_TO".
    pub rates: HashMap<String, f64>,
    pub platforms: HashMap<String, PlatformProfile>,
}

/// A product to scan, with the category its opportunities are tagged with.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSpec {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub products: Vec<ProductSpec>,
    pub min_roi: f64,
    #[serde(default = "default_duty_rate")]
    pub duty_rate: f64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Spacing between product scans; how we stay polite with producers.
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_high_roi_threshold")]
    pub high_roi_threshold: f64,
    #[serde(default = "default_medium_roi_threshold")]
    pub medium_roi_threshold: f64,
    #[serde(default = "default_daily_budget")]
    pub daily_budget_usd: f64,
    #[serde(default = "default_max_investment")]
    pub max_investment_per_product_usd: f64,
    #[serde(default)]
    pub auto_purchase_enabled: bool,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_log_path")]
    pub csv_log_path: String,
}

fn default_duty_rate() -> f64 {
    crate::engine::cost::DEFAULT_DUTY_RATE
}
fn default_fetch_timeout_secs() -> u64 {
    20
}
fn default_fetch_delay_ms() -> u64 {
    1000
}
fn default_max_concurrent_fetches() -> usize {
    4
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_high_roi_threshold() -> f64 {
    500.0
}
fn default_medium_roi_threshold() -> f64 {
    200.0
}
fn default_daily_budget() -> f64 {
    5000.0
}
fn default_max_investment() -> f64 {
    1000.0
}
fn default_min_confidence() -> f64 {
    0.7
}
fn default_database_path() -> String {
    "spreadscout.db".to_string()
}
fn default_csv_log_path() -> String {
    "opportunities.csv".to_string()
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_roi_threshold: default_high_roi_threshold(),
            medium_roi_threshold: default_medium_roi_threshold(),
            daily_budget_usd: default_daily_budget(),
            max_investment_per_product_usd: default_max_investment(),
            auto_purchase_enabled: false,
            min_confidence: default_min_confidence(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scan.min_roi.is_finite() || self.scan.min_roi < 0.0 {
            anyhow::bail!("scan.min_roi = {} must be a non-negative number", self.scan.min_roi);
        }
        if !(0.0..1.0).contains(&self.scan.duty_rate) {
            anyhow::bail!("scan.duty_rate = {} outside [0, 1)", self.scan.duty_rate);
        }
        if self.risk.medium_roi_threshold >= self.risk.high_roi_threshold {
            anyhow::bail!(
                "risk thresholds out of order: medium {} >= high {}",
                self.risk.medium_roi_threshold,
                self.risk.high_roi_threshold
            );
        }
        for (platform, profile) in &self.platforms {
            profile.validate(platform)?;
        }
        CurrencyTable::new(self.rates.clone()).validate()?;
        Ok(())
    }
}

/// Environment overrides, loaded from the process environment and `.env`.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub database_path: Option<String>,
    pub min_roi: Option<f64>,
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let min_roi = match std::env::var("SPREADSCOUT_MIN_ROI") {
            Ok(raw) => Some(
                raw.parse::<f64>()
                    .with_context(|| format!("SPREADSCOUT_MIN_ROI = '{}' is not a number", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            database_path: std::env::var("SPREADSCOUT_DB_PATH").ok(),
            min_roi,
        })
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.database_path {
            config.system.database_path = path.clone();
        }
        if let Some(min_roi) = self.min_roi {
            config.scan.min_roi = min_roi;
        }
    }
}
