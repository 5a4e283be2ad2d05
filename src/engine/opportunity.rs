use chrono::{DateTime, Utc};
use serde::Serialize;

/// Heuristic risk tag derived from the ROI thresholds in config. A ROI that
/// looks too good usually prices in shipping time, quality or listing-match
/// uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A buy-here/sell-there pair projected to be profitable after estimated
/// costs. Created by the calculator, immutable afterwards except for the
/// optional enrichment fields collaborators attach before reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub product_name: String,

    pub source_platform: String,
    pub source_price: f64,
    pub source_currency: String,
    pub source_url: String,

    pub target_platform: String,
    pub target_price: f64,
    pub target_currency: String,
    pub target_url: String,

    // Cost breakdown, all in USD.
    pub source_price_usd: f64,
    pub target_price_usd: f64,
    pub shipping_cost: f64,
    pub import_duty: f64,
    pub platform_fee: f64,
    pub payment_processing: f64,
    pub total_cost: f64,

    pub net_profit: f64,
    /// Net profit over cost of goods (source price), as a percentage,
    /// rounded to two decimals.
    pub roi_percentage: f64,
    pub risk_level: RiskLevel,
    pub estimated_shipping_days: u32,
    pub created_at: DateTime<Utc>,

    // Enrichment, attached after creation.
    pub confidence_score: Option<f64>,
    pub category: Option<String>,
    pub insight: Option<String>,
}
