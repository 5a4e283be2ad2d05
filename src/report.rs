use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::cost::round2;
use crate::engine::opportunity::Opportunity;

/// Bucket for opportunities whose external tagger attached no category.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStats {
    pub count: u32,
    pub average_roi: f64,
    pub total_profit: f64,
}

/// Aggregate summary of one scan pass. Read-only once returned; serializes
/// to a plain record for transport.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub products_scanned: u32,
    pub total_observations: u32,
    pub total_opportunities: u32,
    pub best_opportunity: Option<Opportunity>,
    pub per_category_stats: HashMap<String, CategoryStats>,
    /// Sum of estimated net profits. A theoretical upper bound on what the
    /// scan surfaced, not a guarantee of realizable profit.
    pub total_potential_profit: f64,
    pub unknown_currency_skips: u32,
    pub invalid_input_skips: u32,
    pub fetch_failures: u32,
}

impl ScanReport {
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            products_scanned: 0,
            total_observations: 0,
            total_opportunities: 0,
            best_opportunity: None,
            per_category_stats: HashMap::new(),
            total_potential_profit: 0.0,
            unknown_currency_skips: 0,
            invalid_input_skips: 0,
            fetch_failures: 0,
        }
    }

    pub fn average_roi(&self) -> f64 {
        if self.total_opportunities == 0 {
            return 0.0;
        }
        let total: f64 = self
            .per_category_stats
            .values()
            .map(|s| s.average_roi * s.count as f64)
            .sum();
        total / self.total_opportunities as f64
    }
}

/// Reduce an opportunity list into a [`ScanReport`]. Never fails; an empty
/// input produces an all-zero report. The orchestrator stamps observation
/// and failure counts afterwards.
pub fn summarize(opportunities: &[Opportunity]) -> ScanReport {
    let mut report = ScanReport::empty();
    report.total_opportunities = opportunities.len() as u32;
    report.total_potential_profit = opportunities.iter().map(|o| o.net_profit).sum();
    report.best_opportunity = opportunities
        .iter()
        .max_by(|a, b| compare_for_best(a, b))
        .cloned();

    let mut roi_sums: HashMap<String, f64> = HashMap::new();
    for o in opportunities {
        let category = o.category.as_deref().unwrap_or(UNCATEGORIZED).to_string();
        let stats = report.per_category_stats.entry(category.clone()).or_default();
        stats.count += 1;
        stats.total_profit += o.net_profit;
        *roi_sums.entry(category).or_default() += o.roi_percentage;
    }
    for (category, stats) in report.per_category_stats.iter_mut() {
        stats.average_roi = round2(roi_sums[category] / stats.count as f64);
    }

    report
}

/// Best = highest ROI, ties broken by higher net profit, further ties by
/// earliest creation.
fn compare_for_best(a: &Opportunity, b: &Opportunity) -> Ordering {
    a.roi_percentage
        .partial_cmp(&b.roi_percentage)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            a.net_profit
                .partial_cmp(&b.net_profit)
                .unwrap_or(Ordering::Equal)
        })
        // max_by keeps the later element on Ordering::Equal, so an earlier
        // created_at must compare as Greater.
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::opportunity::RiskLevel;
    use chrono::Duration;

    fn opp(roi: f64, profit: f64, category: Option<&str>, created_at: DateTime<Utc>) -> Opportunity {
        Opportunity {
            product_name: "USB-C Cables".to_string(),
            source_platform: "aliexpress".to_string(),
            source_price: 10.0,
            source_currency: "USD".to_string(),
            source_url: String::new(),
            target_platform: "amazon_us".to_string(),
            target_price: 40.0,
            target_currency: "USD".to_string(),
            target_url: String::new(),
            source_price_usd: 10.0,
            target_price_usd: 40.0,
            shipping_cost: 1.0,
            import_duty: 1.0,
            platform_fee: 6.0,
            payment_processing: 1.2,
            total_cost: 40.0 - profit,
            net_profit: profit,
            roi_percentage: roi,
            risk_level: RiskLevel::Medium,
            estimated_shipping_days: 15,
            created_at,
            confidence_score: None,
            category: category.map(str::to_string),
            insight: None,
        }
    }

    #[test]
    fn empty_input_gives_zero_report_without_failing() {
        let report = summarize(&[]);
        assert_eq!(report.total_opportunities, 0);
        assert!(report.best_opportunity.is_none());
        assert_eq!(report.total_potential_profit, 0.0);
        assert!(report.per_category_stats.is_empty());
    }

    #[test]
    fn best_picks_highest_roi_first() {
        let now = Utc::now();
        let report = summarize(&[opp(150.0, 30.0, None, now), opp(208.0, 20.8, None, now)]);
        assert_eq!(report.best_opportunity.unwrap().roi_percentage, 208.0);
    }

    #[test]
    fn best_roi_tie_breaks_on_profit_then_recency() {
        let now = Utc::now();
        let earlier = now - Duration::minutes(5);

        // Equal ROI: higher absolute profit wins.
        let report = summarize(&[opp(200.0, 20.0, None, now), opp(200.0, 35.0, None, now)]);
        assert_eq!(report.best_opportunity.unwrap().net_profit, 35.0);

        // Equal ROI and profit: earliest created_at wins.
        let report = summarize(&[opp(200.0, 20.0, None, now), opp(200.0, 20.0, None, earlier)]);
        assert_eq!(report.best_opportunity.unwrap().created_at, earlier);
    }

    #[test]
    fn untagged_opportunities_land_in_the_uncategorized_bucket() {
        let now = Utc::now();
        let report = summarize(&[
            opp(200.0, 20.0, Some("electronics"), now),
            opp(300.0, 30.0, Some("electronics"), now),
            opp(150.0, 15.0, None, now),
        ]);

        let electronics = &report.per_category_stats["electronics"];
        assert_eq!(electronics.count, 2);
        assert_eq!(electronics.average_roi, 250.0);
        assert!((electronics.total_profit - 50.0).abs() < 1e-9);

        let uncategorized = &report.per_category_stats[UNCATEGORIZED];
        assert_eq!(uncategorized.count, 1);
        assert_eq!(report.total_opportunities, 3);
        assert!((report.total_potential_profit - 65.0).abs() < 1e-9);
    }

    #[test]
    fn average_roi_spans_all_categories() {
        let now = Utc::now();
        let report = summarize(&[
            opp(100.0, 10.0, Some("home"), now),
            opp(300.0, 30.0, Some("fitness"), now),
        ]);
        assert_eq!(report.average_roi(), 200.0);
    }

    #[test]
    fn report_serializes_to_a_plain_record() {
        let report = summarize(&[opp(208.0, 20.8, Some("electronics"), Utc::now())]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["total_opportunities"], 1);
        assert_eq!(value["best_opportunity"]["roi_percentage"], 208.0);
        assert!(value["per_category_stats"]["electronics"]["count"].is_number());
    }
}
