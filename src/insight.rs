//! Canned report commentary. A static keyword table and fixed ROI bands;
//! no model, no randomness.

use crate::engine::opportunity::{Opportunity, RiskLevel};
use crate::report::ScanReport;

/// Keyword-dispatched answers for the help surface. First matching entry
/// wins; longest keywords first so "roi" does not shadow "minimum roi".
const RESPONSES: &[(&[&str], &str)] = &[
    (
        &["minimum roi", "min roi", "threshold"],
        "The scanner only reports pairs whose estimated ROI clears the configured minimum. \
         Raise it for fewer, stronger candidates; lower it to widen the net.",
    ),
    (
        &["roi", "return"],
        "ROI is net profit divided by the source price (cost of goods), as a percentage. \
         It is never computed on the selling price.",
    ),
    (
        &["risk"],
        "Risk levels come from ROI thresholds: spreads above the high cutoff are tagged HIGH \
         because extreme margins usually hide a mismatch or a missing cost.",
    ),
    (
        &["cost", "fee", "duty", "shipping"],
        "Landed cost = source price + inbound shipping + import duty + marketplace fee + \
         payment processing, all estimated in USD. These are estimates, not quotes.",
    ),
    (
        &["currency", "exchange"],
        "Prices convert through the configured rate table. A currency pair missing from the \
         table fails the pair loudly instead of being treated as USD.",
    ),
    (
        &["budget", "spend"],
        "Auto-purchases draw from a daily budget ledger with a per-product cap; the counter \
         resets when the caller rolls the ledger over to a new day.",
    ),
];

const FALLBACK: &str =
    "Ask about roi, risk, costs, currency conversion or the purchase budget.";

pub fn respond(question: &str) -> &'static str {
    let question = question.to_lowercase();
    for (keywords, answer) in RESPONSES {
        if keywords.iter().any(|k| question.contains(k)) {
            return answer;
        }
    }
    FALLBACK
}

/// Optional per-opportunity note, attached during scan enrichment.
pub fn annotate(opportunity: &Opportunity) -> Option<String> {
    match opportunity.risk_level {
        RiskLevel::High => Some(format!(
            "ROI of {:.0}% is above the high-risk cutoff; verify the {} listing actually \
             matches before buying.",
            opportunity.roi_percentage, opportunity.source_platform
        )),
        RiskLevel::Medium if opportunity.estimated_shipping_days > 10 => Some(format!(
            "Solid spread, but roughly {} days of inbound shipping leaves time for the \
             target price to move.",
            opportunity.estimated_shipping_days
        )),
        _ => None,
    }
}

/// One-line commentary for a finished scan, banded on average ROI.
pub fn recommendation(report: &ScanReport) -> String {
    if report.total_opportunities == 0 {
        return "No opportunities cleared the ROI threshold. Consider widening the product \
                list or lowering the minimum ROI."
            .to_string();
    }

    let avg_roi = report.average_roi();
    let best_category = report
        .per_category_stats
        .iter()
        .max_by_key(|(_, stats)| stats.count)
        .map(|(category, _)| category.as_str())
        .unwrap_or(crate::report::UNCATEGORIZED);

    if avg_roi > 400.0 {
        format!(
            "Average ROI of {:.0}% is unusually high; '{}' leads by volume. Verify listing \
             matches before committing budget.",
            avg_roi, best_category
        )
    } else if avg_roi > 200.0 {
        format!(
            "Strong spreads with an average ROI of {:.0}%. '{}' has the most candidates.",
            avg_roi, best_category
        )
    } else {
        format!(
            "Solid opportunities averaging {:.0}% ROI, concentrated in '{}'.",
            avg_roi, best_category
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{summarize, CategoryStats};

    #[test]
    fn keyword_dispatch_is_case_insensitive() {
        assert!(respond("How is ROI calculated?").contains("net profit"));
        assert!(respond("what about RISK levels").contains("thresholds"));
        assert_eq!(respond("tell me a joke"), FALLBACK);
    }

    #[test]
    fn specific_keywords_win_over_general_ones() {
        assert!(respond("what is the minimum roi?").contains("configured minimum"));
    }

    #[test]
    fn annotation_flags_high_risk_and_slow_shipping() {
        use chrono::Utc;

        let mut opportunity = Opportunity {
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
            total_cost: 19.2,
            net_profit: 20.8,
            roi_percentage: 208.0,
            risk_level: RiskLevel::Medium,
            estimated_shipping_days: 15,
            created_at: Utc::now(),
            confidence_score: None,
            category: None,
            insight: None,
        };
        assert!(annotate(&opportunity).unwrap().contains("15 days"));

        opportunity.risk_level = RiskLevel::High;
        assert!(annotate(&opportunity).unwrap().contains("high-risk"));

        opportunity.risk_level = RiskLevel::Low;
        assert!(annotate(&opportunity).is_none());
    }

    #[test]
    fn recommendation_handles_the_empty_report() {
        let report = summarize(&[]);
        assert!(recommendation(&report).contains("No opportunities"));
    }

    #[test]
    fn recommendation_bands_on_average_roi() {
        let mut report = summarize(&[]);
        report.total_opportunities = 2;
        report.per_category_stats.insert(
            "electronics".to_string(),
            CategoryStats {
                count: 2,
                average_roi: 450.0,
                total_profit: 80.0,
            },
        );
        assert!(recommendation(&report).contains("unusually high"));

        report
            .per_category_stats
            .get_mut("electronics")
            .unwrap()
            .average_roi = 250.0;
        assert!(recommendation(&report).contains("Strong spreads"));
    }
}
