use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::engine::cost::{CostError, CostModel};
use crate::engine::opportunity::{Opportunity, RiskLevel};
use crate::market::types::Observation;

/// ROI cutoffs for the risk tag. Heuristic configuration, not a model:
/// spreads that look extreme usually hide a listing mismatch or a cost the
/// estimate misses.
#[derive(Debug, Clone, Copy)]
pub struct RiskThresholds {
    pub high_roi: f64,
    pub medium_roi: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_roi: 500.0,
            medium_roi: 200.0,
        }
    }
}

impl RiskThresholds {
    fn classify(&self, roi: f64) -> RiskLevel {
        if roi > self.high_roi {
            RiskLevel::High
        } else if roi > self.medium_roi {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Result of one calculator pass over a product's observations. Skip counts
/// surface in the scan report so silent ROI gaps stay visible.
#[derive(Debug, Default)]
pub struct Batch {
    pub opportunities: Vec<Opportunity>,
    pub unknown_currency_skips: u32,
    pub invalid_input_skips: u32,
}

/// Pairs source observations against target observations, applies the cost
/// model, filters by minimum ROI and emits ranked, deduplicated
/// opportunities. Pure and synchronous; safe to call from any task.
pub struct OpportunityCalculator {
    cost_model: CostModel,
    thresholds: RiskThresholds,
}

struct Candidate {
    opportunity: Opportunity,
    target_observed_at: DateTime<Utc>,
}

impl OpportunityCalculator {
    pub fn new(cost_model: CostModel, thresholds: RiskThresholds) -> Self {
        Self {
            cost_model,
            thresholds,
        }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Compute every opportunity for one product query that clears `min_roi`.
    ///
    /// `created_at` stamps the emitted opportunities; callers pass the scan
    /// timestamp so repeated runs over the same inputs are value-identical.
    pub fn compute(
        &self,
        product_name: &str,
        observations: &[Observation],
        min_roi: f64,
        created_at: DateTime<Utc>,
    ) -> Batch {
        let mut batch = Batch::default();

        let mut sources: Vec<&Observation> = Vec::new();
        let mut targets: Vec<&Observation> = Vec::new();
        for obs in observations {
            match self.cost_model.profile(&obs.platform) {
                Some(profile) => {
                    if profile.role.is_source() {
                        sources.push(obs);
                    }
                    if profile.role.is_target() {
                        targets.push(obs);
                    }
                }
                None => {
                    warn!("no profile for platform '{}', skipping listing", obs.platform);
                    batch.invalid_input_skips += 1;
                }
            }
        }

        // Collect passing pairs in pairing order; ranking below is stable,
        // so equal-ROI entries keep this order.
        let mut candidates: Vec<Candidate> = Vec::new();
        for source in &sources {
            for target in &targets {
                if source.platform == target.platform {
                    continue;
                }
                let breakdown = match self.cost_model.estimate(source, target) {
                    Ok(b) => b,
                    Err(CostError::UnknownCurrency(e)) => {
                        warn!("skipping pair: {}", e);
                        batch.unknown_currency_skips += 1;
                        continue;
                    }
                    Err(CostError::InvalidInput(reason)) => {
                        warn!("skipping pair: {}", reason);
                        batch.invalid_input_skips += 1;
                        continue;
                    }
                };
                if breakdown.net_profit <= 0.0 || breakdown.roi_percentage < min_roi {
                    continue;
                }

                let shipping_days = self
                    .cost_model
                    .profile(&source.platform)
                    .map(|p| p.avg_shipping_days)
                    .unwrap_or(0);

                candidates.push(Candidate {
                    opportunity: Opportunity {
                        product_name: product_name.to_string(),
                        source_platform: source.platform.clone(),
                        source_price: source.price,
                        source_currency: source.currency.clone(),
                        source_url: source.url.clone(),
                        target_platform: target.platform.clone(),
                        target_price: target.price,
                        target_currency: target.currency.clone(),
                        target_url: target.url.clone(),
                        source_price_usd: breakdown.source_price_usd,
                        target_price_usd: breakdown.target_price_usd,
                        shipping_cost: breakdown.shipping_cost,
                        import_duty: breakdown.import_duty,
                        platform_fee: breakdown.platform_fee,
                        payment_processing: breakdown.payment_processing,
                        total_cost: breakdown.total_cost,
                        net_profit: breakdown.net_profit,
                        roi_percentage: breakdown.roi_percentage,
                        risk_level: self.thresholds.classify(breakdown.roi_percentage),
                        estimated_shipping_days: shipping_days,
                        created_at,
                        confidence_score: None,
                        category: None,
                        insight: None,
                    },
                    target_observed_at: target.observed_at,
                });
            }
        }

        let mut opportunities = dedup_per_platform_pair(candidates);
        opportunities.sort_by(|a, b| {
            b.roi_percentage
                .partial_cmp(&a.roi_percentage)
                .unwrap_or(Ordering::Equal)
        });

        debug!(
            "'{}': {} observations -> {} opportunities (min ROI {}%)",
            product_name,
            observations.len(),
            opportunities.len(),
            min_roi
        );

        batch.opportunities = opportunities;
        batch
    }
}

/// One best listing to buy and one best listing to sell into per platform
/// pair: keep only the highest-ROI candidate per (source, target) key, ties
/// broken by the earliest-observed target listing.
fn dedup_per_platform_pair(candidates: Vec<Candidate>) -> Vec<Opportunity> {
    let mut kept: Vec<Candidate> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for candidate in candidates {
        let key = (
            candidate.opportunity.source_platform.clone(),
            candidate.opportunity.target_platform.clone(),
        );
        match index.get(&key) {
            None => {
                index.insert(key, kept.len());
                kept.push(candidate);
            }
            Some(&i) => {
                let current = &kept[i];
                let better = candidate.opportunity.roi_percentage
                    > current.opportunity.roi_percentage
                    || (candidate.opportunity.roi_percentage
                        == current.opportunity.roi_percentage
                        && candidate.target_observed_at < current.target_observed_at);
                if better {
                    kept[i] = candidate;
                }
            }
        }
    }

    kept.into_iter().map(|c| c.opportunity).collect()
}
