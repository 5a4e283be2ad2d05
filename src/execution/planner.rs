use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::engine::opportunity::Opportunity;
use crate::execution::budget::{BudgetError, BudgetLedger};
use crate::execution::types::{Transaction, TransactionStatus};

#[derive(Debug, thiserror::Error)]
pub enum Decline {
    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error("confidence {actual:.2} below minimum {minimum:.2}")]
    BelowConfidence { actual: f64, minimum: f64 },
}

/// Turns an opportunity the caller wants to act on into a pending
/// transaction, after the confidence gate and the budget ledger both agree.
/// Deterministic: whether a purchase later fills is the sink's problem, not
/// a simulated coin flip here.
pub struct PurchasePlanner {
    min_confidence: f64,
}

impl PurchasePlanner {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    pub fn decide(
        &self,
        opportunity: &Opportunity,
        ledger: &mut BudgetLedger,
        today: NaiveDate,
    ) -> Result<Transaction, Decline> {
        ledger.roll_over(today);

        let confidence = opportunity.confidence_score.unwrap_or(0.0);
        if confidence < self.min_confidence {
            return Err(Decline::BelowConfidence {
                actual: confidence,
                minimum: self.min_confidence,
            });
        }

        let amount_usd = ledger.authorize(opportunity.source_price_usd)?;
        ledger.record(amount_usd);

        info!(
            "approved ${:.2} for '{}' ({} -> {}, {:.1}% ROI)",
            amount_usd,
            opportunity.product_name,
            opportunity.source_platform,
            opportunity.target_platform,
            opportunity.roi_percentage
        );

        Ok(Transaction {
            id: None,
            product_name: opportunity.product_name.clone(),
            source_platform: opportunity.source_platform.clone(),
            target_platform: opportunity.target_platform.clone(),
            source_price: opportunity.source_price_usd,
            target_price: opportunity.target_price_usd,
            amount_usd,
            expected_profit: opportunity.net_profit,
            roi_percentage: opportunity.roi_percentage,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        })
    }
}
