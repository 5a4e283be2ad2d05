use chrono::NaiveDate;

/// Daily spend ledger for auto-purchases, passed explicitly into the
/// purchase-decision step. The day rolls over only when the caller says so
/// via [`roll_over`](BudgetLedger::roll_over); nothing in here polls the
/// wall clock.
#[derive(Debug, Clone)]
pub struct BudgetLedger {
    day: NaiveDate,
    spent_usd: f64,
    daily_limit_usd: f64,
    per_product_cap_usd: f64,
    enabled: bool,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BudgetError {
    #[error("auto-purchase is disabled")]
    Disabled,

    #[error("daily budget exhausted: spent ${spent:.2} of ${limit:.2}")]
    DailyBudgetExhausted { spent: f64, limit: f64 },
}

impl BudgetLedger {
    pub fn new(
        day: NaiveDate,
        daily_limit_usd: f64,
        per_product_cap_usd: f64,
        enabled: bool,
    ) -> Self {
        Self {
            day,
            spent_usd: 0.0,
            daily_limit_usd,
            per_product_cap_usd,
            enabled,
        }
    }

    /// Reset the spent counter if `today` crossed a day boundary.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if today != self.day {
            self.day = today;
            self.spent_usd = 0.0;
        }
    }

    /// How much of `cost_usd` may be committed right now. The approved
    /// amount is capped per product and must fit the remaining daily budget.
    pub fn authorize(&self, cost_usd: f64) -> Result<f64, BudgetError> {
        if !self.enabled {
            return Err(BudgetError::Disabled);
        }
        let amount = cost_usd.min(self.per_product_cap_usd);
        if self.spent_usd + amount > self.daily_limit_usd {
            return Err(BudgetError::DailyBudgetExhausted {
                spent: self.spent_usd,
                limit: self.daily_limit_usd,
            });
        }
        Ok(amount)
    }

    /// Book an approved amount against today's budget.
    pub fn record(&mut self, amount_usd: f64) {
        self.spent_usd += amount_usd;
    }

    pub fn spent(&self) -> f64 {
        self.spent_usd
    }

    pub fn remaining(&self) -> f64 {
        (self.daily_limit_usd - self.spent_usd).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[test]
    fn disabled_ledger_authorizes_nothing() {
        let ledger = BudgetLedger::new(day(1), 5000.0, 1000.0, false);
        assert_eq!(ledger.authorize(50.0), Err(BudgetError::Disabled));
    }

    #[test]
    fn approval_is_capped_per_product() {
        let ledger = BudgetLedger::new(day(1), 5000.0, 1000.0, true);
        assert_eq!(ledger.authorize(50.0).unwrap(), 50.0);
        assert_eq!(ledger.authorize(2500.0).unwrap(), 1000.0);
    }

    #[test]
    fn daily_limit_blocks_further_spending() {
        let mut ledger = BudgetLedger::new(day(1), 1200.0, 1000.0, true);
        let amount = ledger.authorize(1000.0).unwrap();
        ledger.record(amount);

        assert_eq!(ledger.remaining(), 200.0);
        assert!(matches!(
            ledger.authorize(500.0),
            Err(BudgetError::DailyBudgetExhausted { .. })
        ));
        // A smaller purchase still fits.
        assert_eq!(ledger.authorize(150.0).unwrap(), 150.0);
    }

    #[test]
    fn roll_over_resets_only_on_a_new_day() {
        let mut ledger = BudgetLedger::new(day(1), 1000.0, 1000.0, true);
        ledger.record(800.0);

        ledger.roll_over(day(1));
        assert_eq!(ledger.spent(), 800.0);

        ledger.roll_over(day(2));
        assert_eq!(ledger.spent(), 0.0);
        assert_eq!(ledger.authorize(900.0).unwrap(), 900.0);
    }
}
