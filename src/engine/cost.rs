use std::collections::HashMap;

use crate::market::rates::{CurrencyTable, UnknownCurrency};
use crate::market::types::{Observation, PlatformProfile};

/// Default import duty applied to the source price (EU/US estimate).
pub const DEFAULT_DUTY_RATE: f64 = 0.10;

#[derive(Debug, thiserror::Error)]
pub enum CostError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    UnknownCurrency(#[from] UnknownCurrency),
}

/// Landed-cost estimate for one (source, target) price pair, all in USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub source_price_usd: f64,
    pub target_price_usd: f64,
    pub shipping_cost: f64,
    pub import_duty: f64,
    pub platform_fee: f64,
    pub payment_processing: f64,
    pub total_cost: f64,
    pub net_profit: f64,
    pub roi_percentage: f64,
}

/// Pure cost estimator over static configuration: currency table, platform
/// profiles and the duty rate. No side effects.
#[derive(Debug, Clone)]
pub struct CostModel {
    rates: CurrencyTable,
    platforms: HashMap<String, PlatformProfile>,
    duty_rate: f64,
}

impl CostModel {
    pub fn new(
        rates: CurrencyTable,
        platforms: HashMap<String, PlatformProfile>,
        duty_rate: f64,
    ) -> Self {
        Self {
            rates,
            platforms,
            duty_rate,
        }
    }

    pub fn profile(&self, platform: &str) -> Option<&PlatformProfile> {
        self.platforms.get(platform)
    }

    /// Estimate the landed cost of buying `source` and selling at `target`.
    ///
    /// ROI is always computed on cost of goods (the source price), never on
    /// the selling price, so it means the same thing at every call site.
    pub fn estimate(
        &self,
        source: &Observation,
        target: &Observation,
    ) -> Result<CostBreakdown, CostError> {
        // Observations cannot be built with non-positive prices, but the
        // contract of this entry point does not depend on who built them.
        for obs in [source, target] {
            if !(obs.price > 0.0) {
                return Err(CostError::InvalidInput(format!(
                    "non-positive price {} on {}",
                    obs.price, obs.platform
                )));
            }
        }

        let source_profile = self.profile(&source.platform).ok_or_else(|| {
            CostError::InvalidInput(format!("no profile for platform '{}'", source.platform))
        })?;
        let target_profile = self.profile(&target.platform).ok_or_else(|| {
            CostError::InvalidInput(format!("no profile for platform '{}'", target.platform))
        })?;

        let source_price_usd = self.rates.to_usd(source.price, &source.currency)?;
        let target_price_usd = self.rates.to_usd(target.price, &target.currency)?;

        let shipping_cost = source_price_usd * source_profile.shipping_fraction;
        let import_duty = source_price_usd * self.duty_rate;
        let platform_fee = target_price_usd * target_profile.fee_fraction;
        let payment_processing = target_price_usd * target_profile.payment_fraction;

        let total_cost =
            source_price_usd + shipping_cost + import_duty + platform_fee + payment_processing;
        let net_profit = target_price_usd - total_cost;
        let roi_percentage = round2(net_profit / source_price_usd * 100.0);

        Ok(CostBreakdown {
            source_price_usd,
            target_price_usd,
            shipping_cost,
            import_duty,
            platform_fee,
            payment_processing,
            total_cost,
            net_profit,
            roi_percentage,
        })
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types::Role;
    use chrono::Utc;

    fn profile(currency: &str, fee: f64, shipping: f64, role: Role) -> PlatformProfile {
        PlatformProfile {
            currency: currency.to_string(),
            fee_fraction: fee,
            payment_fraction: 0.03,
            shipping_fraction: shipping,
            avg_shipping_days: 15,
            reliability_score: 0.85,
            role,
            search_url: None,
        }
    }

    fn model() -> CostModel {
        let rates = CurrencyTable::new(HashMap::from([
            ("EUR_USD".to_string(), 1.09),
            ("GBP_USD".to_string(), 1.27),
        ]));
        let platforms = HashMap::from([
            ("aliexpress".to_string(), profile("USD", 0.0, 0.10, Role::Source)),
            ("amazon_us".to_string(), profile("USD", 0.15, 0.05, Role::Both)),
            ("amazon_de".to_string(), profile("EUR", 0.15, 0.03, Role::Target)),
        ]);
        CostModel::new(rates, platforms, DEFAULT_DUTY_RATE)
    }

    fn obs(platform: &str, price: f64, currency: &str) -> Observation {
        Observation::new(platform, "USB-C Cable", price, currency, "", Utc::now()).unwrap()
    }

    #[test]
    fn worked_example_ten_to_forty_usd() {
        // $10 source, $40 target, shipping 10%, duty 10%, fee 15%, payment 3%:
        // total = 10 + 1 + 1 + 6 + 1.20 = 19.20, net = 20.80, ROI = 208.0
        let b = model()
            .estimate(&obs("aliexpress", 10.0, "USD"), &obs("amazon_us", 40.0, "USD"))
            .unwrap();

        assert!((b.total_cost - 19.20).abs() < 1e-9);
        assert!((b.net_profit - 20.80).abs() < 1e-9);
        assert_eq!(b.roi_percentage, 208.0);
    }

    #[test]
    fn foreign_target_price_is_converted_first() {
        let b = model()
            .estimate(&obs("aliexpress", 10.0, "USD"), &obs("amazon_de", 40.0, "EUR"))
            .unwrap();

        assert!((b.target_price_usd - 43.6).abs() < 1e-9);
        let recomputed = round2(b.net_profit / b.source_price_usd * 100.0);
        assert_eq!(b.roi_percentage, recomputed);
    }

    #[test]
    fn unknown_currency_is_an_error_not_a_passthrough() {
        let err = model()
            .estimate(&obs("aliexpress", 10.0, "JPY"), &obs("amazon_us", 40.0, "USD"))
            .unwrap_err();
        assert!(matches!(err, CostError::UnknownCurrency(_)));
    }

    #[test]
    fn missing_profile_is_invalid_input() {
        let err = model()
            .estimate(&obs("dhgate", 10.0, "USD"), &obs("amazon_us", 40.0, "USD"))
            .unwrap_err();
        assert!(matches!(err, CostError::InvalidInput(_)));
    }

    #[test]
    fn roi_is_on_cost_of_goods() {
        let b = model()
            .estimate(&obs("aliexpress", 20.0, "USD"), &obs("amazon_us", 40.0, "USD"))
            .unwrap();
        // total = 20 + 2 + 2 + 6 + 1.2 = 31.20, net = 8.80, ROI on $20 = 44%
        assert_eq!(b.roi_percentage, 44.0);
    }
}
