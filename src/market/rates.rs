use std::collections::HashMap;

pub const BASE_CURRENCY: &str = "USD";

#[derive(Debug, thiserror::Error)]
#[error("no conversion rate configured for {from}_{to}")]
pub struct UnknownCurrency {
    pub from: String,
    pub to: String,
}

/// Configured currency conversion table keyed `"FROM_TO"`, e.g. `"EUR_USD"`.
///
/// An unknown pair is an explicit failure. The table never falls back to
/// treating a foreign price as already-USD: a silent gap here would show up
/// later as a wrong ROI, not as an error.
#[derive(Debug, Clone)]
pub struct CurrencyTable {
    rates: HashMap<String, f64>,
}

impl CurrencyTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    pub fn rate(&self, from: &str, to: &str) -> Result<f64, UnknownCurrency> {
        if from == to {
            return Ok(1.0);
        }
        self.rates
            .get(&format!("{}_{}", from, to))
            .copied()
            .ok_or_else(|| UnknownCurrency {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Convert a price into USD.
    pub fn to_usd(&self, price: f64, currency: &str) -> Result<f64, UnknownCurrency> {
        Ok(price * self.rate(currency, BASE_CURRENCY)?)
    }

    /// Every configured rate must be positive to be usable as a multiplier,
    /// and where both directions of a pair are present they must agree:
    /// converting A -> B -> A may drift at most 0.01%.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (pair, rate) in &self.rates {
            if !(*rate > 0.0) || !rate.is_finite() {
                anyhow::bail!("currency rate {} = {} is not positive", pair, rate);
            }
            let Some((from, to)) = pair.split_once('_') else {
                anyhow::bail!("currency rate key '{}' is not of the form FROM_TO", pair);
            };
            if let Some(reverse) = self.rates.get(&format!("{}_{}", to, from)) {
                let drift = (rate * reverse - 1.0).abs();
                if drift > 0.0001 {
                    anyhow::bail!(
                        "rates {} = {} and {}_{} = {} disagree: round trip drifts {:.4}%",
                        pair,
                        rate,
                        to,
                        from,
                        reverse,
                        drift * 100.0
                    );
                }
            }
        }
        Ok(())
    }
}
