use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single priced listing for a product at a platform at a point in time.
///
/// Only constructible through [`Observation::new`], which rejects
/// non-positive prices: a listing we could not price is never represented
/// as a zero-price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub platform: String,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub url: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum ObservationError {
    #[error("non-positive price {price} for '{title}' on {platform}")]
    NonPositivePrice {
        platform: String,
        title: String,
        price: f64,
    },
}

impl Observation {
    pub fn new(
        platform: impl Into<String>,
        title: impl Into<String>,
        price: f64,
        currency: impl Into<String>,
        url: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, ObservationError> {
        let platform = platform.into();
        let title = title.into();
        if !(price > 0.0) || !price.is_finite() {
            return Err(ObservationError::NonPositivePrice {
                platform,
                title,
                price,
            });
        }
        Ok(Self {
            platform,
            title,
            price,
            currency: currency.into(),
            url: url.into(),
            observed_at,
        })
    }
}

/// Whether a platform is one we buy from, sell into, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Source,
    Target,
    Both,
}

impl Role {
    pub fn is_source(self) -> bool {
        matches!(self, Role::Source | Role::Both)
    }

    pub fn is_target(self) -> bool {
        matches!(self, Role::Target | Role::Both)
    }
}

/// Static per-platform configuration: currency, fee structure and logistics
/// estimates used by the cost model.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformProfile {
    pub currency: String,
    pub fee_fraction: f64,
    #[serde(default = "default_payment_fraction")]
    pub payment_fraction: f64,
    pub shipping_fraction: f64,
    pub avg_shipping_days: u32,
    pub reliability_score: f64,
    pub role: Role,
    /// Search endpoint template for the bundled HTTP producer, with `{}`
    /// standing in for the URL-encoded product query.
    #[serde(default)]
    pub search_url: Option<String>,
}

fn default_payment_fraction() -> f64 {
    0.03
}

impl PlatformProfile {
    /// All fee fractions must be genuine fractions of a price.
    pub fn validate(&self, platform: &str) -> anyhow::Result<()> {
        for (name, value) in [
            ("fee_fraction", self.fee_fraction),
            ("payment_fraction", self.payment_fraction),
            ("shipping_fraction", self.shipping_fraction),
        ] {
            if !(0.0..1.0).contains(&value) {
                anyhow::bail!("platform '{}': {} = {} outside [0, 1)", platform, name, value);
            }
        }
        if !(0.0..=1.0).contains(&self.reliability_score) {
            anyhow::bail!(
                "platform '{}': reliability_score = {} outside [0, 1]",
                platform,
                self.reliability_score
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role) -> PlatformProfile {
        PlatformProfile {
            currency: "USD".to_string(),
            fee_fraction: 0.15,
            payment_fraction: 0.03,
            shipping_fraction: 0.10,
            avg_shipping_days: 15,
            reliability_score: 0.85,
            role,
            search_url: None,
        }
    }

    #[test]
    fn observation_rejects_non_positive_price() {
        for bad in [0.0, -4.99, f64::NAN] {
            let result = Observation::new("amazon_us", "USB-C Cable", bad, "USD", "", Utc::now());
            assert!(result.is_err());
        }
    }

    #[test]
    fn observation_accepts_positive_price() {
        let obs =
            Observation::new("aliexpress", "USB-C Cable", 2.5, "USD", "", Utc::now()).unwrap();
        assert_eq!(obs.price, 2.5);
    }

    #[test]
    fn role_both_covers_each_side() {
        assert!(Role::Both.is_source() && Role::Both.is_target());
        assert!(Role::Source.is_source() && !Role::Source.is_target());
        assert!(!Role::Target.is_source() && Role::Target.is_target());
    }

    #[test]
    fn profile_validation_rejects_fraction_of_one() {
        let mut p = profile(Role::Source);
        p.fee_fraction = 1.0;
        assert!(p.validate("aliexpress").is_err());
        assert!(profile(Role::Source).validate("aliexpress").is_ok());
    }
}
