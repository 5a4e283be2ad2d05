//! Deterministic sample-data generators for tests and demos.
//!
//! Nothing in here is reachable from the production scan path: an empty
//! fetch result yields zero opportunities, never synthetic ones.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::market::producer::{FetchError, ObservationProducer};
use crate::market::types::Observation;

/// Scripted producer: every (product, platform) key returns a canned batch
/// or a canned failure. Unscripted keys fail as unknown platforms.
#[derive(Default)]
pub struct StaticProducer {
    script: HashMap<(String, String), Script>,
}

enum Script {
    Listings(Vec<Observation>),
    Fail(String),
}

impl StaticProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(
        mut self,
        product: &str,
        platform: &str,
        observations: Vec<Observation>,
    ) -> Self {
        self.script.insert(
            (product.to_string(), platform.to_string()),
            Script::Listings(observations),
        );
        self
    }

    pub fn with_failure(mut self, product: &str, platform: &str, reason: &str) -> Self {
        self.script.insert(
            (product.to_string(), platform.to_string()),
            Script::Fail(reason.to_string()),
        );
        self
    }
}

#[async_trait::async_trait]
impl ObservationProducer for StaticProducer {
    async fn fetch(&self, product: &str, platform: &str) -> Result<Vec<Observation>, FetchError> {
        match self.script.get(&(product.to_string(), platform.to_string())) {
            Some(Script::Listings(observations)) => Ok(observations.clone()),
            Some(Script::Fail(reason)) => Err(FetchError::BadPayload {
                platform: platform.to_string(),
                reason: reason.clone(),
            }),
            None => Err(FetchError::UnknownPlatform(platform.to_string())),
        }
    }
}

/// Seeded batch of plausible listings for one platform. Same seed, same
/// catalog.
pub fn sample_observations(
    seed: u64,
    product: &str,
    platform: &str,
    currency: &str,
    price_range: std::ops::Range<f64>,
    count: usize,
    observed_at: DateTime<Utc>,
) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let price = (rng.gen_range(price_range.clone()) * 100.0).round() / 100.0;
            Observation::new(
                platform,
                format!("{} - listing {}", product, i + 1),
                price,
                currency,
                format!("https://{}.example/item/{}", platform, i + 1),
                observed_at,
            )
            .expect("sampled price is positive")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_is_deterministic_per_seed() {
        let now = Utc::now();
        let a = sample_observations(7, "Yoga Mats", "aliexpress", "USD", 2.0..13.0, 5, now);
        let b = sample_observations(7, "Yoga Mats", "aliexpress", "USD", 2.0..13.0, 5, now);
        assert_eq!(a, b);
        assert!(a.iter().all(|o| o.price > 0.0));
    }

    #[tokio::test]
    async fn static_producer_follows_its_script() {
        let now = Utc::now();
        let obs =
            Observation::new("aliexpress", "Yoga Mat Pro", 4.0, "USD", "", now).unwrap();
        let producer = StaticProducer::new()
            .with_listings("Yoga Mats", "aliexpress", vec![obs])
            .with_failure("Yoga Mats", "amazon_us", "blocked");

        assert_eq!(producer.fetch("Yoga Mats", "aliexpress").await.unwrap().len(), 1);
        assert!(producer.fetch("Yoga Mats", "amazon_us").await.is_err());
        assert!(producer.fetch("Yoga Mats", "ebay_global").await.is_err());
    }
}
