use std::collections::HashMap;

use chrono::Utc;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::market::producer::{FetchError, ObservationProducer};
use crate::market::types::{Observation, PlatformProfile};

/// Observation producer backed by a platform's JSON search endpoint.
///
/// Each platform profile carries a `search_url` template; the producer
/// substitutes the URL-encoded query, fetches the listing payload and builds
/// observations through the validating constructor. Listings whose title does
/// not match the query, or whose price cannot be extracted, are dropped.
pub struct HttpProducer {
    client: Client,
    platforms: HashMap<String, PlatformProfile>,
    price_pattern: Regex,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    items: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    title: String,
    price: RawPrice,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Listing prices arrive either as a number or as display text ("$12.99").
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl HttpProducer {
    pub fn new(platforms: HashMap<String, PlatformProfile>) -> Self {
        Self {
            client: Client::new(),
            platforms,
            // First decimal number in the text, after separators are stripped.
            price_pattern: Regex::new(r"(\d+\.?\d*)").expect("static price pattern"),
        }
    }

    fn extract_price(&self, raw: &RawPrice) -> Option<f64> {
        match raw {
            RawPrice::Number(n) => Some(*n),
            RawPrice::Text(text) => {
                let cleaned: String = text
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                    .collect();
                let cleaned = cleaned.replace(',', "");
                self.price_pattern
                    .captures(&cleaned)
                    .and_then(|cap| cap[1].parse::<f64>().ok())
            }
        }
    }

    /// Cheap relevance check: the first word of the query has to appear in
    /// the listing title. Search endpoints pad results with accessories and
    /// unrelated sponsored items.
    fn title_matches(query: &str, title: &str) -> bool {
        query
            .split_whitespace()
            .next()
            .map(|word| title.to_lowercase().contains(&word.to_lowercase()))
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl ObservationProducer for HttpProducer {
    async fn fetch(&self, product: &str, platform: &str) -> Result<Vec<Observation>, FetchError> {
        let profile = self
            .platforms
            .get(platform)
            .ok_or_else(|| FetchError::UnknownPlatform(platform.to_string()))?;

        let template = profile.search_url.as_deref().ok_or_else(|| FetchError::BadPayload {
            platform: platform.to_string(),
            reason: "no search_url configured".to_string(),
        })?;

        let search_url = build_search_url(template, product, platform)?;
        debug!("searching '{}' on {}: {}", product, platform, search_url);

        let response: ListingResponse = self
            .client
            .get(search_url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| FetchError::Transport {
                platform: platform.to_string(),
                source,
            })?
            .json()
            .await
            .map_err(|source| FetchError::Transport {
                platform: platform.to_string(),
                source,
            })?;

        let now = Utc::now();
        let mut observations = Vec::new();
        for listing in response.items {
            if !Self::title_matches(product, &listing.title) {
                continue;
            }
            let Some(price) = self.extract_price(&listing.price) else {
                warn!("unparsable price for '{}' on {}", listing.title, platform);
                continue;
            };
            let currency = listing.currency.unwrap_or_else(|| profile.currency.clone());
            let url = listing.url.unwrap_or_else(|| search_url.to_string());
            match Observation::new(platform, &listing.title, price, currency, url, now) {
                Ok(obs) => observations.push(obs),
                Err(e) => warn!("discarding listing: {}", e),
            }
        }

        debug!("{}: {} usable listings for '{}'", platform, observations.len(), product);
        Ok(observations)
    }
}

/// Substitute the form-encoded query into the first `{}` of the template and
/// parse the result. A template that does not yield a valid URL is a typed
/// per-platform failure, not a panic.
fn build_search_url(template: &str, product: &str, platform: &str) -> Result<Url, FetchError> {
    let encoded: String = form_urlencoded::byte_serialize(product.as_bytes()).collect();
    Url::parse(&template.replacen("{}", &encoded, 1)).map_err(|e| FetchError::BadPayload {
        platform: platform.to_string(),
        reason: format!("search_url template does not parse: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types::Role;

    fn producer() -> HttpProducer {
        let profile = PlatformProfile {
            currency: "USD".to_string(),
            fee_fraction: 0.15,
            payment_fraction: 0.03,
            shipping_fraction: 0.10,
            avg_shipping_days: 15,
            reliability_score: 0.85,
            role: Role::Source,
            search_url: Some("https://example.test/search?q={}".to_string()),
        };
        HttpProducer::new(HashMap::from([("aliexpress".to_string(), profile)]))
    }

    #[test]
    fn extracts_price_from_display_text() {
        let p = producer();
        assert_eq!(p.extract_price(&RawPrice::Text("$12.99".to_string())), Some(12.99));
        assert_eq!(p.extract_price(&RawPrice::Text("1,299.00 USD".to_string())), Some(1299.0));
        assert_eq!(p.extract_price(&RawPrice::Text("out of stock".to_string())), None);
        assert_eq!(p.extract_price(&RawPrice::Number(4.5)), Some(4.5));
    }

    #[test]
    fn title_match_uses_first_query_word() {
        assert!(HttpProducer::title_matches(
            "Anker PowerCore 10000",
            "ANKER PowerCore Slim portable charger"
        ));
        assert!(!HttpProducer::title_matches("Anker PowerCore", "USB wall plug"));
    }

    #[test]
    fn search_url_gets_a_form_encoded_query() {
        let url = build_search_url("https://example.test/search?q={}", "LED Strip Lights", "x")
            .unwrap();
        assert_eq!(url.as_str(), "https://example.test/search?q=LED+Strip+Lights");

        let url = build_search_url("https://example.test/search?q={}", "Mi Band 8 (global)", "x")
            .unwrap();
        assert_eq!(url.as_str(), "https://example.test/search?q=Mi+Band+8+%28global%29");
    }

    #[test]
    fn unparsable_search_template_is_a_typed_failure() {
        let err = build_search_url("not-a-url {}", "USB-C Cables", "aliexpress").unwrap_err();
        assert!(matches!(err, FetchError::BadPayload { platform, .. } if platform == "aliexpress"));
    }

    #[tokio::test]
    async fn unknown_platform_is_a_typed_failure() {
        let err = producer().fetch("USB-C Cables", "walmart_us").await.unwrap_err();
        assert!(matches!(err, FetchError::UnknownPlatform(p) if p == "walmart_us"));
    }
}
