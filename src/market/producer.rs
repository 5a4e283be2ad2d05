use crate::market::types::Observation;

/// Anything that can turn a product query into priced listings for one
/// platform. The core never touches HTML or DOM selectors; it consumes
/// already-parsed observations or a typed failure.
#[async_trait::async_trait]
pub trait ObservationProducer: Send + Sync {
    async fn fetch(&self, product: &str, platform: &str) -> Result<Vec<Observation>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("platform '{0}' is not configured")]
    UnknownPlatform(String),

    #[error("request to {platform} failed: {source}")]
    Transport {
        platform: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unusable payload from {platform}: {reason}")]
    BadPayload { platform: String, reason: String },

    #[error("fetch from {0} timed out")]
    Timeout(String),
}
