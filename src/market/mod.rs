pub mod cache;
pub mod http;
pub mod producer;
pub mod rates;
pub mod types;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
