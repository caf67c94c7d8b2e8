use std::{sync::Arc, time::Instant};

use crate::{FetchError, RateLimiter, WeatherProvider, WeatherRecord};

/// Rate-limited, single-shot lookup of one location.
#[derive(Debug, Clone)]
pub struct FetchClient {
    limiter: Arc<RateLimiter>,
    provider: Arc<dyn WeatherProvider>,
}

impl FetchClient {
    pub fn new(limiter: Arc<RateLimiter>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { limiter, provider }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Look up `location`, charging the attempt against `key`.
    ///
    /// Never fails: every outcome, including a rate-limit rejection, comes
    /// back as a record. A rejected attempt does not reach the provider.
    pub async fn fetch(&self, key: &str, location: &str) -> WeatherRecord {
        match self.try_fetch(key, location).await {
            Ok(record) => record,
            Err(err) => WeatherRecord::failed(location, &err),
        }
    }

    pub async fn try_fetch(&self, key: &str, location: &str) -> Result<WeatherRecord, FetchError> {
        if !self.limiter.is_allowed(key) {
            tracing::warn!(location, key, "Rate limit hit while fetching weather");
            return Err(FetchError::RateLimited);
        }

        let started = Instant::now();
        let outcome = self.provider.current(location).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &outcome {
            Ok(_) => tracing::info!(location, "Fetched weather in {elapsed:.2}s"),
            Err(FetchError::Timeout) => tracing::error!(location, "Timed out fetching weather"),
            Err(err @ FetchError::ProviderStatus(_)) => {
                tracing::error!(location, error = %err, "Failed to fetch weather")
            }
            Err(err) => tracing::error!(location, error = %err, "Unexpected error fetching weather"),
        }

        outcome
    }
}
