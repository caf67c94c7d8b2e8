use std::{sync::Arc, time::Instant};

use crate::{Config, FetchClient, FetchError, RateLimiter, WeatherRecord, provider::provider_from_config};

/// Key shared by every lookup the orchestrator issues.
pub const DEFAULT_RATE_LIMIT_KEY: &str = "default";

/// Fans a list of locations out into concurrent lookups and gathers the
/// results back in input order.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    client: Arc<FetchClient>,
    key: String,
}

impl BatchOrchestrator {
    pub fn new(client: Arc<FetchClient>) -> Self {
        Self {
            client,
            key: DEFAULT_RATE_LIMIT_KEY.to_owned(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Build the limiter, provider and client once from `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit.max_requests,
            config.rate_limit.time_window(),
        ));
        let provider = provider_from_config(config)?;

        Ok(Self::new(Arc::new(FetchClient::new(limiter, provider))))
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    /// Fetch every location concurrently.
    ///
    /// Returns one record per input, `result[i]` answering `locations[i]`.
    /// Duplicates are fetched (and rate-limited) individually. A lookup that
    /// panics is reported as a "Service error" record and does not disturb
    /// its siblings.
    pub async fn fetch_all<S: AsRef<str>>(&self, locations: &[S]) -> Vec<WeatherRecord> {
        let started = Instant::now();

        let handles: Vec<_> = locations
            .iter()
            .map(|location| {
                let client = Arc::clone(&self.client);
                let key = self.key.clone();
                let location = location.as_ref().to_owned();
                tokio::spawn(async move { client.fetch(&key, &location).await })
            })
            .collect();

        let mut records = Vec::with_capacity(handles.len());
        for (handle, location) in handles.into_iter().zip(locations) {
            let location = location.as_ref();
            let record = match handle.await {
                Ok(record) => record,
                Err(join_err) => {
                    let err = FetchError::from(join_err);
                    tracing::error!(location, error = %err, "Fetch task failed");
                    WeatherRecord::failed(location, &err)
                }
            };
            records.push(record);
        }

        tracing::info!(
            "Fetched weather for {} locations in {:.2}s",
            locations.len(),
            started.elapsed().as_secs_f64()
        );

        records
    }
}
