use thiserror::Error;

/// Why a single location lookup did not produce a weather reading.
///
/// `Display` gives the text stored in [`WeatherRecord::error`](crate::WeatherRecord),
/// while [`FetchError::label`] gives the short `description` shown in its place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API returned status {0}")]
    ProviderStatus(u16),

    #[error("Request timeout")]
    Timeout,

    /// Network failure, malformed body, missing field.
    #[error("{0}")]
    Unexpected(String),

    /// The fetch task died before it could report anything.
    #[error("{0}")]
    TaskFailure(String),
}

impl FetchError {
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::RateLimited => "Rate limit exceeded",
            FetchError::ProviderStatus(_) => "API Error",
            FetchError::Timeout => "Request timeout",
            FetchError::Unexpected(_) => "Service unavailable",
            FetchError::TaskFailure(_) => "Service error",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return FetchError::Timeout;
        }

        // The request URL carries the API key in its query string.
        let e = e.without_url();
        match std::error::Error::source(&e) {
            Some(cause) => FetchError::Unexpected(format!("{e}: {cause}")),
            None => FetchError::Unexpected(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Unexpected(format!("Failed to parse provider response: {e}"))
    }
}

impl From<tokio::task::JoinError> for FetchError {
    fn from(e: tokio::task::JoinError) -> Self {
        FetchError::TaskFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_messages_match_taxonomy() {
        let cases = [
            (FetchError::RateLimited, "Rate limit exceeded", "Rate limit exceeded"),
            (FetchError::ProviderStatus(404), "API Error", "API returned status 404"),
            (FetchError::Timeout, "Request timeout", "Request timeout"),
            (
                FetchError::Unexpected("connection refused".into()),
                "Service unavailable",
                "connection refused",
            ),
            (FetchError::TaskFailure("panicked".into()), "Service error", "panicked"),
        ];

        for (err, label, message) in cases {
            assert_eq!(err.label(), label);
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn json_errors_are_unexpected() {
        let err: FetchError = serde_json::from_str::<u8>("nope").unwrap_err().into();
        assert!(matches!(err, FetchError::Unexpected(ref m) if m.contains("Failed to parse")));
    }
}
