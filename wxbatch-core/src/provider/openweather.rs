use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{FetchError, model::WeatherRecord};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    /// `timeout` bounds the whole exchange, body included.
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url,
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

impl OwCurrentResponse {
    fn into_record(self, requested: &str) -> Result<WeatherRecord, FetchError> {
        let description = self
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| FetchError::Unexpected("OpenWeather response contained no weather entries".into()))?;

        // OpenWeather reports the canonical spelling of the place it matched.
        let location = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| requested.to_owned());

        Ok(WeatherRecord {
            location,
            temperature: self.main.temp,
            description,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            wind_speed: self.wind.speed,
            country: self.sys.country,
            timestamp: Utc::now(),
            error: None,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, location: &str) -> Result<WeatherRecord, FetchError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = res.status();
        if status != StatusCode::OK {
            // The body of an error response is only of interest to the log.
            let body = res.text().await.unwrap_or_default();
            tracing::debug!(location, %status, body = %truncate_body(&body), "OpenWeather rejected request");
            return Err(FetchError::ProviderStatus(status.as_u16()));
        }

        let body = res.text().await?;
        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        parsed.into_record(location)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::CityReport;
    use serde_json::{Value, json};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, query_param},
    };

    pub(crate) fn current_body(name: &str, country: &str, temp: f64) -> Value {
        json!({
            "name": name,
            "main": { "temp": temp, "humidity": 72, "pressure": 1013 },
            "weather": [{ "description": "scattered clouds" }],
            "wind": { "speed": 3.6 },
            "sys": { "country": country },
        })
    }

    pub(crate) fn provider_for(server: &MockServer, timeout: Duration) -> OpenWeatherProvider {
        OpenWeatherProvider::new("TEST_KEY".into(), server.uri(), timeout).unwrap()
    }

    #[tokio::test]
    async fn decodes_current_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "london"))
            .and(query_param("appid", "TEST_KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body("London", "GB", 11.2)))
            .expect(1)
            .mount(&server)
            .await;

        let rec = provider_for(&server, DEFAULT_TIMEOUT).current("london").await.unwrap();

        assert_eq!(rec.location, "London");
        assert_eq!(rec.temperature, 11.2);
        assert_eq!(rec.description, "scattered clouds");
        assert_eq!(rec.humidity, 72);
        assert_eq!(rec.pressure, 1013.0);
        assert_eq!(rec.wind_speed, 3.6);
        assert_eq!(rec.country, "GB");
        assert!(rec.error.is_none());
    }

    #[tokio::test]
    async fn falls_back_to_requested_name() {
        let server = MockServer::start().await;
        let mut body = current_body("", "FR", 18.0);
        body.as_object_mut().unwrap().remove("name");
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let rec = provider_for(&server, DEFAULT_TIMEOUT).current("Paris").await.unwrap();
        assert_eq!(rec.location, "Paris");
    }

    #[tokio::test]
    async fn non_200_is_provider_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"cod":"404","message":"city not found"}"#))
            .mount(&server)
            .await;

        let err = provider_for(&server, DEFAULT_TIMEOUT).current("Atlantis").await.unwrap_err();
        assert_eq!(err, FetchError::ProviderStatus(404));
    }

    #[tokio::test]
    async fn other_2xx_is_still_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = provider_for(&server, DEFAULT_TIMEOUT).current("London").await.unwrap_err();
        assert_eq!(err, FetchError::ProviderStatus(204));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_body("London", "GB", 1.0))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server, Duration::from_millis(200))
            .current("London")
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn malformed_body_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server, DEFAULT_TIMEOUT).current("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Unexpected(_)));
    }

    #[tokio::test]
    async fn missing_field_is_unexpected() {
        let server = MockServer::start().await;
        let mut body = current_body("London", "GB", 1.0);
        body.as_object_mut().unwrap().remove("sys");
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = provider_for(&server, DEFAULT_TIMEOUT).current("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Unexpected(ref m) if m.contains("sys")));
    }

    #[tokio::test]
    async fn empty_weather_list_is_unexpected() {
        let server = MockServer::start().await;
        let mut body = current_body("London", "GB", 1.0);
        body["weather"] = json!([]);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = provider_for(&server, DEFAULT_TIMEOUT).current("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Unexpected(ref m) if m.contains("no weather entries")));
    }

    #[tokio::test]
    async fn unreachable_host_is_unexpected() {
        let provider =
            OpenWeatherProvider::new("KEY".into(), "http://127.0.0.1:1".into(), DEFAULT_TIMEOUT).unwrap();

        let err = provider.current("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Unexpected(_)));
    }

    #[tokio::test]
    async fn network_error_does_not_leak_api_key() {
        let provider = OpenWeatherProvider::new(
            "SECRET_KEY_123".into(),
            "http://127.0.0.1:1/weather".into(),
            DEFAULT_TIMEOUT,
        )
        .unwrap();

        let err = provider.current("London").await.unwrap_err();
        let report = CityReport::from(WeatherRecord::failed("London", &err));
        let json = serde_json::to_string(&report).unwrap();

        assert_eq!(report.description, "Service unavailable");
        assert!(report.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert!(!json.contains("SECRET_KEY_123"), "{json}");
        assert!(!json.contains("appid"), "{json}");
    }

    #[tokio::test]
    async fn status_wins_over_stalled_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 100\r\n\r\n{\"cod\"")
                .await
                .unwrap();
            // Hold the connection open without finishing the body.
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let provider = OpenWeatherProvider::new(
            "KEY".into(),
            format!("http://{addr}/weather"),
            Duration::from_millis(500),
        )
        .unwrap();

        let err = provider.current("Atlantis").await.unwrap_err();
        assert_eq!(err, FetchError::ProviderStatus(404));
        assert_eq!(err.label(), "API Error");
    }

    #[test]
    fn truncate_body_caps_long_bodies() {
        let long = "x".repeat(500);
        let out = truncate_body(&long);

        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
