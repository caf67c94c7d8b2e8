//! Core library for `wxbatch`.
//!
//! This crate defines:
//! - A sliding-window rate limiter shared by all lookups
//! - A single-location fetch against OpenWeather with failure classification
//! - A batch orchestrator that runs lookups concurrently and keeps input order
//! - Configuration loading and the shared domain models
//!
//! It is used by `wxbatch-cli`, but can also be embedded in other binaries or services.

pub mod batch;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod provider;
pub mod rate_limiter;

pub use batch::BatchOrchestrator;
pub use config::{Config, RateLimitConfig};
pub use error::FetchError;
pub use fetch::FetchClient;
pub use model::{CityReport, Envelope, WeatherRecord};
pub use provider::WeatherProvider;
pub use rate_limiter::RateLimiter;
