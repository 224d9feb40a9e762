//! Core library for the `sunboard` city weather board.
//!
//! This crate defines:
//! - Configuration & credential handling
//! - The forecast fetcher (WeatherAPI.com) and its per-city normalization
//! - Application state, the render boundary and the refresh orchestrator
//! - Periodic and manual refresh scheduling
//!
//! It is used by `sunboard-cli`, but any front-end implementing [`Renderer`] can drive it.

pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod refresh;
pub mod render;
pub mod state;

pub use config::Config;
pub use error::SunboardError;
pub use model::{City, CityWeatherView, DisplayMode, Reading, UvLevel};
pub use orchestrator::{CycleSummary, RefreshOrchestrator};
pub use provider::{ForecastProvider, provider_from_config, weatherapi::WeatherApiProvider};
pub use refresh::{RefreshConfig, RefreshHandle};
pub use render::Renderer;
pub use state::{AppState, CardStatus};
