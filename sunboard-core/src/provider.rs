use crate::{
    CityWeatherView, Config, SunboardError, model::City, provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

/// Fetches and normalizes weather for a single city.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_city(&self, city: &City) -> Result<CityWeatherView, SunboardError>;
}

/// Construct the WeatherAPI.com provider from config.
///
/// Fails with a configuration error when the key is missing or still the placeholder.
pub fn provider_from_config(config: &Config) -> Result<WeatherApiProvider, SunboardError> {
    let api_key = config.credential()?;

    Ok(WeatherApiProvider::new(api_key.to_owned())
        .with_base_url(config.base_url.clone())
        .with_forecast_days(config.forecast_days))
}
