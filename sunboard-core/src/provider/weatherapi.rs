use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    SunboardError,
    config::DEFAULT_BASE_URL,
    model::{City, CityWeatherView},
};

use super::ForecastProvider;

/// Format of `location.localtime` and `current.last_updated`.
const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    forecast_days: u8,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            forecast_days: 3,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_forecast_days(mut self, days: u8) -> Self {
        self.forecast_days = days.max(1);
        self
    }

    #[instrument(skip(self, city), fields(city = %city.id))]
    async fn fetch_forecast(&self, city: &City) -> Result<WaForecastResponse, SunboardError> {
        let url = format!("{}/forecast.json", self.base_url);
        let days = self.forecast_days.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", city.query.as_str()),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await
            .map_err(|e| {
                SunboardError::provider(format!("Failed to send request to WeatherAPI.com: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            SunboardError::provider(format!("Failed to read WeatherAPI forecast response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(SunboardError::http_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            SunboardError::provider(format!("Failed to parse WeatherAPI forecast JSON: {e}"))
        })
    }
}

#[async_trait]
impl ForecastProvider for WeatherApiProvider {
    async fn fetch_city(&self, city: &City) -> Result<CityWeatherView, SunboardError> {
        if city.query.trim().is_empty() {
            return Err(SunboardError::provider(format!(
                "City '{}' has no location query",
                city.id
            )));
        }

        let forecast = self.fetch_forecast(city).await?;
        Ok(normalize(city, forecast))
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    localtime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    last_updated: Option<String>,
    last_updated_epoch: Option<i64>,
    temp_c: f64,
    feelslike_c: f64,
    uv: Option<f64>,
    wind_kph: Option<f64>,
    wind_degree: Option<f64>,
    wind_dir: Option<String>,
    condition: Option<WaCondition>,
    is_day: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: Option<f64>,
    maxwind_kph: Option<f64>,
    /// Daily average UV, not the peak.
    uv: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WaHour {
    temp_c: Option<f64>,
    feelslike_c: Option<f64>,
    uv: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: String,
    day: Option<WaDay>,
    #[serde(default)]
    hour: Vec<WaHour>,
}

#[derive(Debug, Default, Deserialize)]
struct WaForecast {
    #[serde(default)]
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: Option<WaLocation>,
    current: WaCurrent,
    #[serde(default)]
    forecast: WaForecast,
}

/// Picks the forecast day matching the location's own calendar date, or the first day.
fn resolve_today<'a>(
    days: &'a [WaForecastDay],
    local_date: Option<&str>,
) -> Option<&'a WaForecastDay> {
    local_date
        .and_then(|date| days.iter().find(|fd| fd.date == date))
        .or_else(|| days.first())
}

/// First 10 characters (`YYYY-MM-DD`) of a provider local-time string.
fn date_prefix(local_time: &str) -> Option<&str> {
    local_time.get(..10)
}

/// Index of the strictly greatest hourly temperature; the first occurrence wins ties.
fn peak_hour(hours: &[WaHour]) -> Option<u32> {
    let mut best: Option<(u32, f64)> = None;
    for (index, temp) in hours.iter().enumerate().filter_map(|(i, h)| Some((i, h.temp_c?))) {
        if best.is_none_or(|(_, max)| temp > max) {
            best = Some((index as u32, temp));
        }
    }
    best.map(|(index, _)| index)
}

fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

/// Highest non-negative hourly UV, falling back to the daily average field.
fn peak_uv(hours: &[WaHour], day: Option<&WaDay>) -> Option<f64> {
    max_of(hours.iter().filter_map(|h| h.uv).filter(|uv| *uv >= 0.0))
        .or_else(|| day.and_then(|d| d.uv).filter(|uv| *uv >= 0.0))
}

fn parse_local(value: Option<&str>) -> Option<NaiveDateTime> {
    value.and_then(|v| NaiveDateTime::parse_from_str(v, LOCAL_TIME_FORMAT).ok())
}

fn normalize(city: &City, response: WaForecastResponse) -> CityWeatherView {
    let current = response.current;
    let localtime = response.location.and_then(|l| l.localtime);

    let local_date = localtime
        .as_deref()
        .and_then(date_prefix)
        .or_else(|| current.last_updated.as_deref().and_then(date_prefix));

    let today = resolve_today(&response.forecast.forecastday, local_date);
    let day = today.and_then(|fd| fd.day.as_ref());
    let hours: &[WaHour] = today.map(|fd| fd.hour.as_slice()).unwrap_or_default();

    let today_max_c = day.and_then(|d| d.maxtemp_c);
    debug!(
        city = %city.name,
        current_temp_c = current.temp_c,
        day_maxtemp_c = ?today_max_c,
        "temperature{}",
        match today_max_c {
            Some(max) if max < current.temp_c => " (peak < current, late-day possible)",
            _ => "",
        }
    );

    let uv = current.uv.filter(|v| *v >= 0.0);
    let today_max_uv = peak_uv(hours, day);
    let hourly_uv: Vec<Option<f64>> = hours.iter().map(|h| h.uv).collect();
    debug!(
        city = %city.name,
        current_uv = ?uv,
        hourly_uv = ?hourly_uv,
        peak_uv = ?today_max_uv,
        "uv"
    );

    let wind_degree = current.wind_degree.unwrap_or(0.0).round().rem_euclid(360.0) as u16;
    let wind_dir = current.wind_dir.unwrap_or_default();
    debug!(
        city = %city.name,
        wind_degree,
        wind_dir = %wind_dir,
        "wind direction"
    );

    CityWeatherView {
        city_name: city.name.clone(),
        last_updated_local: parse_local(current.last_updated.as_deref()),
        last_updated: current.last_updated_epoch.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        local_time: parse_local(localtime.as_deref()),
        temp_c: current.temp_c,
        feels_like_c: current.feelslike_c,
        today_max_c,
        today_max_feels_like_c: max_of(hours.iter().filter_map(|h| h.feelslike_c)),
        peak_hour: peak_hour(hours),
        uv,
        today_max_uv,
        wind_kph: current.wind_kph.unwrap_or(0.0),
        today_max_wind_kph: day.and_then(|d| d.maxwind_kph),
        wind_degree,
        wind_dir,
        condition_text: current.condition.and_then(|c| c.text).unwrap_or_default(),
        is_day: current.is_day.unwrap_or(0) != 0,
    }
}
