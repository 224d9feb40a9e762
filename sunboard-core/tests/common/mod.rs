#![allow(dead_code)]

use std::sync::Mutex;

use sunboard_core::{City, CityWeatherView, DisplayMode, Reading, Renderer};

/// Everything a front-end was asked to draw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Skeleton(usize),
    Loaded { city_id: String, mode: DisplayMode, view: CityWeatherView },
    Error { city_id: String, name: String, message: String },
    ConfigError(String),
    Status(String, bool),
    Busy(bool),
    Tick(f64),
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: RenderEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn loaded_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::Loaded { city_id, .. } => Some(city_id),
                _ => None,
            })
            .collect();
        ids.sort();
        ids
    }

    pub fn errored_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::Error { city_id, .. } => Some(city_id),
                _ => None,
            })
            .collect();
        ids.sort();
        ids
    }

    pub fn config_errors(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, RenderEvent::ConfigError(_))).count()
    }

    /// Readings of the most recent render for each city, sorted by city id.
    pub fn last_readings(&self) -> Vec<(String, Reading)> {
        let mut latest: Vec<(String, Reading)> = Vec::new();
        for event in self.events() {
            if let RenderEvent::Loaded { city_id, mode, view } = event {
                latest.retain(|(id, _)| *id != city_id);
                latest.push((city_id, view.reading(mode)));
            }
        }
        latest.sort_by(|a, b| a.0.cmp(&b.0));
        latest
    }
}

impl Renderer for RecordingRenderer {
    fn render_loaded(&self, city_id: &str, view: &CityWeatherView, mode: DisplayMode) {
        self.push(RenderEvent::Loaded { city_id: city_id.into(), mode, view: view.clone() });
    }

    fn render_error(&self, city_id: &str, display_name: &str, message: &str) {
        self.push(RenderEvent::Error {
            city_id: city_id.into(),
            name: display_name.into(),
            message: message.into(),
        });
    }

    fn render_config_error(&self, message: &str) {
        self.push(RenderEvent::ConfigError(message.into()));
    }

    fn render_skeleton(&self, cities: &[City]) {
        self.push(RenderEvent::Skeleton(cities.len()));
    }

    fn render_status(&self, message: &str, is_error: bool) {
        self.push(RenderEvent::Status(message.into(), is_error));
    }

    fn set_refresh_busy(&self, busy: bool) {
        self.push(RenderEvent::Busy(busy));
    }

    fn render_tick(&self, reference_hour: f64) {
        self.push(RenderEvent::Tick(reference_hour));
    }
}

pub fn cities() -> Vec<City> {
    vec![
        City::new("a", "Alpha", "Alpha,AU"),
        City::new("b", "Bravo", "Bravo,AU"),
        City::new("c", "Charlie", "Charlie,AU"),
    ]
}

/// WeatherAPI.com forecast body for one city. `temps` become the hourly
/// temperatures of the day dated `date`.
pub fn forecast_body(name: &str, date: &str, temps: &[f64]) -> serde_json::Value {
    let hours: Vec<serde_json::Value> = temps
        .iter()
        .enumerate()
        .map(|(i, t)| {
            serde_json::json!({
                "time": format!("{date} {i:02}:00"),
                "temp_c": t,
                "feelslike_c": t - 1.0,
                "uv": (i % 6) as f64,
            })
        })
        .collect();

    serde_json::json!({
        "location": {
            "name": name,
            "country": "Australia",
            "tz_id": "Australia/Melbourne",
            "localtime": format!("{date} 10:15"),
        },
        "current": {
            "last_updated": format!("{date} 10:00"),
            "last_updated_epoch": 1704927600,
            "temp_c": 21.0,
            "feelslike_c": 22.0,
            "uv": 4.0,
            "wind_kph": 14.4,
            "wind_degree": 200,
            "wind_dir": "SSW",
            "condition": { "text": "Sunny" },
            "is_day": 1
        },
        "forecast": {
            "forecastday": [
                {
                    "date": date,
                    "day": { "maxtemp_c": 31.0, "maxwind_kph": 25.0, "uv": 6.0 },
                    "hour": hours
                }
            ]
        }
    })
}
