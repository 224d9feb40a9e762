//! Application state shared by the orchestrator and the render side.
//!
//! Every write is keyed by city id, so concurrent cycles only ever race on
//! the same slot and the later settle wins.

use chrono::{NaiveTime, Timelike};
use std::collections::HashMap;

use crate::model::{CityWeatherView, DisplayMode};

/// Reference hour used in peak mode when no city reported a peak hour.
const DEFAULT_PEAK_HOUR: f64 = 14.0;

/// What a city's card currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardStatus {
    Loading,
    Loaded,
    Errored(String),
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    views: HashMap<String, CityWeatherView>,
    cards: HashMap<String, CardStatus>,
    mode: DisplayMode,
}

impl AppState {
    pub fn new(mode: DisplayMode) -> Self {
        Self { mode, ..Self::default() }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    /// Replaces the city's view and clears any error on its card.
    pub fn store(&mut self, city_id: &str, view: CityWeatherView) {
        self.views.insert(city_id.to_string(), view);
        self.cards.insert(city_id.to_string(), CardStatus::Loaded);
    }

    /// Marks the card errored; the last good view stays available.
    pub fn mark_error(&mut self, city_id: &str, message: impl Into<String>) {
        self.cards.insert(city_id.to_string(), CardStatus::Errored(message.into()));
    }

    pub fn view(&self, city_id: &str) -> Option<&CityWeatherView> {
        self.views.get(city_id)
    }

    pub fn card(&self, city_id: &str) -> CardStatus {
        self.cards.get(city_id).cloned().unwrap_or(CardStatus::Loading)
    }

    pub fn views(&self) -> impl Iterator<Item = (&str, &CityWeatherView)> {
        self.views.iter().map(|(id, view)| (id.as_str(), view))
    }

    /// Hour of day (fractional) the time-of-day backdrop should reflect.
    ///
    /// Peak mode averages the stored peak hours; current mode follows `now`.
    pub fn reference_hour(&self, now: NaiveTime) -> f64 {
        match self.mode {
            DisplayMode::Current => f64::from(now.hour()) + f64::from(now.minute()) / 60.0,
            DisplayMode::Peak => {
                let hours: Vec<f64> =
                    self.views.values().filter_map(|v| v.peak_hour).map(f64::from).collect();
                if hours.is_empty() {
                    DEFAULT_PEAK_HOUR
                } else {
                    hours.iter().sum::<f64>() / hours.len() as f64
                }
            }
        }
    }
}
