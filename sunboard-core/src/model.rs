use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A configured city. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Stable key used for the result store and card addressing.
    pub id: String,
    pub name: String,
    /// Location query passed to the provider, e.g. "Melbourne,AU".
    pub query: String,
}

impl City {
    pub fn new(id: impl Into<String>, name: impl Into<String>, query: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), query: query.into() }
    }
}

/// Normalized weather for one city, rebuilt on every successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeatherView {
    pub city_name: String,
    /// Provider's last update, in the city's own local time.
    pub last_updated_local: Option<NaiveDateTime>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Location's local time at fetch, as reported by the provider.
    pub local_time: Option<NaiveDateTime>,

    pub temp_c: f64,
    pub feels_like_c: f64,
    pub today_max_c: Option<f64>,
    pub today_max_feels_like_c: Option<f64>,
    /// Hour (0-23) with the highest hourly temperature today.
    pub peak_hour: Option<u32>,

    pub uv: Option<f64>,
    pub today_max_uv: Option<f64>,

    pub wind_kph: f64,
    pub today_max_wind_kph: Option<f64>,
    pub wind_degree: u16,
    pub wind_dir: String,

    pub condition_text: String,
    pub is_day: bool,
}

/// Which already-fetched readings are surfaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Current,
    Peak,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Current => "current",
            DisplayMode::Peak => "peak",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Current => DisplayMode::Peak,
            DisplayMode::Peak => DisplayMode::Current,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "current" | "now" => Ok(DisplayMode::Current),
            "peak" | "max" => Ok(DisplayMode::Peak),
            _ => Err(format!("Unknown display mode '{value}'. Expected 'current' or 'peak'.")),
        }
    }
}

/// UV risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvLevel {
    pub fn from_index(uv: f64) -> Self {
        if uv >= 11.0 {
            UvLevel::Extreme
        } else if uv >= 8.0 {
            UvLevel::VeryHigh
        } else if uv >= 6.0 {
            UvLevel::High
        } else if uv >= 3.0 {
            UvLevel::Moderate
        } else {
            UvLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UvLevel::Low => "Low",
            UvLevel::Moderate => "Moderate",
            UvLevel::High => "High",
            UvLevel::VeryHigh => "Very high",
            UvLevel::Extreme => "Extreme",
        }
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a bearing in degrees.
pub fn degrees_to_compass(degrees: f64) -> &'static str {
    let index = (degrees / 22.5).round().rem_euclid(16.0) as usize;
    COMPASS_POINTS[index % 16]
}

/// The set of values a card shows for one display mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Either the last-updated time or the peak hour, already formatted.
    pub label: String,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub uv: f64,
    pub uv_level: UvLevel,
    pub wind_kph: f64,
    pub wind_text: String,
}

impl CityWeatherView {
    /// Compass text from the provider, or derived from the bearing when absent.
    pub fn compass(&self) -> &str {
        if self.wind_dir.is_empty() {
            degrees_to_compass(f64::from(self.wind_degree))
        } else {
            &self.wind_dir
        }
    }

    /// Selects the fields to surface for `mode`. Pure; never touches fetched data.
    pub fn reading(&self, mode: DisplayMode) -> Reading {
        let peak = mode == DisplayMode::Peak;

        let label = match (peak, self.peak_hour) {
            (true, Some(hour)) => format_peak_hour(hour),
            _ => self.last_updated_label(),
        };

        let temp_c = match (peak, self.today_max_c) {
            (true, Some(max)) => max,
            _ => self.temp_c,
        };

        let feels_like_c = match (peak, self.today_max_feels_like_c) {
            (true, Some(max)) => max.max(self.feels_like_c),
            _ => self.feels_like_c,
        };

        let uv = match (peak, self.today_max_uv) {
            (true, Some(max)) => max,
            _ => self.uv.unwrap_or(0.0),
        };

        let wind_kph = match (peak, self.today_max_wind_kph) {
            (true, Some(max)) => max.max(self.wind_kph),
            _ => self.wind_kph,
        };

        Reading {
            label,
            temp_c,
            feels_like_c,
            uv,
            uv_level: UvLevel::from_index(uv),
            wind_kph,
            wind_text: format!("{} km/h {}", wind_kph.round(), self.compass()),
        }
    }

    fn last_updated_label(&self) -> String {
        self.last_updated_local
            .map(|t| t.format("%a %H:%M").to_string())
            .unwrap_or_else(|| "Updated time unknown".to_string())
    }
}

/// "Peak 2:00pm" style label for an hour of day; out-of-range hours are clamped.
pub fn format_peak_hour(hour: u32) -> String {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    format!("Peak {}", time.format("%-I:%M%P"))
}
