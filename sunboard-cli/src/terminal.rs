//! Plain-text stand-in for the card grid.

use std::io::{self, Write};

use chrono::Local;
use sunboard_core::{City, CityWeatherView, DisplayMode, Renderer};
use tracing::debug;

/// Writes one line per card update to stdout; errors go to stderr.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    fn print(line: String) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }
}

/// One card as a single line.
pub fn format_card(view: &CityWeatherView, mode: DisplayMode) -> String {
    let reading = view.reading(mode);
    format!(
        "{:<12} {:>4}°C  {:<18} Feels {:>3}°C  UV {} ({:<9}) Wind {:<14} {}",
        view.city_name,
        reading.temp_c.round(),
        view.condition_text,
        reading.feels_like_c.round(),
        (reading.uv * 10.0).round() / 10.0,
        reading.uv_level.label(),
        reading.wind_text,
        reading.label,
    )
}

pub fn format_error(display_name: &str, message: &str) -> String {
    format!("{display_name:<12} Could not load: {message}")
}

impl Renderer for TerminalRenderer {
    fn render_loaded(&self, _city_id: &str, view: &CityWeatherView, mode: DisplayMode) {
        Self::print(format_card(view, mode));
    }

    fn render_error(&self, _city_id: &str, display_name: &str, message: &str) {
        Self::print(format_error(display_name, message));
    }

    fn render_config_error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn render_skeleton(&self, cities: &[City]) {
        for city in cities {
            Self::print(format!("{:<12} Loading…", city.name));
        }
    }

    fn render_status(&self, message: &str, is_error: bool) {
        if is_error {
            eprintln!("{message}");
        } else {
            Self::print(message.to_string());
        }
    }

    fn set_refresh_busy(&self, busy: bool) {
        if busy {
            Self::print("Refreshing…".to_string());
        } else {
            Self::print(format!("Refreshed {}", Local::now().format("%a %H:%M")));
        }
    }

    fn render_tick(&self, reference_hour: f64) {
        debug!(reference_hour, "clock tick");
    }
}
