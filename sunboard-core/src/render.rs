use crate::model::{City, CityWeatherView, DisplayMode};

/// Presentation side of the board. Implementations draw cards; they never fetch.
pub trait Renderer: Send + Sync {
    fn render_loaded(&self, city_id: &str, view: &CityWeatherView, mode: DisplayMode);

    fn render_error(&self, city_id: &str, display_name: &str, message: &str);

    /// Blocking status shown once when no usable API key is configured.
    fn render_config_error(&self, message: &str);

    /// Placeholder cards shown before data arrives.
    fn render_skeleton(&self, _cities: &[City]) {}

    fn render_status(&self, _message: &str, _is_error: bool) {}

    /// Refresh control state: disabled while a cycle is in flight.
    fn set_refresh_busy(&self, _busy: bool) {}

    /// Presentation-only tick carrying the time-of-day reference hour.
    fn render_tick(&self, _reference_hour: f64) {}
}
