//! Drives fetch cycles for every configured city.
//!
//! A cycle fans out one task per city and joins on all of them settling.
//! Each outcome is written to that city's slot and rendered as it arrives;
//! a failing city never affects its siblings.

use chrono::Local;
use std::{collections::HashMap, sync::Arc, time::Instant};
use tokio::{sync::RwLock, task::JoinSet};
use tracing::{error, info, instrument, warn};

use crate::{
    Config, SunboardError,
    model::{City, CityWeatherView, DisplayMode},
    provider::{ForecastProvider, provider_from_config},
    render::Renderer,
    state::AppState,
};

/// Outcome of one settled cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub loaded: Vec<String>,
    /// `(city id, error message)` pairs.
    pub failed: Vec<(String, String)>,
}

impl CycleSummary {
    pub fn ok_count(&self) -> usize {
        self.loaded.len()
    }
}

#[derive(Clone)]
pub struct RefreshOrchestrator {
    cities: Arc<[City]>,
    provider: Result<Arc<dyn ForecastProvider>, SunboardError>,
    state: Arc<RwLock<AppState>>,
    renderer: Arc<dyn Renderer>,
}

impl std::fmt::Debug for RefreshOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshOrchestrator")
            .field("cities", &self.cities)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl RefreshOrchestrator {
    pub fn new(
        cities: Vec<City>,
        provider: Arc<dyn ForecastProvider>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self::with_provider(cities, Ok(provider), renderer)
    }

    /// Builds the WeatherAPI.com provider from config. A missing key is kept
    /// as a configuration error and reported on every refresh attempt.
    pub fn from_config(config: &Config, renderer: Arc<dyn Renderer>) -> Self {
        let provider = provider_from_config(config)
            .map(|p| Arc::new(p) as Arc<dyn ForecastProvider>);
        Self::with_provider(config.cities.clone(), provider, renderer)
    }

    fn with_provider(
        cities: Vec<City>,
        provider: Result<Arc<dyn ForecastProvider>, SunboardError>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            cities: cities.into(),
            provider,
            state: Arc::new(RwLock::new(AppState::default())),
            renderer,
        }
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Copy of the current state for read-only use.
    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn display_mode(&self) -> DisplayMode {
        self.state.read().await.mode()
    }

    /// Placeholder cards for every city.
    pub fn render_skeleton(&self) {
        self.renderer.render_skeleton(&self.cities);
    }

    /// Runs one cycle: fetch every city concurrently, wait for all to settle.
    ///
    /// With no usable API key nothing is requested and a single configuration
    /// error is rendered. Per-city failures are rendered on that city's card
    /// and listed in the summary; they do not fail the cycle. A city task that
    /// dies without settling gets an error card, and the cycle then ends with
    /// a global error status and `SunboardError::Unexpected`.
    #[instrument(skip(self), fields(cities = self.cities.len()))]
    pub async fn refresh_all(&self) -> Result<CycleSummary, SunboardError> {
        let provider = match &self.provider {
            Ok(provider) => Arc::clone(provider),
            Err(err) => {
                warn!("refresh skipped: {err}");
                self.renderer.render_skeleton(&self.cities);
                self.renderer.render_config_error(&err.to_string());
                return Err(err.clone());
            }
        };

        self.renderer.set_refresh_busy(true);
        let started = Instant::now();

        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(self.cities.len());
        for city in self.cities.iter().cloned() {
            let provider = Arc::clone(&provider);
            let task_city = city.clone();
            let handle = tasks.spawn(async move { provider.fetch_city(&task_city).await });
            pending.insert(handle.id(), city);
        }

        let mut summary = CycleSummary::default();
        let mut unexpected = None;

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_err) => {
                    error!("city fetch task did not settle cleanly: {join_err}");
                    let err = SunboardError::Unexpected(join_err.to_string());
                    unexpected = Some(err.clone());
                    (join_err.id(), Err(err))
                }
            };
            let Some(city) = pending.remove(&id) else {
                continue;
            };
            match self.settle(&city, result).await {
                Ok(()) => summary.loaded.push(city.id),
                Err(err) => summary.failed.push((city.id, err.to_string())),
            }
        }

        self.renderer.set_refresh_busy(false);
        self.tick().await;

        info!(
            ok = summary.ok_count(),
            failed = summary.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "refresh cycle settled"
        );

        if let Some(err) = unexpected {
            self.renderer.render_status(&err.to_string(), true);
            return Err(err);
        }

        Ok(summary)
    }

    /// Fetches a single city, leaving every other slot untouched.
    pub async fn refresh_city(&self, city_id: &str) -> Result<(), SunboardError> {
        let provider = match &self.provider {
            Ok(provider) => Arc::clone(provider),
            Err(err) => {
                self.renderer.render_config_error(&err.to_string());
                return Err(err.clone());
            }
        };

        let city = self
            .cities
            .iter()
            .find(|c| c.id == city_id)
            .ok_or_else(|| SunboardError::Unexpected(format!("Unknown city '{city_id}'")))?;

        let result = provider.fetch_city(city).await;
        self.settle(city, result).await
    }

    /// Records one city's outcome in its own slot and renders its card.
    async fn settle(
        &self,
        city: &City,
        result: Result<CityWeatherView, SunboardError>,
    ) -> Result<(), SunboardError> {
        match result {
            // Render under the write guard: a city's renders follow its stores.
            Ok(view) => {
                let mut state = self.state.write().await;
                state.store(&city.id, view.clone());
                self.renderer.render_loaded(&city.id, &view, state.mode());
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                warn!(city = %city.id, "fetch failed: {message}");
                let mut state = self.state.write().await;
                state.mark_error(&city.id, message.clone());
                self.renderer.render_error(&city.id, &city.name, &message);
                Err(err)
            }
        }
    }

    /// Switches display mode and re-renders every stored view. No fetch happens;
    /// errored cities show their last good data.
    pub async fn set_display_mode(&self, mode: DisplayMode) {
        let state = {
            let mut state = self.state.write().await;
            state.set_mode(mode);
            state.clone()
        };

        for city in self.cities.iter() {
            if let Some(view) = state.view(&city.id) {
                self.renderer.render_loaded(&city.id, view, mode);
            }
        }
        self.renderer.render_tick(state.reference_hour(Local::now().time()));
    }

    pub async fn toggle_display_mode(&self) -> DisplayMode {
        let mode = self.display_mode().await.toggled();
        self.set_display_mode(mode).await;
        mode
    }

    /// Presentation-only refresh of time-dependent output.
    pub async fn tick(&self) {
        let hour = self.state.read().await.reference_hour(Local::now().time());
        self.renderer.render_tick(hour);
    }
}
