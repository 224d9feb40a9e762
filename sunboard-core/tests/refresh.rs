//! Background refresh timing and cycle settling with stub providers.

mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use common::{RecordingRenderer, RenderEvent, cities};
use sunboard_core::{
    CardStatus, City, CityWeatherView, ForecastProvider, RefreshConfig, RefreshHandle,
    RefreshOrchestrator, SunboardError,
};

#[derive(Debug, Default)]
struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastProvider for CountingProvider {
    async fn fetch_city(&self, city: &City) -> Result<CityWeatherView, SunboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if city.id == "b" {
            return Err(SunboardError::provider("stub failure"));
        }
        Ok(view(city, 20.0))
    }
}

fn view(city: &City, temp_c: f64) -> CityWeatherView {
    CityWeatherView {
        city_name: city.name.clone(),
        last_updated_local: None,
        last_updated: None,
        local_time: None,
        temp_c,
        feels_like_c: 19.0,
        today_max_c: Some(24.0),
        today_max_feels_like_c: Some(23.0),
        peak_hour: Some(15),
        uv: Some(3.0),
        today_max_uv: Some(8.0),
        wind_kph: 10.0,
        today_max_wind_kph: Some(30.0),
        wind_degree: 90,
        wind_dir: "E".into(),
        condition_text: "Sunny".into(),
        is_day: true,
    }
}

/// Each call returns a new temperature; earlier calls may finish later.
#[derive(Debug, Default)]
struct SequencedProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl ForecastProvider for SequencedProvider {
    async fn fetch_city(&self, city: &City) -> Result<CityWeatherView, SunboardError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_micros(((n * 7) % 5) as u64 * 200)).await;
        Ok(view(city, n as f64))
    }
}

#[derive(Debug)]
struct PanickingProvider;

#[async_trait]
impl ForecastProvider for PanickingProvider {
    async fn fetch_city(&self, city: &City) -> Result<CityWeatherView, SunboardError> {
        if city.id == "b" {
            panic!("provider blew up for {}", city.id);
        }
        Ok(view(city, 20.0))
    }
}

fn setup() -> (Arc<CountingProvider>, Arc<RecordingRenderer>, Arc<RefreshOrchestrator>) {
    let provider = Arc::new(CountingProvider::default());
    let renderer = Arc::new(RecordingRenderer::default());
    let orchestrator =
        Arc::new(RefreshOrchestrator::new(cities(), provider.clone(), renderer.clone()));
    (provider, renderer, orchestrator)
}

fn intervals() -> RefreshConfig {
    RefreshConfig {
        data_interval: Duration::from_secs(30 * 60),
        tick_interval: Duration::from_secs(60),
        auto_refresh: true,
    }
}

#[tokio::test(start_paused = true)]
async fn initial_load_then_every_data_interval() {
    let (provider, renderer, orchestrator) = setup();
    let handle = RefreshHandle::spawn(orchestrator, intervals());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(provider.calls(), 3);
    assert_eq!(renderer.events().first(), Some(&RenderEvent::Skeleton(3)));
    assert_eq!(renderer.loaded_ids(), ["a", "c"]);
    assert_eq!(renderer.errored_ids(), ["b"]);

    tokio::time::sleep(Duration::from_secs(29 * 60)).await;
    assert_eq!(provider.calls(), 3);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(provider.calls(), 6);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn presentation_tick_does_not_fetch() {
    let (provider, renderer, orchestrator) = setup();
    let handle = RefreshHandle::spawn(orchestrator, intervals());

    tokio::time::sleep(Duration::from_millis(10)).await;
    renderer.clear();

    tokio::time::sleep(Duration::from_secs(5 * 60)).await;

    let ticks = renderer.events().iter().filter(|e| matches!(e, RenderEvent::Tick(_))).count();
    assert_eq!(ticks, 5);
    assert_eq!(provider.calls(), 3);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_runs_alongside_schedule() {
    let (provider, _renderer, orchestrator) = setup();
    let handle = RefreshHandle::spawn(orchestrator, intervals());

    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.request_refresh().await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(provider.calls(), 6);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_timers() {
    let (provider, _renderer, orchestrator) = setup();
    let handle = RefreshHandle::spawn(orchestrator, intervals());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(handle.is_running());
    handle.shutdown().await;

    tokio::time::sleep(Duration::from_secs(2 * 60 * 60)).await;
    assert_eq!(provider.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn manual_only_mode_still_loads_once() {
    let (provider, _renderer, orchestrator) = setup();
    let config = RefreshConfig { auto_refresh: false, ..intervals() };
    let handle = RefreshHandle::spawn(orchestrator, config);

    tokio::time::sleep(Duration::from_secs(2 * 60 * 60)).await;
    assert_eq!(provider.calls(), 3);

    handle.request_refresh().await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(provider.calls(), 6);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn zero_intervals_do_not_kill_the_scheduler() {
    let (provider, _renderer, orchestrator) = setup();
    let config = RefreshConfig {
        data_interval: Duration::ZERO,
        tick_interval: Duration::ZERO,
        auto_refresh: true,
    };
    let handle = RefreshHandle::spawn(orchestrator, config);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(handle.is_running());
    assert_eq!(provider.calls(), 3);

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_cycles_render_what_state_holds() {
    let renderer = Arc::new(RecordingRenderer::default());
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        cities(),
        Arc::new(SequencedProvider::default()),
        renderer.clone(),
    ));

    let mut cycles = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let orchestrator = Arc::clone(&orchestrator);
        cycles.spawn(async move { orchestrator.refresh_all().await });
    }
    while let Some(cycle) = cycles.join_next().await {
        cycle.expect("cycle task").expect("cycle result");
    }

    let state = orchestrator.snapshot().await;
    for city in orchestrator.cities() {
        let last_rendered = renderer
            .events()
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::Loaded { city_id, view, .. } if city_id == city.id => Some(view),
                _ => None,
            })
            .last();
        assert_eq!(last_rendered.as_ref(), state.view(&city.id), "city {}", city.id);
    }
}

#[tokio::test]
async fn panicked_city_task_gets_an_error_card() {
    let renderer = Arc::new(RecordingRenderer::default());
    let orchestrator =
        RefreshOrchestrator::new(cities(), Arc::new(PanickingProvider), renderer.clone());

    let err = orchestrator.refresh_all().await.unwrap_err();
    assert!(matches!(err, SunboardError::Unexpected(_)));

    assert_eq!(renderer.loaded_ids(), ["a", "c"]);
    assert_eq!(renderer.errored_ids(), ["b"]);
    assert!(renderer.events().iter().any(|e| matches!(
        e,
        RenderEvent::Error { city_id, name, message }
            if city_id == "b" && name == "Bravo" && message.starts_with("Refresh failed:")
    )));
    assert!(renderer.events().iter().any(|e| matches!(e, RenderEvent::Status(_, true))));
    assert_eq!(renderer.events().last(), Some(&RenderEvent::Status(err.to_string(), true)));

    let state = orchestrator.snapshot().await;
    assert!(matches!(state.card("b"), CardStatus::Errored(_)));
}
