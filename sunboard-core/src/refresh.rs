//! Periodic and on-demand refresh.
//!
//! A background task owns two timers: the data interval, which starts a full
//! fetch cycle, and the presentation tick, which only re-renders
//! time-dependent output. Manual refreshes arrive over a channel. Cycles are
//! spawned independently, so a manual refresh never cancels one in flight.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{Config, orchestrator::RefreshOrchestrator};

/// Intervals for the background refresh task.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Full data refresh.
    pub data_interval: Duration,
    /// Presentation-only tick.
    pub tick_interval: Duration,
    /// When false only manual refreshes run.
    pub auto_refresh: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            data_interval: Duration::from_secs(30 * 60),
            tick_interval: Duration::from_secs(60),
            auto_refresh: true,
        }
    }
}

impl From<&Config> for RefreshConfig {
    fn from(config: &Config) -> Self {
        Self {
            data_interval: config.refresh_interval(),
            tick_interval: config.tick_interval(),
            auto_refresh: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Refresh,
    Shutdown,
}

/// `time::interval` panics on a zero period.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Handle for controlling the background refresh task.
#[derive(Debug)]
pub struct RefreshHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Spawns the refresh task. The first data tick fires immediately and
    /// serves as the initial load.
    pub fn spawn(orchestrator: Arc<RefreshOrchestrator>, config: RefreshConfig) -> Self {
        let (commands, mut rx) = mpsc::channel(8);

        let task = tokio::spawn(async move {
            let mut data = time::interval(config.data_interval.max(MIN_PERIOD));
            data.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut clock = time::interval(config.tick_interval.max(MIN_PERIOD));
            clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

            orchestrator.render_skeleton();
            if !config.auto_refresh {
                // Initial load still happens; only the periodic part is off.
                spawn_cycle(&orchestrator);
            }

            loop {
                tokio::select! {
                    _ = data.tick(), if config.auto_refresh => {
                        debug!("scheduled refresh");
                        spawn_cycle(&orchestrator);
                    }
                    _ = clock.tick() => {
                        orchestrator.tick().await;
                    }
                    command = rx.recv() => match command {
                        Some(Command::Refresh) => {
                            debug!("manual refresh");
                            spawn_cycle(&orchestrator);
                        }
                        Some(Command::Shutdown) | None => break,
                    },
                }
            }

            info!("refresh task stopped");
        });

        Self { commands, task }
    }

    /// Starts a cycle now, alongside any cycle already running.
    pub async fn request_refresh(&self) {
        let _ = self.commands.send(Command::Refresh).await;
    }

    /// Stops the timers and waits for the task to exit. Cycles already
    /// spawned run to completion.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        let _ = self.task.await;
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

fn spawn_cycle(orchestrator: &Arc<RefreshOrchestrator>) {
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        // Failures are already rendered by the orchestrator.
        if let Err(err) = orchestrator.refresh_all().await {
            debug!("refresh cycle ended with error: {err}");
        }
    });
}
