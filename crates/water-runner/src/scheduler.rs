//! Fixed-cadence driver for the grid simulator.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, instrument};
use water_core::RunnerConfig;
use water_world::{GridSimulator, StepStats};

/// Shared pause flag for a running scheduler
#[derive(Debug, Clone, Default)]
pub struct PauseHandle {
    paused: Arc<AtomicBool>,
}

impl PauseHandle {
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    /// Flip the flag, returning whether the scheduler is now paused
    pub fn toggle(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

/// Owns the simulator and steps it once per interval tick
pub struct TickScheduler {
    simulator: GridSimulator,
    tick_interval: Duration,
    max_ticks: Option<u64>,
    stats_interval_ticks: u64,
    pause: PauseHandle,
}

impl TickScheduler {
    pub fn new(simulator: GridSimulator, config: &RunnerConfig) -> Self {
        Self {
            simulator,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            max_ticks: config.max_ticks,
            stats_interval_ticks: config.stats_interval_ticks,
            pause: PauseHandle::default(),
        }
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    /// Tick until `max_ticks` steps have run or `shutdown` resolves, then hand
    /// the simulator back.
    #[instrument(skip_all)]
    pub async fn run_until<F>(mut self, shutdown: F) -> GridSimulator
    where
        F: Future<Output = ()>,
    {
        info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            max_ticks = ?self.max_ticks,
            "Starting tick loop"
        );

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut ticks = 0u64;
        while self.max_ticks.map_or(true, |max| ticks < max) {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(ticks, "Shutdown requested, stopping tick loop");
                    break;
                }
                _ = ticker.tick() => {
                    if !self.pause.is_paused() {
                        let stats = self.simulator.step();
                        ticks += 1;
                        if self.stats_interval_ticks > 0 && ticks % self.stats_interval_ticks == 0 {
                            self.emit_grid_metrics(&stats);
                        }
                    }
                }
            }
        }

        debug!(ticks, generation = self.simulator.generation(), "Tick loop finished");
        self.simulator
    }

    fn emit_grid_metrics(&self, step: &StepStats) {
        let grid = self.simulator.grid().stats();
        info!(
            event = "grid_metrics",
            generation = self.simulator.generation(),
            sources = grid.sources,
            obstacles = grid.obstacles,
            wet_cells = grid.wet_cells,
            total_pressure = grid.total_pressure,
            max_pressure = grid.max_pressure,
            flows = step.total_flows(),
            injected = step.injected,
            "Grid metrics snapshot"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use water_core::SimulatorConfig;

    fn test_simulator() -> GridSimulator {
        GridSimulator::new(SimulatorConfig {
            rows: 8,
            columns: 8,
            num_sources: 2,
            num_obstacles: 4,
            seed: Some(42),
            ..Default::default()
        })
        .unwrap()
    }

    fn fast_config(max_ticks: Option<u64>) -> RunnerConfig {
        RunnerConfig {
            tick_interval_ms: 1,
            max_ticks,
            stats_interval_ticks: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_pause_handle() {
        let handle = PauseHandle::default();
        assert!(!handle.is_paused());
        handle.pause();
        assert!(handle.is_paused());
        handle.resume();
        assert!(!handle.is_paused());
        assert!(handle.toggle());
        assert!(handle.clone().is_paused());
        assert!(!handle.toggle());
    }

    #[tokio::test]
    async fn test_runs_until_max_ticks() {
        let scheduler = TickScheduler::new(test_simulator(), &fast_config(Some(5)));
        let simulator = scheduler.run_until(std::future::pending::<()>()).await;
        assert_eq!(simulator.generation(), 5);
    }

    #[tokio::test]
    async fn test_paused_scheduler_does_not_step() {
        let scheduler = TickScheduler::new(test_simulator(), &fast_config(None));
        scheduler.pause_handle().pause();
        let simulator = scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(30)))
            .await;
        assert_eq!(simulator.generation(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_takes_priority() {
        let scheduler = TickScheduler::new(test_simulator(), &fast_config(None));
        let simulator = scheduler.run_until(std::future::ready(())).await;
        assert_eq!(simulator.generation(), 0);
    }

    #[tokio::test]
    async fn test_resume_after_pause() {
        let scheduler = TickScheduler::new(test_simulator(), &fast_config(Some(3)));
        let handle = scheduler.pause_handle();
        handle.pause();
        let task = tokio::spawn(scheduler.run_until(std::future::pending::<()>()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.resume();

        let simulator = task.await.unwrap();
        assert_eq!(simulator.generation(), 3);
    }
}
