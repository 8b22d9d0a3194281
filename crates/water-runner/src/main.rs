//! Headless runner that drives the water simulation on a fixed cadence.

mod scheduler;
mod telemetry;

use anyhow::Result;
#[cfg(unix)]
use scheduler::PauseHandle;
use scheduler::TickScheduler;
use tokio::signal;
#[cfg(unix)]
use tracing::error;
use tracing::info;
use water_core::RunnerConfig;
use water_world::GridSimulator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (optional JSON path as the first argument)
    let config = match std::env::args().nth(1) {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };

    // Initialize telemetry
    telemetry::init_telemetry(config.log_json)?;

    info!(
        rows = config.simulator.rows,
        columns = config.simulator.columns,
        tick_interval_ms = config.tick_interval_ms,
        "Starting water runner"
    );

    let mut simulator = GridSimulator::new(config.simulator.clone())?;
    for edit in &config.edits {
        simulator.apply(*edit)?;
    }

    let scheduler = TickScheduler::new(simulator, &config);
    let pause = scheduler.pause_handle();
    if config.start_paused {
        pause.pause();
        info!("Tick cadence starts paused");
    }

    #[cfg(unix)]
    tokio::spawn(async move {
        if let Err(e) = toggle_pause_on_signal(pause).await {
            error!("Pause signal handler failed: {}", e);
        }
    });

    let simulator = scheduler.run_until(shutdown_signal()).await;

    let stats = simulator.grid().stats();
    info!(
        generation = simulator.generation(),
        total_pressure = stats.total_pressure,
        wet_cells = stats.wet_cells,
        "Shutting down water runner"
    );

    if config.print_final_grid {
        print!("{}", simulator.grid());
    }

    Ok(())
}

/// SIGUSR1 pauses or resumes the tick cadence
#[cfg(unix)]
async fn toggle_pause_on_signal(pause: PauseHandle) -> Result<()> {
    let mut signals = signal::unix::signal(signal::unix::SignalKind::user_defined1())?;
    while signals.recv().await.is_some() {
        let paused = pause.toggle();
        info!(paused, "Tick cadence toggled");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
