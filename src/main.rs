// Interactive BLE peripheral session with timestamped notification logging

use std::sync::Arc;

use chrono::Local;
use log::info;

mod bluetooth;
mod config;
mod console;
mod device;
mod error;
mod profile;
mod record;
mod scanner;
mod selector;
mod session;
mod session_loop;

#[cfg(test)]
mod testing;

use crate::bluetooth::BleAdapter;
use crate::console::StdConsole;
use crate::record::RecordLogger;
use crate::scanner::ScanTiming;
use crate::session::{SessionHandler, SessionTiming};
use crate::session_loop::SessionLoop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env().init();

    info!("Starting BLE session logger");

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = config::load_config(config_path.as_deref())?;
    let channels = config.bluetooth.channels();
    info!(
        "Profile {:?}: read {} / write {}",
        config.bluetooth.profile, channels.read, channels.write
    );

    // The sink path is fixed for the lifetime of the process
    let sink_path = config.sink.path_for(Local::now().date_naive());
    let logger = Arc::new(RecordLogger::new(sink_path));
    info!("Logging notifications to {}", logger.path().display());

    // Initialize BLE adapter
    let adapter = BleAdapter::new(config.bluetooth.adapter.as_deref()).await?;
    info!("BLE adapter initialized: {}", adapter.name());

    let scan = ScanTiming {
        settle: config.session.settle(),
        window: config.session.scan_window(),
    };
    let timing = SessionTiming {
        connect_timeout: config.session.connect_timeout(),
        poll_interval: config.session.poll_interval(),
    };
    let handler = SessionHandler::new(channels, timing, logger);

    let mut console = StdConsole::new();
    SessionLoop::new(&adapter, scan, handler)
        .run(&mut console)
        .await?;

    info!("Shutting down...");
    Ok(())
}
