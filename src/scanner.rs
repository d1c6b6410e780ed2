// Device discovery sweep

use std::time::Duration;

use log::info;

use crate::device::{Central, DeviceDescriptor};
use crate::error::Result;

/// Timing of one discovery sweep.
#[derive(Debug, Clone, Copy)]
pub struct ScanTiming {
    /// Delay before discovery starts, giving the radio stack time to settle.
    pub settle: Duration,
    pub window: Duration,
}

/// Waits for the radio to settle, then returns every peripheral the platform reports.
///
/// No filtering or deduplication is applied; a hardware error is returned to the caller as is.
pub async fn scan_devices(
    central: &dyn Central,
    timing: ScanTiming,
) -> Result<Vec<DeviceDescriptor>> {
    tokio::time::sleep(timing.settle).await;

    info!("Starting BLE device scan for {:?}", timing.window);
    let devices = central.discover(timing.window).await?;
    info!("Scan found {} device(s)", devices.len());

    Ok(devices)
}
