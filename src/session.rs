// Session handler: one connection, one notification pump, one operator command loop

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::console::Console;
use crate::device::{Central, DeviceDescriptor, Link, Notifications};
use crate::error::{Error, Result};
use crate::profile::Channels;
use crate::record::RecordLogger;

/// Operator command that ends the session.
pub const EXIT_COMMAND: &str = "e";

#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    pub connect_timeout: Duration,
    /// Pause before each operator prompt.
    pub poll_interval: Duration,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The operator typed the exit command or closed the console.
    OperatorExit,
    /// The peripheral went away on its own.
    Dropped,
}

pub struct SessionHandler {
    channels: Channels,
    timing: SessionTiming,
    logger: Arc<RecordLogger>,
}

impl SessionHandler {
    pub fn new(channels: Channels, timing: SessionTiming, logger: Arc<RecordLogger>) -> Self {
        SessionHandler {
            channels,
            timing,
            logger,
        }
    }

    /// Connects to `device` and forwards operator commands until either side ends the session.
    ///
    /// Any failure after the connection is up closes the link before the error is returned.
    pub async fn run(
        &self,
        central: &dyn Central,
        device: &DeviceDescriptor,
        console: &mut dyn Console,
    ) -> Result<SessionEnd> {
        let link = self.connect(central, device).await?;

        match self.attached(link.as_ref(), console).await {
            Ok(end) => Ok(end),
            Err(err) => {
                if let Err(close_err) = link.disconnect().await {
                    warn!("Disconnect after failed session with {}: {}", device, close_err);
                }
                Err(err)
            }
        }
    }

    async fn attached(&self, link: &dyn Link, console: &mut dyn Console) -> Result<SessionEnd> {
        let notifications = link.subscribe(self.channels.read).await?;
        let pump = self.spawn_pump(notifications);

        let end = self.command_loop(link, console, &pump).await;
        pump.abort();
        end
    }

    async fn connect(
        &self,
        central: &dyn Central,
        device: &DeviceDescriptor,
    ) -> Result<Box<dyn Link>> {
        let timeout = self.timing.connect_timeout;
        match tokio::time::timeout(timeout, central.connect(&device.address)).await {
            Ok(link) => {
                let link = link?;
                info!("Connected to {}", device);
                Ok(link)
            }
            Err(_) => Err(Error::ConnectTimeout {
                address: device.address.clone(),
                timeout,
            }),
        }
    }

    /// Drains notifications into the record logger, one payload at a time. Appends run on the
    /// blocking pool and each one completes before the next payload is taken.
    fn spawn_pump(&self, mut notifications: Notifications) -> JoinHandle<()> {
        let logger = Arc::clone(&self.logger);
        tokio::spawn(async move {
            while let Some(payload) = notifications.next().await {
                debug!("received: {:?}", String::from_utf8_lossy(&payload));
                let logger = Arc::clone(&logger);
                match tokio::task::spawn_blocking(move || logger.ingest(&payload)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => error!("Dropped notification: {}", err),
                    Err(err) => error!("Record append task failed: {}", err),
                }
            }
            debug!("Notification stream closed");
        })
    }

    async fn command_loop(
        &self,
        link: &dyn Link,
        console: &mut dyn Console,
        pump: &JoinHandle<()>,
    ) -> Result<SessionEnd> {
        while link.is_connected().await {
            tokio::time::sleep(self.timing.poll_interval).await;

            let command = console.prompt("Enter command: ").await?;
            match command.as_deref() {
                Some(EXIT_COMMAND) | None => {
                    pump.abort();
                    link.disconnect().await?;
                    return Ok(SessionEnd::OperatorExit);
                }
                Some(text) => {
                    debug!("Sending {:?}", text);
                    link.write(self.channels.write, text.as_bytes()).await?;
                }
            }
        }

        info!("Device dropped the connection");
        Ok(SessionEnd::Dropped)
    }
}
