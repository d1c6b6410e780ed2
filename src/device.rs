// Transport seams between the session logic and the BLE stack

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::Result;

/// One peripheral seen during a discovery sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub address: String,
    pub name: Option<String>,
}

impl DeviceDescriptor {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.address)
    }
}

/// Payloads pushed by the peripheral on a subscribed characteristic.
pub type Notifications = BoxStream<'static, Vec<u8>>;

/// The local radio: finds peripherals and opens connections to them.
#[async_trait]
pub trait Central: Send + Sync {
    /// Runs discovery for `window` and reports devices in the order they were seen.
    async fn discover(&self, window: Duration) -> Result<Vec<DeviceDescriptor>>;

    async fn connect(&self, address: &str) -> Result<Box<dyn Link>>;
}

/// An open connection to one peripheral.
#[async_trait]
pub trait Link: Send + Sync {
    /// Subscribes to notifications; dropping the stream ends the subscription.
    async fn subscribe(&self, characteristic: Uuid) -> Result<Notifications>;

    /// Writes without waiting for an acknowledgement from the peripheral.
    async fn write(&self, characteristic: Uuid, data: &[u8]) -> Result<()>;

    async fn is_connected(&self) -> bool;

    async fn disconnect(&self) -> Result<()>;
}
