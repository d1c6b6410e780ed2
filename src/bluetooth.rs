// Bluetooth Low Energy module using bluer crate

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bluer::gatt::remote::Characteristic;
use bluer::{Adapter, AdapterEvent, Address, Device};
use futures::{pin_mut, StreamExt};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::device::{Central, DeviceDescriptor, Link, Notifications};
use crate::error::{Error, Result};

pub struct BleAdapter {
    adapter: Adapter,
    name: String,
}

impl BleAdapter {
    /// Opens the named adapter, or the default one, and powers it on.
    pub async fn new(adapter_name: Option<&str>) -> Result<Self> {
        let session = bluer::Session::new().await.map_err(Error::Hardware)?;
        let adapter = match adapter_name {
            Some(name) => session.adapter(name),
            None => session.default_adapter().await,
        }
        .map_err(Error::Hardware)?;

        let name = adapter.name().to_string();
        info!("Using Bluetooth adapter: {}", name);

        // Ensure adapter is powered on
        adapter.set_powered(true).await.map_err(Error::Hardware)?;

        Ok(BleAdapter { adapter, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn describe(&self, address: Address) -> Result<DeviceDescriptor> {
        let device = self.adapter.device(address).map_err(Error::Hardware)?;
        let name = match device.name().await {
            Ok(name) => name,
            Err(err) => {
                debug!("No name for {}: {}", address, err);
                None
            }
        };
        Ok(DeviceDescriptor {
            address: address.to_string(),
            name,
        })
    }
}

#[async_trait]
impl Central for BleAdapter {
    async fn discover(&self, window: Duration) -> Result<Vec<DeviceDescriptor>> {
        let mut seen = Vec::new();
        {
            let events = self
                .adapter
                .discover_devices()
                .await
                .map_err(Error::Hardware)?;
            pin_mut!(events);

            let deadline = tokio::time::sleep(window);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    event = events.next() => match event {
                        Some(AdapterEvent::DeviceAdded(address)) => {
                            debug!("Discovered {}", address);
                            seen.push(address);
                        }
                        Some(_) => {}
                        None => break,
                    },
                }
            }
            // Dropping the event stream stops discovery.
        }

        let mut devices = Vec::with_capacity(seen.len());
        for address in seen {
            devices.push(self.describe(address).await?);
        }
        Ok(devices)
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn Link>> {
        let parsed: Address = address.parse().map_err(|_| Error::Connection {
            address: address.to_string(),
            reason: "not a bluetooth address".to_string(),
        })?;
        let device = self.adapter.device(parsed).map_err(Error::Hardware)?;

        info!("Connecting to device: {}", address);
        device.connect().await.map_err(|err| Error::Connection {
            address: address.to_string(),
            reason: err.to_string(),
        })?;

        Ok(Box::new(BleLink {
            device,
            characteristics: Mutex::new(HashMap::new()),
        }))
    }
}

/// A connected peripheral with its GATT characteristics resolved on demand.
pub struct BleLink {
    device: Device,
    characteristics: Mutex<HashMap<Uuid, Characteristic>>,
}

impl BleLink {
    fn connection_error(&self, err: bluer::Error) -> Error {
        Error::Connection {
            address: self.device.address().to_string(),
            reason: err.to_string(),
        }
    }

    async fn characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        if let Some(found) = self.lookup_cached(uuid) {
            return Ok(found);
        }

        let services = self
            .device
            .services()
            .await
            .map_err(|e| self.connection_error(e))?;
        for service in services {
            let characteristics = service
                .characteristics()
                .await
                .map_err(|e| self.connection_error(e))?;
            for characteristic in characteristics {
                if characteristic.uuid().await.ok() == Some(uuid) {
                    self.characteristics
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .insert(uuid, characteristic.clone());
                    return Ok(characteristic);
                }
            }
        }

        Err(Error::MissingCharacteristic(uuid))
    }

    fn lookup_cached(&self, uuid: Uuid) -> Option<Characteristic> {
        self.characteristics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&uuid)
            .cloned()
    }
}

#[async_trait]
impl Link for BleLink {
    async fn subscribe(&self, characteristic: Uuid) -> Result<Notifications> {
        let target = self.characteristic(characteristic).await?;
        let notifications = target
            .notify()
            .await
            .map_err(|e| self.connection_error(e))?;
        info!("Subscribed to notifications on {}", characteristic);
        Ok(notifications.boxed())
    }

    async fn write(&self, characteristic: Uuid, data: &[u8]) -> Result<()> {
        let target = self.characteristic(characteristic).await?;
        target
            .write(data)
            .await
            .map_err(|e| self.connection_error(e))
    }

    async fn is_connected(&self) -> bool {
        match self.device.is_connected().await {
            Ok(connected) => connected,
            Err(err) => {
                warn!("Connection state unavailable: {}", err);
                false
            }
        }
    }

    async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from {}", self.device.address());
        self.device
            .disconnect()
            .await
            .map_err(|e| self.connection_error(e))
    }
}
