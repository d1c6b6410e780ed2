// Configuration module for the BLE session logger

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::profile::{Channels, HardwareProfile};

const DEFAULT_CONFIG_NAME: &str = "ble-logger";
const ENV_PREFIX: &str = "BLE_LOGGER";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bluetooth: BluetoothConfig,
    pub session: SessionConfig,
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Adapter name such as `hci0`; the default adapter when unset.
    pub adapter: Option<String>,
    pub profile: HardwareProfile,
    pub read_characteristic: Option<Uuid>,
    pub write_characteristic: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub settle_secs: u64,
    pub scan_secs: u64,
    pub connect_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub directory: PathBuf,
    pub file_suffix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            settle_secs: 2,
            scan_secs: 5,
            connect_timeout_secs: 30,
            poll_interval_secs: 1,
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            directory: PathBuf::from("."),
            file_suffix: "Data.csv".to_string(),
        }
    }
}

impl BluetoothConfig {
    pub fn channels(&self) -> Channels {
        self.profile
            .channels()
            .with_overrides(self.read_characteristic, self.write_characteristic)
    }
}

impl SessionConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn scan_window(&self) -> Duration {
        Duration::from_secs(self.scan_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl SinkConfig {
    /// `<directory>/<YYYYMMDD><suffix>` for the given day.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        let file_name = format!("{}{}", date.format("%Y%m%d"), self.file_suffix);
        self.directory.join(file_name)
    }
}

/// Loads the optional config file, then applies `BLE_LOGGER__*` environment overrides.
pub fn load_config(path: Option<&str>) -> Result<Config> {
    let file = match path {
        Some(path) => ::config::File::with_name(path),
        None => ::config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    let settings = ::config::Config::builder()
        .add_source(file)
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
