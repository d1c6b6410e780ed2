// Characteristic identifiers for the supported peripheral firmwares

use serde::Deserialize;
use uuid::{uuid, Uuid};

/// Nordic UART service characteristic used as RX on Arduino firmware and TX on SEGGER firmware.
const NUS_CHAR_2: Uuid = uuid!("6E400002-B5A3-F393-E0A9-E50E24DCCA9E");

/// Nordic UART service characteristic used as TX on Arduino firmware and RX on SEGGER firmware.
const NUS_CHAR_3: Uuid = uuid!("6E400003-B5A3-F393-E0A9-E50E24DCCA9E");

/// Target hardware the peripheral firmware was built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareProfile {
    /// nRF52 development board running the Arduino sketch.
    #[default]
    Arduino,
    /// Alternate chip running the SEGGER build.
    Segger,
}

/// The pair of characteristics a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channels {
    /// Notifications from the peripheral arrive here.
    pub read: Uuid,
    /// Operator commands are written here.
    pub write: Uuid,
}

impl HardwareProfile {
    pub fn channels(self) -> Channels {
        match self {
            HardwareProfile::Arduino => Channels {
                read: NUS_CHAR_2,
                write: NUS_CHAR_3,
            },
            HardwareProfile::Segger => Channels {
                read: NUS_CHAR_3,
                write: NUS_CHAR_2,
            },
        }
    }
}

impl Channels {
    pub fn with_overrides(self, read: Option<Uuid>, write: Option<Uuid>) -> Self {
        Channels {
            read: read.unwrap_or(self.read),
            write: write.unwrap_or(self.write),
        }
    }
}
