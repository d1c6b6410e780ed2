// Error types shared by the scanner, session handler and record logger

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The adapter or the bluetooth daemon is unavailable.
    #[error("bluetooth hardware unavailable: {0}")]
    Hardware(#[source] bluer::Error),

    #[error("connection to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    #[error("connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    #[error("characteristic {0} not found on device")]
    MissingCharacteristic(Uuid),

    #[error("notification payload is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("log sink {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("operator console: {0}")]
    Console(#[source] io::Error),

    #[error("configuration: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl Error {
    /// Errors that end the current device session but leave the session loop running.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            Error::ConnectTimeout { .. } | Error::Connection { .. } | Error::MissingCharacteristic(_)
        )
    }
}
