// Record logger: turns notification payloads into rows of the CSV log sink

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDateTime};
use log::{debug, info};

use crate::error::{Error, Result};

pub const HEADER: [&str; 6] = ["Date", "Time", "Ch0", "Ch1", "Ch2", "Ch3"];

const TIMESTAMP_FORMAT: &str = "%d-%m-%Y, %H:%M:%S";

/// Character ranges of the four channel readings in a frame such as `0123 4567 89ab cdef`.
const CHANNEL_SLICES: [(usize, usize); 4] = [(0, 4), (5, 9), (10, 14), (15, 19)];

/// One data row of the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// `DD-MM-YYYY, HH:MM:SS`; the embedded comma fills the Date and Time columns.
    pub timestamp: String,
    pub channels: [String; 4],
}

impl LogRecord {
    /// Slices a fixed-width frame by position. Short frames give short or empty fields.
    ///
    /// Channels 0, 2 and 3 are trimmed; channel 1 is kept verbatim.
    pub fn from_frame(frame: &str, at: NaiveDateTime) -> Self {
        let field = |index: usize| {
            let (start, end) = CHANNEL_SLICES[index];
            frame.chars().skip(start).take(end - start).collect::<String>()
        };

        LogRecord {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            channels: [
                field(0).trim().to_string(),
                field(1),
                field(2).trim().to_string(),
                field(3).trim().to_string(),
            ],
        }
    }

    pub fn to_row(&self) -> String {
        let [ch0, ch1, ch2, ch3] = &self.channels;
        format!("{},{ch0},{ch1},{ch2},{ch3},\n", self.timestamp)
    }
}

pub fn header_row() -> String {
    format!("{},\n", HEADER.join(","))
}

/// Appends records to the sink file. The header is written whenever the file is empty.
pub struct RecordLogger {
    path: PathBuf,
    append: Mutex<()>,
}

impl RecordLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordLogger {
            path: path.into(),
            append: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Handles one notification payload.
    ///
    /// An empty sink consumes the payload to write the header instead of a data row. Emptiness is
    /// checked on every call, so a sink truncated mid-session gets a fresh header.
    pub fn ingest(&self, payload: &[u8]) -> Result<()> {
        self.ingest_at(payload, Local::now().naive_local())
    }

    pub fn ingest_at(&self, payload: &[u8], at: NaiveDateTime) -> Result<()> {
        let frame = String::from_utf8(payload.to_vec())?;

        let _guard = self.append.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.open()?;

        let is_empty = file.metadata().map_err(|e| self.sink_error(e))?.len() == 0;
        let row = if is_empty {
            info!("Created log sink {}", self.path.display());
            header_row()
        } else {
            LogRecord::from_frame(&frame, at).to_row()
        };

        debug!("Appending row {:?}", row.trim_end());
        file.write_all(row.as_bytes())
            .map_err(|e| self.sink_error(e))
    }

    fn open(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.sink_error(e))
    }

    fn sink_error(&self, source: std::io::Error) -> Error {
        Error::Sink {
            path: self.path.clone(),
            source,
        }
    }
}
