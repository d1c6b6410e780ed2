// Line-oriented operator console

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::{Error, Result};

#[async_trait]
pub trait Console: Send {
    /// Shows `prompt` and waits for one line; `None` once input is exhausted.
    async fn prompt(&mut self, prompt: &str) -> Result<Option<String>>;

    fn show(&mut self, line: &str);
}

/// Reads operator lines from stdin without blocking the runtime.
pub struct StdConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl StdConsole {
    pub fn new() -> Self {
        StdConsole {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}").map_err(Error::Console)?;
        stdout.flush().map_err(Error::Console)?;

        let line = self.lines.next_line().await.map_err(Error::Console)?;
        Ok(line.map(|line| line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn show(&mut self, line: &str) {
        println!("{line}");
    }
}
