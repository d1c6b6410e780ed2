// Device selection menu

use log::debug;

use crate::console::Console;
use crate::device::DeviceDescriptor;
use crate::error::Result;

pub const EXIT_CODE: i64 = 99;
pub const RESCAN_CODE: i64 = -1;

const RETRY_MESSAGE: &str = "Please make valid selection.";

/// What the operator asked for at the selection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    ValidIndex(u32),
    ExitSignal,
    RescanSignal,
    Invalid,
}

impl SelectionOutcome {
    /// Resolves operator text against a sweep of `candidates` devices.
    pub fn parse(response: &str, candidates: usize) -> Self {
        let Ok(value) = response.trim().parse::<i64>() else {
            return SelectionOutcome::Invalid;
        };

        match value {
            EXIT_CODE => SelectionOutcome::ExitSignal,
            RESCAN_CODE => SelectionOutcome::RescanSignal,
            v if v >= 0 && (v as u64) < candidates as u64 => match u32::try_from(v) {
                Ok(index) => SelectionOutcome::ValidIndex(index),
                Err(_) => SelectionOutcome::Invalid,
            },
            _ => SelectionOutcome::Invalid,
        }
    }
}

/// Lists the candidates and reads one selection from the operator.
///
/// End of input counts as the exit signal.
pub async fn select(
    candidates: &[DeviceDescriptor],
    console: &mut dyn Console,
) -> Result<SelectionOutcome> {
    console.show("Please select device: ");
    for (index, device) in candidates.iter().enumerate() {
        console.show(&format!("{index}: {}", device.display_name()));
    }
    console.show(&format!("{EXIT_CODE}: Exit program"));
    console.show(&format!("{RESCAN_CODE}: Re-scan for BLE devices"));

    let Some(response) = console.prompt("Select device: ").await? else {
        debug!("Operator input closed during selection");
        return Ok(SelectionOutcome::ExitSignal);
    };

    let outcome = SelectionOutcome::parse(&response, candidates.len());
    debug!("Selection {:?} -> {:?}", response, outcome);

    if matches!(
        outcome,
        SelectionOutcome::Invalid | SelectionOutcome::RescanSignal
    ) {
        console.show(RETRY_MESSAGE);
    }

    Ok(outcome)
}
