// Session loop: select a device, run a session on it, repeat until the operator exits

use log::{debug, info, warn};

use crate::console::Console;
use crate::device::{Central, DeviceDescriptor};
use crate::error::Result;
use crate::scanner::{scan_devices, ScanTiming};
use crate::selector::{select, SelectionOutcome};
use crate::session::SessionHandler;

#[derive(Debug)]
enum State {
    NoDevice,
    HasDevice(DeviceDescriptor),
}

pub struct SessionLoop<'a> {
    central: &'a dyn Central,
    scan: ScanTiming,
    handler: SessionHandler,
}

impl<'a> SessionLoop<'a> {
    pub fn new(central: &'a dyn Central, scan: ScanTiming, handler: SessionHandler) -> Self {
        SessionLoop {
            central,
            scan,
            handler,
        }
    }

    /// Runs until the operator chooses exit. Hardware and console failures end the loop with an
    /// error; connection failures only end the current session.
    pub async fn run(&self, console: &mut dyn Console) -> Result<()> {
        let mut state = State::NoDevice;

        loop {
            debug!("Session state: {:?}", state);
            state = match state {
                State::NoDevice => match self.choose_device(console).await? {
                    Some(Choice::Device(device)) => State::HasDevice(device),
                    Some(Choice::Exit) => return Ok(()),
                    None => State::NoDevice,
                },
                State::HasDevice(device) => {
                    match self.handler.run(self.central, &device, console).await {
                        Ok(end) => info!("Session with {} ended: {:?}", device, end),
                        Err(err) if err.ends_session() => {
                            warn!("Session with {} failed: {}", device, err)
                        }
                        Err(err) => return Err(err),
                    }
                    console.show("Device disconnected.\n");
                    State::NoDevice
                }
            };
        }
    }

    async fn choose_device(&self, console: &mut dyn Console) -> Result<Option<Choice>> {
        console.show("Scanning for Bluetooth LE hardware...");
        let candidates = scan_devices(self.central, self.scan).await?;

        let choice = match select(&candidates, console).await? {
            SelectionOutcome::ExitSignal => Some(Choice::Exit),
            SelectionOutcome::ValidIndex(index) => candidates
                .get(index as usize)
                .cloned()
                .map(Choice::Device),
            SelectionOutcome::RescanSignal | SelectionOutcome::Invalid => None,
        };
        Ok(choice)
    }
}

enum Choice {
    Device(DeviceDescriptor),
    Exit,
}
