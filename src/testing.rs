// In-memory central, link and console used by the unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use uuid::Uuid;

use crate::console::Console;
use crate::device::{Central, DeviceDescriptor, Link, Notifications};
use crate::error::{Error, Result};

#[derive(Default)]
pub struct LinkState {
    connected: AtomicBool,
    fail_subscribe: AtomicBool,
    fail_writes: AtomicBool,
    disconnects: AtomicUsize,
    drop_after_writes: Mutex<Option<usize>>,
    writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
    subscriptions: Mutex<Vec<Uuid>>,
    inbox: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl LinkState {
    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn subscriptions(&self) -> Vec<Uuid> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

pub struct FakeCentral {
    devices: Vec<DeviceDescriptor>,
    radio: bool,
    refuse: bool,
    connect_delay: Option<Duration>,
    link: Arc<LinkState>,
    outbox: mpsc::UnboundedSender<Vec<u8>>,
    windows: Mutex<Vec<Duration>>,
    connects: Mutex<Vec<String>>,
}

impl FakeCentral {
    pub fn with_devices(devices: &[(&str, Option<&str>)]) -> Self {
        let (outbox, inbox) = mpsc::unbounded();
        let link = LinkState {
            inbox: Mutex::new(Some(inbox)),
            ..LinkState::default()
        };
        FakeCentral {
            devices: devices
                .iter()
                .map(|(address, name)| DeviceDescriptor {
                    address: address.to_string(),
                    name: name.map(str::to_string),
                })
                .collect(),
            radio: true,
            refuse: false,
            connect_delay: None,
            link: Arc::new(link),
            outbox,
            windows: Mutex::new(Vec::new()),
            connects: Mutex::new(Vec::new()),
        }
    }

    pub fn without_radio() -> Self {
        FakeCentral {
            radio: false,
            ..FakeCentral::with_devices(&[])
        }
    }

    /// Connection attempts take this long before succeeding.
    pub fn slow_connect(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Connection attempts fail as if the peripheral rejected them.
    pub fn refuse_connect(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// The peripheral lacks the notification characteristic.
    pub fn failing_subscribe(self) -> Self {
        self.link.fail_subscribe.store(true, Ordering::SeqCst);
        self
    }

    /// Every write to the peripheral fails.
    pub fn failing_writes(self) -> Self {
        self.link.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    /// The peripheral goes away once it has received `count` writes.
    pub fn drop_after_writes(self, count: usize) -> Self {
        *self.link.drop_after_writes.lock().unwrap() = Some(count);
        self
    }

    /// Queues a notification the peripheral will deliver once subscribed.
    pub fn notify(&self, payload: impl AsRef<[u8]>) {
        self.outbox
            .unbounded_send(payload.as_ref().to_vec())
            .unwrap();
    }

    pub fn link(&self) -> Arc<LinkState> {
        Arc::clone(&self.link)
    }

    pub fn discover_windows(&self) -> Vec<Duration> {
        self.windows.lock().unwrap().clone()
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl Central for FakeCentral {
    async fn discover(&self, window: Duration) -> Result<Vec<DeviceDescriptor>> {
        if !self.radio {
            return Err(Error::Hardware(bluer::Error {
                kind: bluer::ErrorKind::NotReady,
                message: "adapter is powered off".to_string(),
            }));
        }
        self.windows.lock().unwrap().push(window);
        Ok(self.devices.clone())
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn Link>> {
        self.connects.lock().unwrap().push(address.to_string());
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.refuse {
            return Err(Error::Connection {
                address: address.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        self.link.connected.store(true, Ordering::SeqCst);
        Ok(Box::new(FakeLink {
            state: Arc::clone(&self.link),
        }))
    }
}

struct FakeLink {
    state: Arc<LinkState>,
}

#[async_trait]
impl Link for FakeLink {
    async fn subscribe(&self, characteristic: Uuid) -> Result<Notifications> {
        self.state.subscriptions.lock().unwrap().push(characteristic);
        if self.state.fail_subscribe.load(Ordering::SeqCst) {
            return Err(Error::MissingCharacteristic(characteristic));
        }
        match self.state.inbox.lock().unwrap().take() {
            Some(inbox) => Ok(inbox.boxed()),
            None => Ok(futures::stream::empty::<Vec<u8>>().boxed()),
        }
    }

    async fn write(&self, characteristic: Uuid, data: &[u8]) -> Result<()> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Connection {
                address: "fake".to_string(),
                reason: "write rejected".to_string(),
            });
        }
        let mut writes = self.state.writes.lock().unwrap();
        writes.push((characteristic, data.to_vec()));
        if *self.state.drop_after_writes.lock().unwrap() == Some(writes.len()) {
            self.state.connected.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Replays operator lines and records everything shown.
#[derive(Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    pub shown: Vec<String>,
    pub prompts: Vec<String>,
}

impl ScriptedConsole {
    pub fn new(inputs: &[&str]) -> Self {
        ScriptedConsole {
            inputs: inputs.iter().map(|line| line.to_string()).collect(),
            ..ScriptedConsole::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front())
    }

    fn show(&mut self, line: &str) {
        self.shown.push(line.to_string());
    }
}
