use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};
use vantage_schema::Record;
use vantage_transport::{ByteTransport, SerialConfig, SerialLink};

use crate::error::{DeviceError, Result};
use crate::model::Model;
use crate::station::Station;

/// What [`RealtimeContainer::create`] waits for before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnCreate {
    /// Return immediately; the device opens in the background. Operations
    /// may fail with `ClosedConnection` until the `Open` event fires.
    DoNothing,
    /// Wait until the transport has opened.
    WaitUntilOpen,
    /// Wait until the first update cycle completed, successfully or not.
    WaitForFirstUpdate,
    /// Wait until the first update cycle completed without error.
    WaitForFirstValidUpdate,
}

/// Configuration of a realtime container.
#[derive(Debug, Clone)]
pub struct ContainerSettings {
    /// Serial device path.
    pub path: String,
    /// Serial speed.
    pub baud_rate: u32,
    /// Console model behind the link.
    pub model: Model,
    /// Period between update cycles.
    pub update_interval: Duration,
    /// Backoff before reopening after a failed cycle.
    pub reconnect_delay: Duration,
    /// Startup gate.
    pub on_create: OnCreate,
}

impl ContainerSettings {
    pub fn new(path: impl Into<String>, model: Model) -> Self {
        Self {
            path: path.into(),
            baud_rate: SerialConfig::DEFAULT_BAUD_RATE,
            model,
            update_interval: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(10),
            on_create: OnCreate::WaitForFirstUpdate,
        }
    }
}

/// Lifecycle events of a container, in per-generation order:
/// `Open` → `Update` → `ValidUpdate` (success only) → … → `Close`.
#[derive(Debug, Clone)]
pub enum ContainerEvent {
    /// The transport opened (once per connection generation).
    Open,
    /// An update cycle completed; `error` is set iff the cycle failed.
    Update { error: Option<Arc<DeviceError>> },
    /// An update cycle completed without error.
    ValidUpdate,
    /// The container closed: timers cleared, transport closed.
    Close,
}

type Factory = Box<dyn FnMut() -> Box<dyn ByteTransport> + Send>;

#[derive(Default)]
struct Shared {
    subscribers: Mutex<Vec<Sender<ContainerEvent>>>,
    latest: Mutex<Option<Record>>,
}

impl Shared {
    fn emit(&self, event: ContainerEvent) {
        lock(&self.subscribers).retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Worker {
    handle: JoinHandle<()>,
    stop: Sender<()>,
}

/// Supervises a station: opens it, refreshes realtime data periodically,
/// recovers from transport faults, and fans lifecycle events out to
/// subscribers.
///
/// Exactly one station is live at a time; all console I/O is confined to
/// the container's worker thread.
pub struct RealtimeContainer {
    settings: ContainerSettings,
    shared: Arc<Shared>,
    factory: Arc<Mutex<Factory>>,
    worker: Option<Worker>,
}

impl std::fmt::Debug for RealtimeContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeContainer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RealtimeContainer {
    /// Create a container over a serial port and start it per the
    /// configured startup gate.
    pub fn create(settings: ContainerSettings) -> Result<Self> {
        if settings.path.is_empty() {
            return Err(DeviceError::MissingDevicePath);
        }
        let serial = SerialConfig {
            path: settings.path.clone(),
            baud_rate: settings.baud_rate,
        };
        Self::create_with_transport(settings, move || {
            Box::new(SerialLink::new(serial.clone())) as Box<dyn ByteTransport>
        })
    }

    /// Create a container over transports produced by `factory` (one per
    /// connection generation).
    pub fn create_with_transport(
        settings: ContainerSettings,
        factory: impl FnMut() -> Box<dyn ByteTransport> + Send + 'static,
    ) -> Result<Self> {
        let mut container = Self {
            settings,
            shared: Arc::new(Shared::default()),
            factory: Arc::new(Mutex::new(Box::new(factory))),
            worker: None,
        };
        container.open()?;
        Ok(container)
    }

    /// Start a new connection generation, honoring the startup gate.
    ///
    /// Any previous generation is fully closed first, so exactly one live
    /// device exists at any time.
    pub fn open(&mut self) -> Result<()> {
        self.close()?;

        let gate = match self.settings.on_create {
            OnCreate::DoNothing => None,
            _ => Some(self.subscribe()),
        };

        let (stop_tx, stop_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let factory = Arc::clone(&self.factory);
        let settings = self.settings.clone();
        let handle = std::thread::spawn(move || run_supervisor(settings, shared, factory, stop_rx));
        self.worker = Some(Worker {
            handle,
            stop: stop_tx,
        });

        let Some(gate) = gate else {
            return Ok(());
        };
        loop {
            match gate.recv() {
                Ok(ContainerEvent::Open) if self.settings.on_create == OnCreate::WaitUntilOpen => {
                    return Ok(())
                }
                Ok(ContainerEvent::Update { .. })
                    if self.settings.on_create == OnCreate::WaitForFirstUpdate =>
                {
                    return Ok(())
                }
                Ok(ContainerEvent::ValidUpdate)
                    if self.settings.on_create == OnCreate::WaitForFirstValidUpdate =>
                {
                    return Ok(())
                }
                Ok(ContainerEvent::Close) | Err(_) => return Err(DeviceError::ClosedConnection),
                Ok(_) => {}
            }
        }
    }

    /// Stop the supervisor, close the transport and deliver `Close`.
    ///
    /// Idempotent; safe to call in any state. Returns only after the worker
    /// has fully stopped.
    pub fn close(&mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop.send(());
            let _ = worker.handle.join();
            self.shared.emit(ContainerEvent::Close);
            info!("realtime container closed");
        }
        Ok(())
    }

    /// Register a lifecycle-event subscriber.
    ///
    /// Subscribers persist across connection generations; a dropped
    /// receiver is pruned on the next emission.
    pub fn subscribe(&self) -> Receiver<ContainerEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.shared.subscribers).push(tx);
        rx
    }

    /// The most recent successfully fetched realtime record.
    pub fn latest(&self) -> Option<Record> {
        lock(&self.shared.latest).clone()
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// Block until the next update cycle completes, returning its error,
    /// if any.
    pub fn wait_for_update(&self) -> Result<Option<Arc<DeviceError>>> {
        if self.worker.is_none() {
            return Err(DeviceError::ClosedConnection);
        }
        let events = self.subscribe();
        loop {
            match events.recv() {
                Ok(ContainerEvent::Update { error }) => return Ok(error),
                Ok(ContainerEvent::Close) | Err(_) => return Err(DeviceError::ClosedConnection),
                Ok(_) => {}
            }
        }
    }

    /// Block until an update cycle completes without error.
    pub fn wait_for_valid_update(&self) -> Result<()> {
        if self.worker.is_none() {
            return Err(DeviceError::ClosedConnection);
        }
        let events = self.subscribe();
        loop {
            match events.recv() {
                Ok(ContainerEvent::ValidUpdate) => return Ok(()),
                Ok(ContainerEvent::Close) | Err(_) => return Err(DeviceError::ClosedConnection),
                Ok(_) => {}
            }
        }
    }
}

impl Drop for RealtimeContainer {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// The worker loop: one update cycle, then sleep until the next period or
/// the stop signal, whichever comes first.
fn run_supervisor(
    settings: ContainerSettings,
    shared: Arc<Shared>,
    factory: Arc<Mutex<Factory>>,
    stop: Receiver<()>,
) {
    let mut station: Option<Station<Box<dyn ByteTransport>>> = None;

    loop {
        let wait = match run_cycle(&settings, &shared, &factory, &mut station) {
            Ok(()) => {
                shared.emit(ContainerEvent::Update { error: None });
                shared.emit(ContainerEvent::ValidUpdate);
                settings.update_interval
            }
            Err(err) => {
                warn!(error = %err, "update cycle failed, scheduling reconnect");
                if let Some(mut dead) = station.take() {
                    let _ = dead.close();
                }
                shared.emit(ContainerEvent::Update {
                    error: Some(Arc::new(err)),
                });
                settings.reconnect_delay
            }
        };

        match stop.recv_timeout(wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    if let Some(mut station) = station.take() {
        let _ = station.close();
    }
}

/// Open (if needed), wake, fetch, store. Any error aborts the cycle.
fn run_cycle(
    settings: &ContainerSettings,
    shared: &Shared,
    factory: &Mutex<Factory>,
    station: &mut Option<Station<Box<dyn ByteTransport>>>,
) -> Result<()> {
    if station.is_none() {
        let transport = {
            let mut make = lock(factory);
            (*make)()
        };
        let mut fresh = Station::new(transport, settings.model);
        fresh.open()?;
        shared.emit(ContainerEvent::Open);
        *station = Some(fresh);
    }
    let Some(station) = station.as_mut() else {
        return Err(DeviceError::ClosedConnection);
    };

    station.wake_up()?;
    let record = if settings.model.has_loop2() {
        station.rich_realtime_data()?
    } else {
        station.loop1()?
    };
    *lock(&shared.latest) = Some(record);
    Ok(())
}
