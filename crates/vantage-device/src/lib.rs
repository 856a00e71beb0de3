//! High-level driver for Davis Vantage weather consoles.
//!
//! This is the "just works" layer. Pick a [`Model`], open a [`Station`] over
//! a serial path, and fetch typed realtime records; or hand the station's
//! settings to a [`RealtimeContainer`] and subscribe to periodic updates:
//!
//! ```no_run
//! use vantage_device::{ContainerSettings, Model, RealtimeContainer};
//!
//! let settings = ContainerSettings::new("/dev/ttyUSB0", Model::VantagePro2);
//! let container = RealtimeContainer::create(settings)?;
//! let latest = container.latest();
//! # Ok::<(), vantage_device::DeviceError>(())
//! ```

pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod realtime;
pub mod records;
pub mod station;

pub use engine::{EngineConfig, ProtocolEngine};
pub use error::{DeviceError, Result};
pub use model::Model;
pub use realtime::{ContainerEvent, ContainerSettings, OnCreate, RealtimeContainer};
pub use station::Station;
