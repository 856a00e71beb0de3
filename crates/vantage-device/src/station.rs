use tracing::info;
use vantage_schema::{Parser, Record};
use vantage_transport::{ByteTransport, SerialConfig, SerialLink};

use crate::engine::{EngineConfig, ProtocolEngine};
use crate::error::{DeviceError, Result};
use crate::merge;
use crate::model::Model;
use crate::records;

/// A console of a known model, driven over an exclusive transport.
///
/// The station gates operations by model capability and turns raw packet
/// payloads into typed records. All I/O is delegated to the
/// [`ProtocolEngine`]; callers should [`wake_up`](Self::wake_up) the console
/// before each burst of commands.
pub struct Station<T> {
    engine: ProtocolEngine<T>,
    model: Model,
}

impl Station<SerialLink> {
    /// A station over a serial port. The port is not opened yet.
    pub fn serial(config: SerialConfig, model: Model) -> Self {
        Self::new(SerialLink::new(config), model)
    }
}

impl<T: ByteTransport> Station<T> {
    pub fn new(transport: T, model: Model) -> Self {
        Self {
            engine: ProtocolEngine::new(transport),
            model,
        }
    }

    pub fn with_engine_config(transport: T, model: Model, config: EngineConfig) -> Self {
        Self {
            engine: ProtocolEngine::with_config(transport, config),
            model,
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_open()
    }

    /// Open the transport.
    ///
    /// A station that is already connected must be closed first; the
    /// console cannot serve two masters.
    pub fn open(&mut self) -> Result<()> {
        if self.engine.is_open() {
            return Err(DeviceError::DeviceStillConnected);
        }
        self.engine.open()?;
        info!(model = %self.model, "station connected");
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.engine.close()
    }

    pub fn wake_up(&mut self) -> Result<()> {
        self.engine.wake_up()
    }

    pub fn validate_connection(&mut self) -> Result<()> {
        self.engine.validate_connection()
    }

    pub fn firmware_date_code(&mut self) -> Result<String> {
        self.engine.firmware_date_code()
    }

    /// The firmware version string. Vue and Pro 2 only.
    pub fn firmware_version(&mut self) -> Result<String> {
        self.require(self.model.has_firmware_version(), "firmware version query")?;
        self.engine.firmware_version()
    }

    pub fn supports_loop2_firmware(&mut self) -> Result<bool> {
        self.engine.supports_loop2_firmware()
    }

    /// Fetch and parse a LOOP1 packet.
    pub fn loop1(&mut self) -> Result<Record> {
        let payload = self.engine.loop1()?;
        Ok(Parser::new(records::loop1()).parse(&payload)?)
    }

    /// Fetch and parse a LOOP2 packet. Pro 2 only.
    pub fn loop2(&mut self) -> Result<Record> {
        self.require(self.model.has_loop2(), "LOOP2 retrieval")?;
        let payload = self.engine.loop2()?;
        Ok(Parser::new(records::loop2()).parse(&payload)?)
    }

    /// Fetch and parse the highs-and-lows packet.
    pub fn highs_and_lows(&mut self) -> Result<Record> {
        let payload = self.engine.highs_and_lows()?;
        Ok(Parser::new(records::hilow()).parse(&payload)?)
    }

    /// Fetch LOOP1 and LOOP2 and merge them into the rich realtime record.
    /// Pro 2 only.
    pub fn rich_realtime_data(&mut self) -> Result<Record> {
        self.require(self.model.has_loop2(), "rich realtime data")?;
        let loop1 = self.loop1()?;
        let loop2 = self.loop2()?;
        Ok(merge::rich_realtime(loop1, loop2))
    }

    fn require(&self, supported: bool, operation: &'static str) -> Result<()> {
        if supported {
            Ok(())
        } else {
            Err(DeviceError::UnsupportedDeviceModel {
                model: self.model,
                operation,
            })
        }
    }
}
