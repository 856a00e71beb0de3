//! Byte-transport abstraction for the Vantage driver.
//!
//! A console is a half-duplex serial peer: the host writes a command, then
//! polls for whatever bytes the console pushed back. This crate provides the
//! [`ByteTransport`] trait capturing exactly that surface, the production
//! [`SerialLink`] over a serial port, and the scripted [`ReplayTransport`]
//! the driver tests run against.
//!
//! This is the lowest layer of the driver. Everything else builds on top of
//! the trait defined here.

pub mod error;
pub mod replay;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use replay::ReplayTransport;
pub use serial::{SerialConfig, SerialLink};
pub use traits::ByteTransport;
