use std::collections::VecDeque;

use crate::error::{Result, TransportError};
use crate::traits::ByteTransport;

/// One scripted command/response turn.
#[derive(Debug, Clone)]
struct Exchange {
    command: Vec<u8>,
    chunks: Vec<Vec<u8>>,
}

/// Scripted in-memory [`ByteTransport`] for driver tests.
///
/// Exchanges are consumed in order: each host write must match the next
/// scripted command and queues that exchange's reply chunks. A reply split
/// into several chunks models the serial burst boundaries a real console
/// produces (each chunk is one readable event).
#[derive(Debug, Default)]
pub struct ReplayTransport {
    script: VecDeque<Exchange>,
    pending: VecDeque<Vec<u8>>,
    open: bool,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a command answered in a single burst.
    pub fn exchange(self, command: impl AsRef<[u8]>, reply: impl AsRef<[u8]>) -> Self {
        let reply = reply.as_ref();
        let chunks: &[&[u8]] = if reply.is_empty() { &[] } else { &[reply] };
        self.exchange_chunked(command, chunks)
    }

    /// Script a command answered in several bursts.
    pub fn exchange_chunked(mut self, command: impl AsRef<[u8]>, chunks: &[&[u8]]) -> Self {
        self.script.push_back(Exchange {
            command: command.as_ref().to_vec(),
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
        });
        self
    }

    /// Script a command the console never answers.
    pub fn dead_exchange(self, command: impl AsRef<[u8]>) -> Self {
        self.exchange_chunked(command, &[])
    }

    /// Exchanges not yet consumed by a write.
    pub fn remaining_exchanges(&self) -> usize {
        self.script.len()
    }
}

impl ByteTransport for ReplayTransport {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.open {
            return Err(TransportError::ClosedConnection);
        }
        let matches_script = self
            .script
            .front()
            .is_some_and(|exchange| exchange.command == bytes);
        if !matches_script {
            return Err(TransportError::FailedToWrite(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unscripted command: {:?}", String::from_utf8_lossy(bytes)),
            )));
        }
        if let Some(exchange) = self.script.pop_front() {
            self.pending.extend(exchange.chunks);
        }
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        if !self.open {
            return Err(TransportError::ClosedConnection);
        }
        Ok(self.pending.pop_front().unwrap_or_default())
    }
}
