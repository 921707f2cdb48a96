//! Message-based transport boundary
//!
//! This crate does not open serial ports or sockets itself. It speaks through
//! two traits which an embedding application implements over whatever I/O
//! stack it already has (a VISA binding, a raw socket, a serial port):
//!
//! - [`Transport`]: one open link, blocking `write` / `query` exchanges
//! - [`ResourceManager`]: opens links by address string and enumerates the
//!   addresses visible to the system for auto-discovery
//!
//! Address strings follow the usual VISA shape (`GPIB0::3::INSTR`,
//! `ASRL/dev/ttyUSB0::INSTR`, `TCPIP0::10.0.0.5::inst0::INSTR`) but are opaque
//! to this crate beyond prefix inspection during discovery.

use std::time::Duration;
use thiserror::Error;

/// What went wrong at the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind
{
    /// No reply arrived within the configured deadline
    Timeout,
    /// The underlying channel failed
    Io,
    /// The address does not name an openable device
    NotFound,
    /// The link was closed and cannot be used
    Closed,
}

/// A fault raised by a [`Transport`] or [`ResourceManager`] implementation
#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError
{
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError
{
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self
    {
        Self {
            kind: kind,
            message: message.into(),
        }
    }
}

/// A single open message-based link to one instrument
///
/// Exchanges are blocking. `query` is one write followed by one read of a
/// complete reply; implementations handle line termination internally.
pub trait Transport
{
    fn write(&mut self, command: &str) -> Result<(), TransportError>;

    fn query(&mut self, command: &str) -> Result<String, TransportError>;

    fn close(&mut self) -> Result<(), TransportError>;

    /// Deadline applied to each exchange. Links without a configurable
    /// deadline ignore this.
    fn set_timeout(&mut self, _timeout: Duration) {}

    /// Line termination appended to writes and trimmed from reads, where the
    /// link allows configuring it.
    fn set_termination(&mut self, _read: &str, _write: &str) {}
}

/// Opens [`Transport`] links by address and lists what is reachable
pub trait ResourceManager
{
    type Link: Transport;

    fn open(&mut self, address: &str) -> Result<Self::Link, TransportError>;

    /// Addresses of every device currently visible to the system
    fn list_addresses(&mut self) -> Result<Vec<String>, TransportError>;
}
