//! Instrument facades
//!
//! One module per instrument family. Every facade follows the same lifecycle:
//! builder-style addressing setters, [`Instrument::connect`] working through
//! the family's address priority (explicit addressing first, `*IDN?`
//! auto-discovery last), typed operations while connected, and
//! [`Instrument::disconnect`] releasing the link. Operations on a
//! disconnected facade fail with [`ConnectionError::NotConnected`] without
//! touching the transport.

pub mod dmm45;
pub mod dmm_scpi;
pub mod psu;
pub mod siggen;

pub use dmm45::Fluke45;
pub use dmm_scpi::Fluke884x;
pub use psu::RigolDp800;
pub use siggen::{PhilipsPm5139, SiglentSdg2000x, SignalGenerator};

use crate::error::{ConnectionError, Result};
use crate::transport::{ResourceManager, Transport};
use std::time::Duration;

/// Connection lifecycle shared by every instrument facade
pub trait Instrument
{
    /// Establishes the link; a no-op when already connected
    fn connect(&mut self) -> Result<()>;

    /// Releases the link; a no-op when already disconnected
    fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Runs `body` inside a connect/disconnect bracket
    ///
    /// The link is released even when `body` fails. The body's error takes
    /// precedence over any error raised while closing.
    fn session<T, F>(&mut self, body: F) -> Result<T>
        where Self: Sized,
              F: FnOnce(&mut Self) -> Result<T>
    {
        self.connect()?;
        let outcome = body(self);
        let closed = self.disconnect();

        match outcome {
            Ok(value) => closed.map(|_| value),
            Err(err) => {
                let _ = closed;
                Err(err)
            }
        }
    }
}

/// What a family expects to see in an `*IDN?` reply
///
/// Matching is a case-insensitive substring test: any listed vendor and any
/// listed model must both appear somewhere in the reply. Entries are given
/// uppercase.
pub(crate) struct IdnMatch
{
    pub vendors: &'static [&'static str],
    pub models: &'static [&'static str],
    /// Human description used in `NoInstrumentFound`
    pub description: &'static str,
}

impl IdnMatch
{
    pub(crate) fn matches(&self, idn: &str) -> bool
    {
        let upper = idn.to_ascii_uppercase();

        self.vendors.iter().any(|vendor| upper.contains(vendor))
            && self.models.iter().any(|model| upper.contains(model))
    }
}

/// Opens a family-addressed device and verifies it identifies as that family
///
/// A GPIB address, serial port, IP, or USB serial given to a facade names a
/// device of that facade's family; one that answers `*IDN?` with anything
/// else is closed and reported as [`ConnectionError::IdentityMismatch`]
/// carrying the reply. A dead or mute address is a hard [`ConnectionError`];
/// the caller gave it deliberately, so there is nothing to fall back to.
pub(crate) fn open_link<R>(
    manager: &mut R,
    address: &str,
    timeout: Duration,
    expect: &IdnMatch,
) -> Result<(R::Link, String)>
    where R: ResourceManager
{
    let (mut link, idn) = identify(manager, address, timeout)?;

    if !expect.matches(&idn) {
        let _ = link.close();
        return Err(ConnectionError::IdentityMismatch {
            address: address.to_string(),
            expected: expect.description,
            idn: idn,
        }
        .into());
    }

    Ok((link, idn))
}

/// Opens a caller-supplied raw resource string
///
/// The resource string is trusted: the identity reply only has to be
/// non-empty, not match the family, so an unusual `*IDN?` format does not
/// block a deliberately chosen address.
pub(crate) fn open_trusted<R>(
    manager: &mut R,
    address: &str,
    timeout: Duration,
    expect: &IdnMatch,
) -> Result<(R::Link, String)>
    where R: ResourceManager
{
    let (mut link, idn) = identify(manager, address, timeout)?;

    if idn.is_empty() {
        let _ = link.close();
        return Err(ConnectionError::IdentityMismatch {
            address: address.to_string(),
            expected: expect.description,
            idn: idn,
        }
        .into());
    }

    Ok((link, idn))
}

fn identify<R>(manager: &mut R, address: &str, timeout: Duration) -> Result<(R::Link, String)>
    where R: ResourceManager
{
    let mut link = manager.open(address).map_err(|fault| ConnectionError::Transport {
        context: format!("failed to open {}", address),
        source: fault,
    })?;

    link.set_timeout(timeout);
    link.set_termination("\n", "\n");

    match link.query("*IDN?") {
        Ok(reply) => Ok((link, reply.trim().to_string())),
        Err(fault) => {
            let _ = link.close();
            Err(ConnectionError::Transport {
                context: format!("no identity reply from {}", address),
                source: fault,
            }
            .into())
        }
    }
}

/// Probes every visible address for a device matching `expect`
///
/// `prefixes` narrows the scan to interface types (`GPIB`, `TCPIP`, ...); an
/// empty list scans everything. Addresses that fail to open or to identify
/// are skipped, not fatal. The first match wins.
pub(crate) fn discover<R>(
    manager: &mut R,
    prefixes: &[&str],
    timeout: Duration,
    expect: &IdnMatch,
) -> Result<(R::Link, String)>
    where R: ResourceManager
{
    let addresses = manager.list_addresses().map_err(|fault| ConnectionError::Transport {
        context: "failed to enumerate bench addresses".to_string(),
        source: fault,
    })?;

    for address in addresses {
        if !prefixes.is_empty() && !prefixes.iter().any(|prefix| address.starts_with(prefix)) {
            continue;
        }

        let mut link = match manager.open(&address) {
            Ok(link) => link,
            Err(fault) => {
                log::debug!("discovery: skipping {} ({})", address, fault);
                continue;
            }
        };

        link.set_timeout(timeout);
        link.set_termination("\n", "\n");

        let idn = match link.query("*IDN?") {
            Ok(reply) => reply.trim().to_string(),
            Err(fault) => {
                log::debug!("discovery: {} did not identify ({})", address, fault);
                let _ = link.close();
                continue;
            }
        };

        if expect.matches(&idn) {
            log::info!("discovered {} at {}", expect.description, address);
            return Ok((link, idn));
        }

        let _ = link.close();
    }

    Err(ConnectionError::NoInstrumentFound {
        searched_for: expect.description.to_string(),
    }
    .into())
}

/// Implements [`Instrument`] for a facade with a `manager`/`link` pair and an
/// inherent `establish()` returning the opened link and identity string
macro_rules! impl_instrument
{
    ($device:ident) => {
        impl<R> crate::devices::Instrument for $device<R>
            where R: crate::transport::ResourceManager
        {
            fn connect(&mut self) -> crate::error::Result<()>
            {
                if self.link.is_some() {
                    return Ok(());
                }

                let (link, idn) = self.establish()?;
                log::info!("{} connected: {}", stringify!($device), idn);
                self.link = Some(link);
                Ok(())
            }

            fn disconnect(&mut self) -> crate::error::Result<()>
            {
                if let Some(mut link) = self.link.take() {
                    crate::transport::Transport::close(&mut link).map_err(|fault| {
                        crate::error::ConnectionError::Transport {
                            context: "failed to close the link".to_string(),
                            source: fault,
                        }
                    })?;
                }

                Ok(())
            }

            fn is_connected(&self) -> bool
            {
                self.link.is_some()
            }
        }
    };
}
pub(crate) use impl_instrument;

/// Implements the `link`/`send`/`ask` exchange helpers used by every
/// operation
///
/// Families with reply prompts (the dual-display meters) write their own
/// `send` instead of using this.
macro_rules! impl_exchange
{
    ($device:ident) => {
        impl<R> $device<R>
            where R: crate::transport::ResourceManager
        {
            fn link(&mut self) -> crate::error::Result<&mut R::Link>
            {
                match self.link.as_mut() {
                    Some(link) => Ok(link),
                    None => Err(crate::error::ConnectionError::NotConnected.into()),
                }
            }

            fn send(&mut self, command: &str) -> crate::error::Result<()>
            {
                let link = self.link()?;
                crate::transport::Transport::write(link, command).map_err(|fault| {
                    crate::error::CommandError::transport(format!("failed to send {:?}", command), fault)
                })?;
                Ok(())
            }

            fn ask(&mut self, command: &str) -> crate::error::Result<String>
            {
                let link = self.link()?;
                let reply = crate::transport::Transport::query(link, command).map_err(|fault| {
                    crate::error::CommandError::transport(format!("no reply to {:?}", command), fault)
                })?;
                Ok(reply.trim().to_string())
            }
        }
    };
}
pub(crate) use impl_exchange;

/// Implements the IEEE 488.2 common operations a family supports
///
/// Each op rides the facade's own `send`/`ask`, so prompt handling and error
/// wrapping stay family-correct.
macro_rules! impl_ieee488
{
    ($device:ident: $($op:ident),* $(,)?) => {
        impl<R> $device<R>
            where R: crate::transport::ResourceManager
        {
            /// Proves the link is alive with an `*IDN?` round trip
            pub fn check_connection(&mut self) -> crate::error::Result<String>
            {
                self.ask("*IDN?")
            }

            $(crate::devices::impl_ieee488_op!($op);)*
        }
    };
}
pub(crate) use impl_ieee488;

macro_rules! impl_ieee488_op
{
    (reset) => {
        /// Returns the instrument to its power-up defaults
        pub fn reset(&mut self) -> crate::error::Result<()>
        {
            self.send("*RST")
        }
    };
    (clear_status) => {
        /// Clears the status registers and the error queue
        pub fn clear_status(&mut self) -> crate::error::Result<()>
        {
            self.send("*CLS")
        }
    };
    (self_test) => {
        /// Runs the internal self test; `true` when the device reports 0
        pub fn self_test(&mut self) -> crate::error::Result<bool>
        {
            let reply = self.ask("*TST?")?;
            Ok(reply.trim() == "0")
        }
    };
    (trigger) => {
        /// Fires a software trigger
        pub fn trigger(&mut self) -> crate::error::Result<()>
        {
            self.send("*TRG")
        }
    };
    (status_byte) => {
        /// Reads the status byte register
        pub fn status_byte(&mut self) -> crate::error::Result<u8>
        {
            let reply = self.ask("*STB?")?;
            reply
                .trim()
                .parse::<u8>()
                .map_err(|parse_err| crate::error::CommandError::malformed(reply, parse_err.to_string()).into())
        }
    };
    (event_status) => {
        /// Reads the standard event status register
        pub fn event_status(&mut self) -> crate::error::Result<u8>
        {
            let reply = self.ask("*ESR?")?;
            reply
                .trim()
                .parse::<u8>()
                .map_err(|parse_err| crate::error::CommandError::malformed(reply, parse_err.to_string()).into())
        }
    };
}
pub(crate) use impl_ieee488_op;
