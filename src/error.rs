//! Error taxonomy for instrument control
//!
//! Faults are split three ways by when they can occur:
//!
//! - [`ConnectionError`]: establishing, checking, or tearing down a link
//! - [`ValidationError`]: a requested value or capability was rejected before
//!   anything was sent to the device
//! - [`CommandError`]: an exchange with a connected device went wrong, either
//!   on the wire or because the reply could not be interpreted
//!
//! Validation always runs before transport I/O, so a [`ValidationError`]
//! guarantees the device state was not touched.

use crate::transport::TransportError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error
{
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// A failure to establish or maintain a link to an instrument
#[derive(Debug, Error)]
pub enum ConnectionError
{
    /// An operation was attempted without an open link
    #[error("not connected; call connect() first")]
    NotConnected,
    /// No addressing was configured and auto-discovery found nothing matching
    #[error("no instrument found: {searched_for}")]
    NoInstrumentFound
    {
        searched_for: String,
    },
    /// An explicitly addressed device answered `*IDN?` with something else
    #[error("device at {address} did not identify as {expected}; got {idn:?}")]
    IdentityMismatch
    {
        address: String,
        expected: &'static str,
        idn: String,
    },
    /// The transport layer failed while opening or closing the link
    #[error("{context}")]
    Transport
    {
        context: String,
        #[source]
        source: TransportError,
    },
}

/// A request rejected before any traffic was sent to the device
#[derive(Debug, Error)]
pub enum ValidationError
{
    #[error("{quantity} {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange
    {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// The selection exists in the uniform command set but this instrument
    /// family has no dialect token for it
    #[error("{requested} is not supported on the {family}; supported: {supported}")]
    Unsupported
    {
        requested: String,
        family: &'static str,
        supported: String,
    },
    /// The operation itself does not exist on this instrument family
    #[error("{capability} is not available on the {family}")]
    MissingCapability
    {
        capability: &'static str,
        family: &'static str,
    },
    /// An argument broke a structural constraint (not a numeric range limit)
    #[error("{0}")]
    BadArgument(String),
}

/// A failed exchange with a connected instrument
#[derive(Debug, Error)]
pub enum CommandError
{
    /// The transport layer failed mid-exchange
    #[error("{context}")]
    Transport
    {
        context: String,
        #[source]
        source: TransportError,
    },
    /// The device answered with its error prompt
    #[error("device reported a command fault: {raw:?}")]
    DeviceFault
    {
        raw: String,
    },
    /// The reply could not be interpreted; `raw` is the text as received
    #[error("could not interpret response {raw:?}: {reason}")]
    Malformed
    {
        raw: String,
        reason: String,
    },
    /// The reply held the wrong number of comma-separated values
    #[error("expected {expected} values but got {actual} in response {raw:?}")]
    Arity
    {
        expected: usize,
        actual: usize,
        raw: String,
    },
    /// A measurement function must be configured before this operation
    #[error("a primary function must be configured before setting {attempted}")]
    FunctionNotConfigured
    {
        attempted: &'static str,
    },
}

impl CommandError
{
    /// Wraps a transport fault with a short description of what was being done
    pub(crate) fn transport(context: impl Into<String>, source: TransportError) -> Self
    {
        Self::Transport {
            context: context.into(),
            source: source,
        }
    }

    /// A reply that failed numeric interpretation
    pub(crate) fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self
    {
        Self::Malformed {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}
