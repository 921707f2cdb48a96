//! Remote control for a small bench of test and measurement instruments
//!
//! Four instrument families are covered, each behind a typed facade:
//!
//! - [`Fluke45`](devices::Fluke45): dual-display multimeter speaking the
//!   word-based Fluke 45 dialect over GPIB or serial
//! - [`Fluke884x`](devices::Fluke884x): 8845A/8846A bench multimeter speaking
//!   SCPI over LAN or GPIB
//! - [`RigolDp800`](devices::RigolDp800): DP800-series programmable power
//!   supply
//! - [`SiglentSdg2000x`](devices::SiglentSdg2000x) and
//!   [`PhilipsPm5139`](devices::PhilipsPm5139): waveform generators sharing
//!   the [`SignalGenerator`](devices::SignalGenerator) contract
//!
//! The crate does not talk to hardware itself; callers supply a
//! [`ResourceManager`](transport::ResourceManager) (a VISA binding, a socket
//! wrapper, a test double) and the facades do everything else: address
//! resolution and `*IDN?` discovery, dialect translation, range and
//! capability validation before any traffic is sent, and reply parsing into
//! typed values.
//!
//! ```no_run
//! use bench_rc::devices::{Instrument, SignalGenerator, SiglentSdg2000x};
//! use bench_rc::cmd::Waveform;
//!
//! fn tone<R: bench_rc::transport::ResourceManager>(manager: R) -> bench_rc::Result<()>
//! {
//!     let mut generator = SiglentSdg2000x::new(manager);
//!     generator.session(|generator| {
//!         generator.configure_waveform(Waveform::Sine, 1000.0, 2.0, 0.0, 0.0)?;
//!         generator.set_output(true)
//!     })
//! }
//! ```

pub mod cmd;
pub mod devices;
pub mod error;
pub mod limits;
pub mod quantity;
pub mod response;
pub mod transport;

#[cfg(test)]
mod mock;

pub use error::{CommandError, ConnectionError, Error, Result, ValidationError};
pub use quantity::{Quantity, Reading, Unit, UnitMode};
