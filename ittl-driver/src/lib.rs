//! Nikon iTTL hotshoe bus driver
//!
//! Layers, bottom up:
//!
//! - [`handshake`]: byte transfer over the four open-drain lines, with
//!   every wait bounded by [`TimingConfig`]
//! - [`session`]: bookkeeping for one frame on the wire
//! - [`driver`]: frame-level operations (listen, receive, send) on top of
//!   the `ittl-protocol` codec
//!
//! The crate is generic over [`ittl_hal::BusLines`] and
//! [`ittl_hal::BusClock`], so it runs the same on a microcontroller and
//! against the simulated bus used by the tests.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod driver;
pub mod error;
pub mod handshake;
pub mod session;

#[cfg(test)]
mod sim;

pub use config::{ConfigError, DriverConfig, Mode, TimingConfig};
pub use driver::Driver;
pub use error::{BusError, TransferStage};
pub use handshake::{Handshake, Role, TransferState};
pub use session::BusSession;
