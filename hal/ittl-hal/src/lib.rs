//! iTTL Hotshoe Hardware Abstraction Layer
//!
//! This crate defines the minimal digital I/O capability the iTTL driver
//! needs from a board: four open-drain hotshoe lines and a microsecond
//! time source. Chip-specific crates (RP2040, ...) implement these traits,
//! and [`HotshoePins`] adapts any set of `embedded-hal` pins.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ittl-driver (handshake + facade)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ittl-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  ittl-hal-    │       │  HotshoePins  │
//! │    rp2040     │       │ (embedded-hal)│
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`line::BusLines`] - Read and drive the Sync/Ack/Data/Clock lines
//! - [`clock::BusClock`] - Microsecond timestamps and busy-wait delays

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod line;
pub mod pins;

pub use clock::BusClock;
pub use line::{BusLines, Level, Line};
pub use pins::{HotshoePins, OpenDrainPin};
