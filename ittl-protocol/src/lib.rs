//! Nikon iTTL Hotshoe Protocol
//!
//! This crate defines the message layer of the half-duplex bus between a
//! camera body and a flash unit: command codes, frame encoding, checksum
//! validation and the typed payload of every documented command.
//!
//! # Protocol Overview
//!
//! All messages use the same frame layout:
//! ```text
//! ┌─────────┬──────────────────────┬──────────┐
//! │ COMMAND │ PAYLOAD              │ CHECKSUM │
//! │ 1B      │ 1–45B (per command)  │ 1B       │
//! └─────────┴──────────────────────┴──────────┘
//! ```
//!
//! There is no length byte: the payload length is a fixed property of the
//! command, looked up in [`command::CATALOG`]. Bit-level transfer timing
//! lives in the driver crate; this crate only deals in bytes.

#![no_std]
#![deny(unsafe_code)]

// proptest macros expand to `std` paths
#[cfg(test)]
extern crate std;

pub mod anomaly;
pub mod command;
pub mod frame;
pub mod messages;
pub mod units;

pub use anomaly::{Anomalies, AnomalyKind, ProtocolAnomaly};
pub use command::{Command, Endpoint, PayloadLength, SequencePosition, MAX_PAYLOAD_SIZE};
pub use frame::{compute_checksum, Frame, FrameError, FrameParser, MAX_FRAME_SIZE};
pub use messages::{Decoded, Message};
