//! Bus session bookkeeping
//!
//! A session spans one frame on the wire, from the start condition to the
//! end of the last byte (or the error that cut it short).

use ittl_protocol::Command;

use crate::error::BusError;
use crate::handshake::Role;

/// Record of one frame transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusSession {
    role: Role,
    started_at_us: u64,
    last_activity_us: u64,
    finished_at_us: Option<u64>,
    bytes: usize,
    command_code: Option<u8>,
    error: Option<BusError>,
}

impl BusSession {
    pub fn new(role: Role, now_us: u64) -> Self {
        Self {
            role,
            started_at_us: now_us,
            last_activity_us: now_us,
            finished_at_us: None,
            bytes: 0,
            command_code: None,
            error: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the transfer is still in progress
    pub fn is_active(&self) -> bool {
        self.finished_at_us.is_none()
    }

    /// Number of bytes moved so far, command and checksum included
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Raw command byte, once the first byte has moved
    pub fn command_code(&self) -> Option<u8> {
        self.command_code
    }

    /// Catalog entry for the command byte, if it is a known one
    pub fn command(&self) -> Option<Command> {
        self.command_code.and_then(Command::from_byte)
    }

    pub fn error(&self) -> Option<BusError> {
        self.error
    }

    /// Time since the start condition or the last byte
    pub fn idle_us(&self, now_us: u64) -> u64 {
        now_us.saturating_sub(self.last_activity_us)
    }

    /// Start condition to completion, once finished
    pub fn duration_us(&self) -> Option<u64> {
        self.finished_at_us
            .map(|end| end.saturating_sub(self.started_at_us))
    }

    pub(crate) fn record_byte(&mut self, byte: u8, now_us: u64) {
        self.last_activity_us = now_us;
        if self.bytes == 0 {
            self.command_code = Some(byte);
        }
        self.bytes += 1;
    }

    pub(crate) fn finish(&mut self, now_us: u64, error: Option<BusError>) {
        self.finished_at_us = Some(now_us);
        self.error = error;
    }
}
